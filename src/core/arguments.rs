//! Keyword argument bags.
//!
//! Callers hand transitions an `Arguments` bag keyed by parameter name, and
//! hooks receive one back: the supplied values, plus `action` for hooks of
//! event-triggered transitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Ordered keyword -> value bag.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arguments {
    values: BTreeMap<String, Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a keyword, returning the bag.
    pub fn with(mut self, keyword: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(keyword, value);
        self
    }

    pub fn insert(&mut self, keyword: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(keyword.into(), value.into());
    }

    pub fn get(&self, keyword: &str) -> Option<&Value> {
        self.values.get(keyword)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.values.contains_key(keyword)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keywords in sorted order.
    pub fn keywords(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// A new bag holding `action` plus every keyword of `self`.
    ///
    /// A supplied keyword named `action` is overwritten.
    pub fn with_action(&self, action: &str) -> Self {
        let mut merged = self.clone();
        merged.insert("action", action);
        merged
    }
}

impl<K, V> FromIterator<(K, V)> for Arguments
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
