//! Explicit description of the operations a host type exposes.
//!
//! The validator never inspects the host type itself. Instead the host
//! hands over a `HostInterface` listing its instance operations (with the
//! exact keyword set each accepts) and its type-level operations. Name
//! collisions and hook signatures are checked against this record.

use std::collections::{BTreeMap, BTreeSet};

/// Capability record for a host type.
///
/// # Example
///
/// ```rust
/// use statefield::schema::HostInterface;
///
/// let interface = HostInterface::new("Order")
///     .operation("on_ship", &["carrier"])
///     .operation("after_ship", &["carrier"])
///     .type_operation("pending");
///
/// assert!(interface.accepts_exactly("on_ship", &["carrier"]));
/// assert!(!interface.accepts_exactly("on_ship", &["carrier", "eta"]));
/// assert!(interface.has_type_operation("pending"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostInterface {
    type_name: String,
    operations: BTreeMap<String, BTreeSet<String>>,
    type_operations: BTreeSet<String>,
}

impl HostInterface {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// Declare an instance operation and the keywords it accepts.
    pub fn operation(mut self, name: impl Into<String>, keywords: &[&str]) -> Self {
        self.add_operation(name, keywords.iter().map(|k| k.to_string()));
        self
    }

    /// Declare a type-level operation.
    pub fn type_operation(mut self, name: impl Into<String>) -> Self {
        self.type_operations.insert(name.into());
        self
    }

    pub(crate) fn add_operation<I>(&mut self, name: impl Into<String>, keywords: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.operations
            .insert(name.into(), keywords.into_iter().collect());
    }

    pub(crate) fn add_type_operation(&mut self, name: impl Into<String>) {
        self.type_operations.insert(name.into());
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn has_operation(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    pub fn has_type_operation(&self, name: &str) -> bool {
        self.type_operations.contains(name)
    }

    /// Keywords accepted by an instance operation.
    pub fn keywords(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.operations.get(name)
    }

    /// True when `name` exists and accepts exactly `keywords`, ignoring order.
    pub fn accepts_exactly<S: AsRef<str>>(&self, name: &str, keywords: &[S]) -> bool {
        match self.operations.get(name) {
            Some(accepted) => {
                accepted.len() == keywords.len()
                    && keywords.iter().all(|k| accepted.contains(k.as_ref()))
            }
            None => false,
        }
    }
}

/// Render `name(a, b)` for diagnostics.
pub(crate) fn render_signature<S: AsRef<str>>(name: &str, keywords: &[S]) -> String {
    let keywords: Vec<&str> = keywords.iter().map(AsRef::as_ref).collect();
    format!("{}({})", name, keywords.join(", "))
}
