//! Bidirectional mapping between state names and their stored codes.
//!
//! A machine persists its field as a small integer. The symbol table is the
//! only place that knows which name a code stands for, and it is frozen once
//! the machine is compiled.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Integer code stored in the governed field.
pub type StateCode = u32;

/// Immutable name <-> code table for one machine.
///
/// Entries keep their declaration order, which is also the order used when
/// the table is listed or serialized.
///
/// # Example
///
/// ```rust
/// use statefield::core::SymbolTable;
///
/// let table = SymbolTable::from_pairs([("pending", 1), ("shipped", 2)]).unwrap();
///
/// assert_eq!(table.code_of("shipped"), Some(2));
/// assert_eq!(table.name_of(1), Some("pending"));
/// assert_eq!(table.len(), 2);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(into = "Vec<(String, StateCode)>", try_from = "Vec<(String, StateCode)>")]
pub struct SymbolTable {
    entries: Vec<(String, StateCode)>,
    by_name: HashMap<String, StateCode>,
    by_code: HashMap<StateCode, usize>,
}

/// Why a set of pairs cannot form a symbol table.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    #[error("no states given")]
    Empty,

    #[error("state name `{0}` is declared twice")]
    DuplicateName(String),

    #[error("state code {0} is used by more than one state")]
    DuplicateCode(StateCode),
}

impl SymbolTable {
    /// Build a table, rejecting empty input and any repeated name or code.
    pub fn from_pairs<I, N>(pairs: I) -> Result<Self, SymbolError>
    where
        I: IntoIterator<Item = (N, StateCode)>,
        N: Into<String>,
    {
        let mut entries = Vec::new();
        let mut by_name = HashMap::new();
        let mut by_code = HashMap::new();

        for (name, code) in pairs {
            let name = name.into();
            if by_name.contains_key(&name) {
                return Err(SymbolError::DuplicateName(name));
            }
            if by_code.contains_key(&code) {
                return Err(SymbolError::DuplicateCode(code));
            }
            by_name.insert(name.clone(), code);
            by_code.insert(code, entries.len());
            entries.push((name, code));
        }

        if entries.is_empty() {
            return Err(SymbolError::Empty);
        }

        Ok(Self {
            entries,
            by_name,
            by_code,
        })
    }

    /// Code stored for `name`, if it is a declared state.
    pub fn code_of(&self, name: &str) -> Option<StateCode> {
        self.by_name.get(name).copied()
    }

    /// Name of the state stored as `code`, if any.
    pub fn name_of(&self, code: StateCode) -> Option<&str> {
        self.by_code
            .get(&code)
            .map(|&index| self.entries[index].0.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a constructed table; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(name, code)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, StateCode)> + '_ {
        self.entries.iter().map(|(name, code)| (name.as_str(), *code))
    }

    /// Names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// The name -> code map handed out as the type-level states accessor.
    pub fn to_map(&self) -> BTreeMap<String, StateCode> {
        self.entries.iter().cloned().collect()
    }
}

impl PartialEq for SymbolTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for SymbolTable {}

impl From<SymbolTable> for Vec<(String, StateCode)> {
    fn from(table: SymbolTable) -> Self {
        table.entries
    }
}

impl TryFrom<Vec<(String, StateCode)>> for SymbolTable {
    type Error = SymbolError;

    fn try_from(pairs: Vec<(String, StateCode)>) -> Result<Self, Self::Error> {
        Self::from_pairs(pairs)
    }
}
