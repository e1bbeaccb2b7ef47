//! Errors raised while attempting transitions.

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Wrong, missing, or unexpected keyword arguments.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("wrong number of arguments (given {given}, expected 0)")]
    NoArgumentsExpected { given: usize },

    #[error("missing {}: {}", keyword_noun(.keywords), joined(.keywords))]
    Missing { keywords: Vec<String> },

    #[error("unknown {}: {}", keyword_noun(.keywords), joined(.keywords))]
    Unknown { keywords: Vec<String> },
}

fn joined(keywords: &[String]) -> String {
    keywords.join(", ")
}

fn keyword_noun(keywords: &[String]) -> &'static str {
    if keywords.len() == 1 {
        "keyword"
    } else {
        "keywords"
    }
}

/// An error raised by the host: a hook, a write, or lock acquisition.
///
/// The original error is kept intact and can be recovered with
/// [`HookError::downcast_ref`].
pub struct HookError {
    source: Box<dyn StdError + Send + Sync + 'static>,
}

impl HookError {
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self {
            source: error.into(),
        }
    }

    /// A hook error carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(message.into())
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref::<E>()
    }

    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync + 'static> {
        self.source
    }
}

impl fmt::Debug for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.source, f)
    }
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, f)
    }
}

impl StdError for HookError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.source()
    }
}

/// Everything that can go wrong when a caller asks for a transition.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error("incorrect value for `{name}`")]
    InvalidParameter { name: String },

    #[error("Invalid state transition. {record} cannot perform '{action}' on {field}='{state}'")]
    InvalidTransition {
        record: String,
        field: String,
        action: String,
        state: String,
    },

    #[error("No valid transitions for {record}#{field} on event '{event}'")]
    NoValidTransition {
        record: String,
        field: String,
        event: String,
    },

    #[error("`{action}` is not an action of the `{field}` state machine")]
    UnknownAction { field: String, action: String },

    #[error("`{event}` is not an event of the `{field}` state machine")]
    UnknownEvent { field: String, event: String },

    #[error(transparent)]
    Hook(#[from] HookError),
}

impl MachineError {
    /// True for both a refused action and an event with no performable edge.
    pub fn is_invalid_transition(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition { .. } | Self::NoValidTransition { .. }
        )
    }
}
