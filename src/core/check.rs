//! Value checks attached to transition parameters.
//!
//! A check is a pure predicate over the value a caller supplies for a
//! parameter. It runs before any state is read or written.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Pure single-argument predicate guarding a parameter value.
///
/// Checks are shared between the definition that declares them and the
/// compiled machine, so cloning one is cheap.
///
/// # Example
///
/// ```rust
/// use statefield::core::Check;
/// use serde_json::json;
///
/// let positive = Check::new(|v| v.as_i64().is_some_and(|n| n > 0));
///
/// assert!(positive.check(&json!(5)));
/// assert!(!positive.check(&json!(-1)));
/// assert!(!positive.check(&json!("five")));
/// ```
#[derive(Clone)]
pub struct Check {
    predicate: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl Check {
    /// Create a check from a pure predicate.
    ///
    /// The predicate must be deterministic and thread-safe (Send + Sync).
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Check {
            predicate: Arc::new(predicate),
        }
    }

    /// A check that accepts every value.
    pub fn any() -> Self {
        Self::new(|_| true)
    }

    /// Evaluate the predicate against a supplied value.
    pub fn check(&self, value: &Value) -> bool {
        (self.predicate)(value)
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Check(..)")
    }
}
