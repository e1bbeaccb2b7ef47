//! Contracts a host type implements to carry a state machine.
//!
//! [`Host`] is the type-level side: which operations exist (for validation)
//! and how named hooks are dispatched. [`Record`] adds the persistence side
//! for one instance: reading and writing the governed field and providing an
//! exclusive section around a mutation.

use crate::core::{Arguments, StateCode};
use crate::runtime::{HookError, MachineError};
use crate::schema::HostInterface;
use serde::Serialize;

/// What the machine-wide success and failure hooks are told.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TransitionReport<'a> {
    pub field: &'a str,
    pub action: &'a str,
    /// Source state; for a failure this is the state the record was
    /// actually in, which is `None` when the stored code is unset or unknown.
    pub from: Option<&'a str>,
    pub to: &'a str,
}

/// A type that can carry state machines.
pub trait Host {
    /// Operations this type already exposes, including every hook it
    /// implements and the keywords each accepts.
    fn interface() -> HostInterface
    where
        Self: Sized;

    /// Invoke the `on_*`/`after_*` hook called `hook`.
    ///
    /// Only hooks declared in [`Host::interface`] are ever invoked, always
    /// with exactly the keywords declared for them.
    fn invoke(&mut self, hook: &str, args: &Arguments) -> Result<(), HookError>;

    /// Called after any committed transition when the machine enables
    /// `on_successful_transition`.
    fn on_successful_transition(&mut self, _report: &TransitionReport<'_>) -> Result<(), HookError> {
        Ok(())
    }

    /// Called after any refused or failed transition when the machine enables
    /// `on_failed_transition`.
    fn on_failed_transition(&mut self, _report: &TransitionReport<'_>) -> Result<(), HookError> {
        Ok(())
    }
}

/// Persistence contract for a single instance of a host type.
pub trait Record: Host {
    /// Code currently stored in `field`, if any.
    fn read(&self, field: &str) -> Option<StateCode>;

    /// Durably store `code` in `field`.
    fn write(&mut self, field: &str, code: StateCode) -> Result<(), HookError>;

    /// Bump the modification timestamp (or equivalent bookkeeping).
    fn mark_modified(&mut self) -> Result<(), HookError>;

    /// Run `body` while holding this instance's exclusive lock.
    ///
    /// The lock must be released on every exit path, and an error returned by
    /// `body` must be returned unchanged.
    fn with_exclusive_section<T, F>(&mut self, body: F) -> Result<T, MachineError>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T, MachineError>;

    /// Short label used in error messages, e.g. `Order#42`.
    fn identity(&self) -> String {
        String::from("record")
    }
}
