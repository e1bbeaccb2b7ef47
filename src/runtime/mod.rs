//! Runtime: executing actions and dispatching events against a record.
//!
//! A compiled [`MachineSpec`] is immutable and shared; every operation here
//! takes the record explicitly (or through a [`Bound`] handle). The
//! transition protocol is:
//!
//! 1. Resolve the action's edge and check the supplied keywords and values.
//! 2. Refuse early if the record is not in the edge's source state.
//! 3. Inside the record's exclusive section, re-check the state, write the
//!    destination code, mark the record modified and run the `on_` hooks.
//! 4. After the section, run the success hook and the `after_` hooks.
//!
//! Any refusal or error in steps 2-3 triggers the failure hook, if enabled.

mod bound;
mod dispatcher;
mod error;
mod executor;
mod spec;

pub use bound::Bound;
pub use error::{ArgumentError, HookError, MachineError};
pub use spec::{Edge, EdgeSummary, MachineSpec, MachineSummary, Parameter};
