//! Record-bound entry points.
//!
//! [`MachineSpec::bind`] pairs a compiled machine with one record for the
//! duration of a borrow.

use crate::core::{Arguments, SymbolTable};
use crate::host::Record;
use crate::runtime::error::{HookError, MachineError};
use crate::runtime::spec::MachineSpec;

/// A machine paired with one record, exposing the generated operations
/// without repeating the record on every call.
pub struct Bound<'m, 'r, R: Record> {
    machine: &'m MachineSpec,
    record: &'r mut R,
}

impl MachineSpec {
    pub fn bind<'m, 'r, R: Record>(&'m self, record: &'r mut R) -> Bound<'m, 'r, R> {
        Bound {
            machine: self,
            record,
        }
    }
}

impl<'m, 'r, R: Record> Bound<'m, 'r, R> {
    pub fn machine(&self) -> &'m MachineSpec {
        self.machine
    }

    pub fn record(&self) -> &R {
        &*self.record
    }

    pub fn record_mut(&mut self) -> &mut R {
        &mut *self.record
    }

    /// `<action>(**args)`
    pub fn perform(&mut self, action: &str, args: Arguments) -> Result<(), MachineError> {
        self.machine.attempt(&mut *self.record, action, args)
    }

    /// `<action>(**args) { .. }`
    pub fn perform_with<F>(&mut self, action: &str, args: Arguments, continuation: F) -> Result<(), MachineError>
    where
        F: FnOnce(&mut R) -> Result<(), HookError>,
    {
        self.machine
            .attempt_with(&mut *self.record, action, args, continuation)
    }

    /// `can_<action>`
    pub fn can(&self, action: &str) -> Result<bool, MachineError> {
        self.machine.can_perform(&*self.record, action)
    }

    /// `<event>(**args)`
    pub fn fire(&mut self, event: &str, args: Arguments) -> Result<(), MachineError> {
        self.machine.attempt_event(&mut *self.record, event, args)
    }

    /// `<field>`
    pub fn state(&self) -> Option<&'m str> {
        let code = self.record.read(self.machine.field())?;
        self.machine.states().name_of(code)
    }

    /// `is_<state>?`
    pub fn is(&self, state: &str) -> bool {
        self.machine.is_in(&*self.record, state)
    }

    /// `<field>_states`
    pub fn states(&self) -> &'m SymbolTable {
        self.machine.states()
    }
}
