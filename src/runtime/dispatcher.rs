//! Event dispatch: pick the first eligible edge and perform it.

use crate::core::Arguments;
use crate::host::Record;
use crate::runtime::error::MachineError;
use crate::runtime::spec::{Edge, MachineSpec};
use tracing::debug;

impl MachineSpec {
    /// First edge, in declaration order, that listens to `event` and admits
    /// the record's current state. Pure search; nothing is invoked.
    pub fn select_edge<R: Record>(&self, record: &R, event: &str) -> Option<&Edge> {
        let current = record.read(&self.field);
        self.edges
            .iter()
            .filter(|edge| edge.listens_to(event))
            .find(|edge| edge.admits(current))
    }

    /// Trigger `event` on `record`.
    ///
    /// The selected edge's action is attempted with `args`; `on_<event>` runs
    /// inside the exclusive section after `on_<action>`, and `after_<event>`
    /// runs once the action has fully succeeded. Both event hooks receive
    /// `args` plus `action`. At most one edge is attempted per call.
    pub fn attempt_event<R: Record>(
        &self,
        record: &mut R,
        event: &str,
        args: Arguments,
    ) -> Result<(), MachineError> {
        if !self.has_event(event) {
            return Err(MachineError::UnknownEvent {
                field: self.field.clone(),
                event: event.to_string(),
            });
        }

        let Some(edge) = self.select_edge(&*record, event) else {
            debug!(field = %self.field, event, "No edge can handle event");
            return Err(MachineError::NoValidTransition {
                record: record.identity(),
                field: self.field.clone(),
                event: event.to_string(),
            });
        };

        debug!(field = %self.field, event, action = %edge.action, "Dispatching event");

        let hook_args = args.with_action(&edge.action);
        let on_event = format!("on_{event}");
        self.attempt_with(record, &edge.action, args, |record| {
            record.invoke(&on_event, &hook_args)
        })?;
        record.invoke(&format!("after_{event}"), &hook_args)?;

        Ok(())
    }
}
