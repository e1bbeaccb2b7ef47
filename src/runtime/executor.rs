//! Guarded execution of a single action.

use crate::core::{Arguments, StateCode};
use crate::host::{Record, TransitionReport};
use crate::runtime::error::{ArgumentError, HookError, MachineError};
use crate::runtime::spec::{Edge, MachineSpec};
use tracing::debug;

impl MachineSpec {
    /// Name of the state `record` is currently in.
    ///
    /// `None` when the field is unset or holds a code this machine does not
    /// know.
    pub fn current_state<R: Record>(&self, record: &R) -> Option<&str> {
        record
            .read(&self.field)
            .and_then(|code| self.symbols.name_of(code))
    }

    /// Whether `record` is currently in `state`.
    pub fn is_in<R: Record>(&self, record: &R, state: &str) -> bool {
        match self.symbols.code_of(state) {
            Some(code) => record.read(&self.field) == Some(code),
            None => false,
        }
    }

    /// Whether `action` could be performed right now. Has no side effects.
    pub fn can_perform<R: Record>(&self, record: &R, action: &str) -> Result<bool, MachineError> {
        let edge = self.edge_for(action)?;
        Ok(edge.admits(record.read(&self.field)))
    }

    /// Perform `action` on `record`.
    pub fn attempt<R: Record>(
        &self,
        record: &mut R,
        action: &str,
        args: Arguments,
    ) -> Result<(), MachineError> {
        self.attempt_with(record, action, args, |_| Ok(()))
    }

    /// Perform `action`, running `continuation` inside the exclusive section
    /// right after the `on_<action>` hook.
    ///
    /// Order of effects on success: write the destination code, mark the
    /// record modified, `on_<action>`, `continuation`, release the section,
    /// the success hook, `after_<action>`.
    pub fn attempt_with<R, F>(
        &self,
        record: &mut R,
        action: &str,
        args: Arguments,
        continuation: F,
    ) -> Result<(), MachineError>
    where
        R: Record,
        F: FnOnce(&mut R) -> Result<(), HookError>,
    {
        let edge = self.edge_for(action)?;
        check_keywords(edge, &args)?;
        check_values(edge, &args)?;

        let current = record.read(&self.field);
        if !edge.admits(current) {
            debug!(field = %self.field, action, "Transition refused before locking");
            let error = self.refusal(&*record, edge, current);
            self.report_failure(record, edge)?;
            return Err(error);
        }

        let committed = record.with_exclusive_section(|record| {
            let current = record.read(&self.field);
            if !edge.admits(current) {
                debug!(field = %self.field, action, "Transition lost the race for the lock");
                return Err(self.refusal(&*record, edge, current));
            }

            record.write(&self.field, edge.to_code)?;
            record.mark_modified()?;
            if edge.callbacks.on {
                record.invoke(&format!("on_{action}"), &args)?;
            }
            continuation(record)?;
            Ok(())
        });

        if let Err(error) = committed {
            self.report_failure(record, edge)?;
            return Err(error);
        }

        debug!(
            field = %self.field,
            action,
            from = %edge.from,
            to = %edge.to,
            "Transition committed"
        );

        if self.success_hook {
            record.on_successful_transition(&TransitionReport {
                field: &self.field,
                action: &edge.action,
                from: Some(&edge.from),
                to: &edge.to,
            })?;
        }
        if edge.callbacks.after {
            record.invoke(&format!("after_{action}"), &args)?;
        }

        Ok(())
    }

    pub(crate) fn edge_for(&self, action: &str) -> Result<&Edge, MachineError> {
        self.edge(action).ok_or_else(|| MachineError::UnknownAction {
            field: self.field.clone(),
            action: action.to_string(),
        })
    }

    fn refusal<R: Record>(&self, record: &R, edge: &Edge, current: Option<StateCode>) -> MachineError {
        let state = current
            .and_then(|code| self.symbols.name_of(code))
            .map(str::to_string)
            .or_else(|| current.map(|code| code.to_string()))
            .unwrap_or_else(|| "nil".to_string());

        MachineError::InvalidTransition {
            record: record.identity(),
            field: self.field.clone(),
            action: edge.action.clone(),
            state,
        }
    }

    /// Invoke the failure hook, if enabled, with the state the record is
    /// actually in. An error from the hook itself replaces the original
    /// failure.
    fn report_failure<R: Record>(&self, record: &mut R, edge: &Edge) -> Result<(), HookError> {
        if !self.failure_hook {
            return Ok(());
        }

        let from = record
            .read(&self.field)
            .and_then(|code| self.symbols.name_of(code));
        record.on_failed_transition(&TransitionReport {
            field: &self.field,
            action: &edge.action,
            from,
            to: &edge.to,
        })
    }
}

/// Supplied keywords must be exactly the edge's carried names.
fn check_keywords(edge: &Edge, args: &Arguments) -> Result<(), ArgumentError> {
    let required: Vec<&str> = edge.keywords().collect();

    if required.is_empty() && !args.is_empty() {
        return Err(ArgumentError::NoArgumentsExpected { given: args.len() });
    }

    let missing: Vec<String> = required
        .iter()
        .filter(|keyword| !args.contains(keyword))
        .map(|keyword| keyword.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ArgumentError::Missing { keywords: missing });
    }

    let unknown: Vec<String> = args
        .keywords()
        .filter(|keyword| !required.contains(keyword))
        .map(str::to_string)
        .collect();
    if !unknown.is_empty() {
        return Err(ArgumentError::Unknown { keywords: unknown });
    }

    Ok(())
}

/// Run each required parameter's check; the first failure wins.
fn check_values(edge: &Edge, args: &Arguments) -> Result<(), MachineError> {
    for parameter in &edge.parameters {
        let accepted = args
            .get(&parameter.name)
            .is_some_and(|value| parameter.check.check(value));
        if !accepted {
            return Err(MachineError::InvalidParameter {
                name: parameter.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Check;
    use crate::host::Host;
    use crate::schema::{compile, Definition, EdgeDef, HostInterface};

    /// Plain record: no real locking, every call is logged.
    #[derive(Default)]
    struct Sample {
        state: Option<StateCode>,
        log: Vec<String>,
        touches: usize,
        fail_on: Option<&'static str>,
        /// Code written by another writer the moment the lock is taken.
        interloper: Option<StateCode>,
    }

    impl Host for Sample {
        fn interface() -> HostInterface {
            HostInterface::new("Sample")
                .operation("on_move", &["amount"])
                .operation("after_move", &["amount"])
                .operation("on_successful_transition", &["field", "action", "from", "to"])
                .operation("on_failed_transition", &["field", "action", "from", "to"])
        }

        fn invoke(&mut self, hook: &str, args: &Arguments) -> Result<(), HookError> {
            self.log.push(format!("{hook}:{}", args.get("amount").map_or(String::new(), |v| v.to_string())));
            if self.fail_on == Some(hook) {
                return Err(HookError::msg(format!("{hook} exploded")));
            }
            Ok(())
        }

        fn on_successful_transition(&mut self, report: &TransitionReport<'_>) -> Result<(), HookError> {
            self.log.push(format!(
                "success:{}:{}->{}",
                report.action,
                report.from.unwrap_or("nil"),
                report.to
            ));
            Ok(())
        }

        fn on_failed_transition(&mut self, report: &TransitionReport<'_>) -> Result<(), HookError> {
            self.log.push(format!(
                "failure:{}:{}->{}",
                report.action,
                report.from.unwrap_or("nil"),
                report.to
            ));
            if self.fail_on == Some("on_failed_transition") {
                return Err(HookError::msg("failure hook blew up"));
            }
            Ok(())
        }
    }

    impl Record for Sample {
        fn read(&self, _field: &str) -> Option<StateCode> {
            self.state
        }

        fn write(&mut self, _field: &str, code: StateCode) -> Result<(), HookError> {
            self.state = Some(code);
            Ok(())
        }

        fn mark_modified(&mut self) -> Result<(), HookError> {
            self.touches += 1;
            Ok(())
        }

        fn with_exclusive_section<T, F>(&mut self, body: F) -> Result<T, MachineError>
        where
            F: FnOnce(&mut Self) -> Result<T, MachineError>,
        {
            self.log.push("lock".to_string());
            if let Some(code) = self.interloper.take() {
                self.state = Some(code);
            }
            let result = body(self);
            self.log.push("unlock".to_string());
            result
        }

        fn identity(&self) -> String {
            "Sample#1".to_string()
        }
    }

    fn machine(hooks: bool, parameters: bool) -> MachineSpec {
        let mut edge = EdgeDef::new("initial", "final", "move");
        let mut builder = Definition::builder("state")
            .state("initial", 1)
            .state("final", 2)
            .on_successful_transition(hooks)
            .on_failed_transition(hooks);
        if parameters {
            edge = edge.on().after().parameters(["amount"]);
            builder = builder.parameter(
                "amount",
                "amount",
                Check::new(|v| v.as_i64().is_some_and(|n| n > 0)),
            );
        }
        compile(builder.edge(edge).build(), &Sample::interface()).unwrap()
    }

    fn at(code: StateCode) -> Sample {
        Sample {
            state: Some(code),
            ..Sample::default()
        }
    }

    #[test]
    fn moves_from_source_to_destination() {
        let machine = machine(false, false);
        let mut record = at(1);

        machine.attempt(&mut record, "move", Arguments::new()).unwrap();

        assert_eq!(machine.current_state(&record), Some("final"));
        assert_eq!(record.touches, 1);
    }

    #[test]
    fn second_move_is_refused() {
        let machine = machine(false, false);
        let mut record = at(1);

        machine.attempt(&mut record, "move", Arguments::new()).unwrap();
        let error = machine
            .attempt(&mut record, "move", Arguments::new())
            .unwrap_err();

        assert!(error.is_invalid_transition());
        assert_eq!(
            error.to_string(),
            "Invalid state transition. Sample#1 cannot perform 'move' on state='final'"
        );
        assert_eq!(record.touches, 1);
    }

    #[test]
    fn can_perform_reflects_source_state() {
        let machine = machine(false, false);

        assert!(machine.can_perform(&at(1), "move").unwrap());
        assert!(!machine.can_perform(&at(2), "move").unwrap());
        assert!(!machine.can_perform(&Sample::default(), "move").unwrap());
        assert!(matches!(
            machine.can_perform(&at(1), "fly"),
            Err(MachineError::UnknownAction { .. })
        ));
    }

    #[test]
    fn hooks_run_in_order() {
        let machine = machine(true, true);
        let mut record = at(1);

        machine
            .attempt_with(&mut record, "move", crate::arguments! { amount: 5 }, |record| {
                record.log.push("continuation".to_string());
                Ok(())
            })
            .unwrap();

        assert_eq!(
            record.log,
            vec![
                "lock",
                "on_move:5",
                "continuation",
                "unlock",
                "success:move:initial->final",
                "after_move:5",
            ]
        );
    }

    #[test]
    fn refusal_reports_actual_state_to_failure_hook() {
        let machine = machine(true, false);
        let mut record = at(2);

        let error = machine
            .attempt(&mut record, "move", Arguments::new())
            .unwrap_err();

        assert!(error.is_invalid_transition());
        assert_eq!(record.log, vec!["failure:move:final->final"]);
        assert_eq!(record.state, Some(2));
        assert_eq!(record.touches, 0);
    }

    #[test]
    fn lost_race_is_refused_inside_the_section() {
        let machine = machine(true, false);
        let mut record = at(1);
        record.interloper = Some(2);

        let error = machine
            .attempt(&mut record, "move", Arguments::new())
            .unwrap_err();

        assert!(error.is_invalid_transition());
        assert_eq!(record.log, vec!["lock", "unlock", "failure:move:final->final"]);
        assert_eq!(record.touches, 0);
    }

    #[test]
    fn hook_error_fires_failure_hook_and_propagates() {
        let machine = machine(true, true);
        let mut record = at(1);
        record.fail_on = Some("on_move");

        let error = machine
            .attempt(&mut record, "move", crate::arguments! { amount: 5 })
            .unwrap_err();

        assert!(matches!(error, MachineError::Hook(_)));
        assert_eq!(error.to_string(), "on_move exploded");
        assert_eq!(
            record.log,
            vec!["lock", "on_move:5", "unlock", "failure:move:final->final"]
        );
    }

    #[test]
    fn failure_hook_error_reaches_the_caller() {
        let machine = machine(true, false);
        let mut record = at(2);
        record.fail_on = Some("on_failed_transition");

        let refused = machine
            .attempt(&mut record, "move", Arguments::new())
            .unwrap_err();
        assert!(matches!(refused, MachineError::Hook(_)));
        assert_eq!(refused.to_string(), "failure hook blew up");

        let mut record = at(1);
        record.interloper = Some(2);
        record.fail_on = Some("on_failed_transition");
        let lost = machine
            .attempt(&mut record, "move", Arguments::new())
            .unwrap_err();
        assert_eq!(lost.to_string(), "failure hook blew up");
        assert_eq!(record.log, vec!["lock", "unlock", "failure:move:final->final"]);
    }

    #[test]
    fn continuation_error_skips_success_and_after_hooks() {
        let machine = machine(true, true);
        let mut record = at(1);

        let error = machine
            .attempt_with(&mut record, "move", crate::arguments! { amount: 1 }, |_| {
                Err(HookError::msg("continuation failed"))
            })
            .unwrap_err();

        assert_eq!(error.to_string(), "continuation failed");
        assert!(!record.log.iter().any(|entry| entry.starts_with("success")));
        assert!(!record.log.iter().any(|entry| entry.starts_with("after_move")));
    }

    #[test]
    fn invalid_parameter_is_raised_before_anything_else() {
        let machine = machine(true, true);
        let mut record = at(1);

        let error = machine
            .attempt(&mut record, "move", crate::arguments! { amount: -1 })
            .unwrap_err();

        assert_eq!(error.to_string(), "incorrect value for `amount`");
        assert!(record.log.is_empty());
        assert_eq!(record.state, Some(1));
    }

    #[test]
    fn keyword_errors_are_raised_before_anything_else() {
        let machine = machine(true, true);
        let mut record = at(1);

        let missing = machine
            .attempt(&mut record, "move", Arguments::new())
            .unwrap_err();
        assert_eq!(missing.to_string(), "missing keyword: amount");

        let extra = machine
            .attempt(&mut record, "move", crate::arguments! { amount: 5, extra: 1 })
            .unwrap_err();
        assert_eq!(extra.to_string(), "unknown keyword: extra");

        assert!(record.log.is_empty());
        assert_eq!(record.state, Some(1));
    }

    #[test]
    fn parameterless_actions_reject_any_argument() {
        let machine = machine(false, false);
        let mut record = at(1);

        let error = machine
            .attempt(&mut record, "move", crate::arguments! { foo: 1 })
            .unwrap_err();

        assert!(matches!(
            error,
            MachineError::Argument(ArgumentError::NoArgumentsExpected { given: 1 })
        ));
    }

    #[test]
    fn unset_field_cannot_transition() {
        let machine = machine(false, false);
        let mut record = Sample::default();

        let error = machine
            .attempt(&mut record, "move", Arguments::new())
            .unwrap_err();

        assert!(error.to_string().ends_with("on state='nil'"));
        assert_eq!(machine.current_state(&record), None);
    }

    #[test]
    fn is_in_matches_current_state() {
        let machine = machine(false, false);
        let record = at(2);

        assert!(machine.is_in(&record, "final"));
        assert!(!machine.is_in(&record, "initial"));
        assert!(!machine.is_in(&record, "unknown"));
    }
}
