//! The compiled, immutable form of a machine.

use crate::core::{Check, StateCode, SymbolTable};
use crate::schema::Callbacks;
use serde::Serialize;
use std::collections::HashMap;

/// A declared parameter after compilation.
#[derive(Clone, Debug)]
pub struct Parameter {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) check: Check,
}

impl Parameter {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Keyword the value is supplied and carried under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check(&self) -> &Check {
        &self.check
    }
}

/// One permitted transition.
#[derive(Clone, Debug)]
pub struct Edge {
    pub(crate) from: String,
    pub(crate) to: String,
    pub(crate) from_code: StateCode,
    pub(crate) to_code: StateCode,
    pub(crate) action: String,
    pub(crate) callbacks: Callbacks,
    pub(crate) on_events: Vec<String>,
    pub(crate) parameter_ids: Vec<String>,
    /// Parameters this edge requires, in machine declaration order.
    pub(crate) parameters: Vec<Parameter>,
}

impl Edge {
    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn from_code(&self) -> StateCode {
        self.from_code
    }

    pub fn to_code(&self) -> StateCode {
        self.to_code
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn callbacks(&self) -> Callbacks {
        self.callbacks
    }

    pub fn on_events(&self) -> &[String] {
        &self.on_events
    }

    pub fn listens_to(&self, event: &str) -> bool {
        self.on_events.iter().any(|e| e == event)
    }

    /// Parameter identifiers as declared on the edge.
    pub fn parameter_ids(&self) -> &[String] {
        &self.parameter_ids
    }

    /// Keywords a caller must supply.
    pub fn keywords(&self) -> impl Iterator<Item = &str> + '_ {
        self.parameters.iter().map(|p| p.name.as_str())
    }

    /// Pure admission test: is the record in this edge's source state?
    pub fn admits(&self, current: Option<StateCode>) -> bool {
        current == Some(self.from_code)
    }
}

/// Compiled, immutable description of one machine over one field.
///
/// Produced only by [`compile`](crate::schema::compile); once built it is
/// never modified.
#[derive(Clone, Debug)]
pub struct MachineSpec {
    pub(crate) host_type: String,
    pub(crate) field: String,
    pub(crate) symbols: SymbolTable,
    pub(crate) events: Vec<String>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) actions: HashMap<String, usize>,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) success_hook: bool,
    pub(crate) failure_hook: bool,
}

impl MachineSpec {
    pub fn host_type(&self) -> &str {
        &self.host_type
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn states(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn has_event(&self, event: &str) -> bool {
        self.events.iter().any(|e| e == event)
    }

    /// Edges in declaration order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The edge performed by `action`.
    pub fn edge(&self, action: &str) -> Option<&Edge> {
        self.actions.get(action).map(|&index| &self.edges[index])
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, id: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.id == id)
    }

    pub fn has_success_hook(&self) -> bool {
        self.success_hook
    }

    pub fn has_failure_hook(&self) -> bool {
        self.failure_hook
    }

    /// Instance operation names this machine adds to its host type.
    pub fn generated_operations(&self) -> Vec<String> {
        let mut operations = vec![self.field.clone()];
        operations.extend(self.symbols.names().map(|state| format!("is_{state}")));
        operations.extend(self.events.iter().cloned());
        for edge in &self.edges {
            operations.push(edge.action.clone());
            operations.push(format!("can_{}", edge.action));
        }
        operations
    }

    /// Type-level operation names this machine adds to its host type.
    pub fn generated_type_operations(&self) -> Vec<String> {
        let mut operations = vec![format!("{}_states", self.field)];
        operations.extend(self.symbols.names().map(str::to_string));
        operations
    }

    /// Serializable summary without the parameter checks.
    pub fn describe(&self) -> MachineSummary {
        MachineSummary {
            host_type: self.host_type.clone(),
            field: self.field.clone(),
            states: self.symbols.iter().map(|(n, c)| (n.to_string(), c)).collect(),
            events: self.events.clone(),
            edges: self
                .edges
                .iter()
                .map(|edge| EdgeSummary {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    action: edge.action.clone(),
                    on: edge.callbacks.on,
                    after: edge.callbacks.after,
                    on_events: edge.on_events.clone(),
                    parameters: edge.parameter_ids.clone(),
                })
                .collect(),
            parameters: self
                .parameters
                .iter()
                .map(|p| (p.id.clone(), p.name.clone()))
                .collect(),
            on_successful_transition: self.success_hook,
            on_failed_transition: self.failure_hook,
        }
    }
}

/// Serializable view of a compiled machine.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MachineSummary {
    pub host_type: String,
    pub field: String,
    pub states: Vec<(String, StateCode)>,
    pub events: Vec<String>,
    pub edges: Vec<EdgeSummary>,
    /// `(id, carried name)` pairs.
    pub parameters: Vec<(String, String)>,
    pub on_successful_transition: bool,
    pub on_failed_transition: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EdgeSummary {
    pub from: String,
    pub to: String,
    pub action: String,
    pub on: bool,
    pub after: bool,
    pub on_events: Vec<String>,
    pub parameters: Vec<String>,
}
