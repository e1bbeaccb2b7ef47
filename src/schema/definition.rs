//! Declarative machine definitions and their builders.
//!
//! A `Definition` is the raw, unvalidated description of one machine. It can
//! be assembled in code with [`DefinitionBuilder`] or loaded from a JSON/YAML
//! document (see [`Definition::from_json_str`]). Nothing is checked until the
//! definition is compiled. Shape problems found while loading a document are
//! recorded as [`Faults`] and reported by `compile` alongside the rule they
//! belong to.

use crate::core::{Check, StateCode};
use std::collections::BTreeMap;

/// Which per-action hooks an edge invokes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Callbacks {
    /// Invoke `on_<action>` inside the exclusive section.
    pub on: bool,
    /// Invoke `after_<action>` once the section is released.
    pub after: bool,
}

/// A declared transition parameter.
#[derive(Clone, Debug)]
pub struct ParameterDef {
    /// Keyword under which the value is supplied and passed to hooks.
    pub name: String,
    pub check: Check,
}

/// One declared edge, before validation.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeDef {
    pub from: String,
    pub to: String,
    pub action: String,
    pub callbacks: Callbacks,
    pub on_events: Option<Vec<String>>,
    pub parameters: Option<Vec<String>>,
}

impl EdgeDef {
    /// An edge with no callbacks, events, or parameters.
    pub fn new(from: impl Into<String>, to: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            action: action.into(),
            callbacks: Callbacks::default(),
            on_events: None,
            parameters: None,
        }
    }

    /// Invoke `on_<action>` inside the exclusive section.
    pub fn on(mut self) -> Self {
        self.callbacks.on = true;
        self
    }

    /// Invoke `after_<action>` after the section is released.
    pub fn after(mut self) -> Self {
        self.callbacks.after = true;
        self
    }

    pub fn callbacks(mut self, on: bool, after: bool) -> Self {
        self.callbacks = Callbacks { on, after };
        self
    }

    /// Events that may trigger this edge.
    pub fn on_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.on_events = Some(events.into_iter().map(Into::into).collect());
        self
    }

    /// Parameter identifiers this edge requires.
    pub fn parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = Some(parameters.into_iter().map(Into::into).collect());
        self
    }

    pub(crate) fn listens_to(&self, event: &str) -> bool {
        self.on_events
            .as_ref()
            .is_some_and(|events| events.iter().any(|e| e == event))
    }

    pub(crate) fn parameter_ids(&self) -> &[String] {
        self.parameters.as_deref().unwrap_or(&[])
    }
}

/// How the `states` section of a document was malformed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StatesFault {
    NotMapping,
    InvalidMapping,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ParameterFault {
    Shape,
    Check,
}

/// A malformed key of one document edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EdgeFault {
    Keys,
    Callbacks,
    Events,
    Parameters,
}

/// Shape problems recorded while loading a document.
///
/// Builders never produce faults. A malformed value is replaced by a
/// placeholder (an empty string, an empty list, `false`) and the fault is
/// kept here so `compile` can report it in rule order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Faults {
    pub(crate) states: Option<StatesFault>,
    pub(crate) events: bool,
    pub(crate) parameters: bool,
    pub(crate) parameter: BTreeMap<String, ParameterFault>,
    pub(crate) edges: bool,
    pub(crate) edge: BTreeMap<usize, Vec<EdgeFault>>,
    pub(crate) on_successful_transition: bool,
    pub(crate) on_failed_transition: bool,
}

impl Faults {
    pub(crate) fn edge_has(&self, index: usize, fault: EdgeFault) -> bool {
        self.edge
            .get(&index)
            .is_some_and(|faults| faults.contains(&fault))
    }
}

/// Raw description of a machine over one field.
#[derive(Clone, Debug)]
pub struct Definition {
    pub(crate) field: String,
    pub(crate) states: Vec<(String, StateCode)>,
    pub(crate) events: Vec<String>,
    pub(crate) parameters: Option<Vec<(String, ParameterDef)>>,
    pub(crate) edges: Vec<EdgeDef>,
    pub(crate) on_successful_transition: bool,
    pub(crate) on_failed_transition: bool,
    pub(crate) faults: Faults,
}

impl Definition {
    /// Start building a definition for `field`.
    pub fn builder(field: impl Into<String>) -> DefinitionBuilder {
        DefinitionBuilder::new(field)
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

/// Fluent builder for [`Definition`].
///
/// # Example
///
/// ```rust
/// use statefield::core::Check;
/// use statefield::schema::{Definition, EdgeDef};
///
/// let definition = Definition::builder("status")
///     .state("pending", 1)
///     .state("paid", 2)
///     .parameter("amount", "amount", Check::new(|v| v.as_i64().is_some_and(|n| n > 0)))
///     .edge(EdgeDef::new("pending", "paid", "pay").parameters(["amount"]))
///     .build();
///
/// assert_eq!(definition.field(), "status");
/// ```
#[derive(Clone, Debug)]
pub struct DefinitionBuilder {
    definition: Definition,
}

impl DefinitionBuilder {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            definition: Definition {
                field: field.into(),
                states: Vec::new(),
                events: Vec::new(),
                parameters: None,
                edges: Vec::new(),
                on_successful_transition: false,
                on_failed_transition: false,
                faults: Faults::default(),
            },
        }
    }

    /// Declare a state and the code stored for it.
    pub fn state(mut self, name: impl Into<String>, code: StateCode) -> Self {
        self.definition.states.push((name.into(), code));
        self
    }

    pub fn event(mut self, name: impl Into<String>) -> Self {
        self.definition.events.push(name.into());
        self
    }

    /// Declare parameter `id`, carried to hooks under `name`.
    pub fn parameter(mut self, id: impl Into<String>, name: impl Into<String>, check: Check) -> Self {
        self.definition
            .parameters
            .get_or_insert_with(Vec::new)
            .push((
                id.into(),
                ParameterDef {
                    name: name.into(),
                    check,
                },
            ));
        self
    }

    pub fn edge(mut self, edge: EdgeDef) -> Self {
        self.definition.edges.push(edge);
        self
    }

    pub fn on_successful_transition(mut self, enabled: bool) -> Self {
        self.definition.on_successful_transition = enabled;
        self
    }

    pub fn on_failed_transition(mut self, enabled: bool) -> Self {
        self.definition.on_failed_transition = enabled;
        self
    }

    pub fn build(self) -> Definition {
        self.definition
    }
}
