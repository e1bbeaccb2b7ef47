//! Configuration errors raised while compiling a machine definition.

use thiserror::Error;

/// Every way a definition can be rejected.
///
/// Each validator rule has its own variant so callers can tell exactly which
/// clause failed; the rendered text names the offending state, event,
/// parameter, or edge index.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("state_machine() has to be called on a mapping")]
    NotAMapping,

    #[error("state_machine() has to specify a field and the mappings")]
    FieldAndMappings,

    #[error("state_machine() should have (only) the following mappings: states, events, edges, parameters (optional), on_successful_transition, on_failed_transition")]
    UnknownOptions,

    #[error("`states` should be a mapping")]
    StatesNotMapping,

    #[error("`states` does not specify any states")]
    NoStates,

    #[error("`states` must be a mapping of identifiers to unique non-negative integers")]
    InvalidStateMapping,

    #[error("`{state}` is an invalid state name. `{type_name}::{state}` type-level operation already exists")]
    StateClashesWithTypeOperation { state: String, type_name: String },

    #[error("`{state}` is an invalid state name. `{type_name}::is_{state}` operation already exists")]
    StateClashesWithPredicate { state: String, type_name: String },

    #[error("`events` should be a list of unique identifiers")]
    InvalidEvents,

    #[error("`{event}` is not a valid event name. `{type_name}::{event}` operation already exists")]
    EventClashesWithOperation { event: String, type_name: String },

    #[error("`{signature}` not found")]
    EventHookNotFound { signature: String },

    #[error("Event `{event}` is being used by edges ({}) with mixed lists of parameters", quoted(.actions))]
    MixedEventParameters { event: String, actions: Vec<String> },

    #[error("`parameters` should be a mapping of unique parameter identifiers to {{name, check}}")]
    InvalidParameters,

    #[error("`parameters.{id}` should be a mapping with exactly the keys name and check")]
    ParameterShape { id: String },

    #[error("`parameters.{id}.name` should be an identifier")]
    ParameterName { id: String },

    #[error("`parameters.{id}.check` should be a predicate that takes one value")]
    ParameterCheck { id: String },

    #[error("`edges` should be a list of mappings, with keys: from, to, action, callbacks{{on, after}}, on_events (optional), parameters (optional)")]
    InvalidEdges,

    #[error("`edges[{index}]` should only have keys: from, to, action, callbacks, on_events (optional), parameters (optional)")]
    EdgeKeys { index: usize },

    #[error("`edges[{index}].from` is not a valid state")]
    EdgeFrom { index: usize },

    #[error("`edges[{index}].to` is not a valid state")]
    EdgeTo { index: usize },

    #[error("`edges[{index}]` is a duplicate edge")]
    DuplicateEdge { index: usize },

    #[error("`edges[{index}].action` is not an identifier")]
    EdgeAction { index: usize },

    #[error("`{action}` is an invalid action name. `{type_name}::{action}` operation already exists")]
    ActionClashesWithOperation { action: String, type_name: String },

    #[error("`{action}` is an invalid action name. `{type_name}::can_{action}` operation already exists")]
    ActionClashesWithCheck { action: String, type_name: String },

    #[error("`edges[{index}].action` `{action}` is already used by another edge")]
    DuplicateAction { index: usize, action: String },

    #[error("`edges[{index}].action` `{action}` is also declared as an event")]
    ActionClashesWithEvent { index: usize, action: String },

    #[error("`edges[{index}].callbacks` must be {{on: true/false, after: true/false}}")]
    EdgeCallbacks { index: usize },

    #[error("`{signature}` not found")]
    ActionHookNotFound { signature: String },

    #[error("`edges[{index}].on_events` is not a valid list of events")]
    EdgeEvents { index: usize },

    #[error("`{event}` (`edges[{index}].on_events[{position}]`) is not a registered event")]
    UnregisteredEvent {
        event: String,
        index: usize,
        position: usize,
    },

    #[error("`edges[{index}].parameters` is not a valid list of parameters")]
    EdgeParameters { index: usize },

    #[error("`edges[{index}].parameters` lists multiple parameters with the same name")]
    DuplicateParameterName { index: usize },

    #[error("`{parameter}` (`edges[{index}].parameters[{position}]`) is not a registered parameter")]
    UnregisteredParameter {
        parameter: String,
        index: usize,
        position: usize,
    },

    #[error("`{hook}` must be a boolean")]
    HookFlag { hook: &'static str },

    #[error("`{hook}` must be an operation of signature `(field, action, from, to)`")]
    HookSignature { hook: &'static str },

    #[error("a state machine for `{type_name}::{field}` is already registered")]
    DuplicateMachine { type_name: String, field: String },

    #[error("definition is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("definition is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("`{name}`"))
        .collect::<Vec<_>>()
        .join(", ")
}
