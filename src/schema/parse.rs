//! Loading definitions from JSON and YAML documents.
//!
//! The document shape is
//!
//! ```text
//! { <field>: { states, events, edges, parameters?, on_successful_transition, on_failed_transition } }
//! ```
//!
//! Parameter checks cannot be written in a document, so each parameter names
//! its check and the name is resolved against a [`CheckSet`].

use crate::core::{Check, StateCode};
use crate::schema::definition::{
    Callbacks, Definition, EdgeDef, EdgeFault, Faults, ParameterDef, ParameterFault, StatesFault,
};
use crate::schema::error::ConfigError;
use serde_json::{Map, Value};
use std::collections::HashMap;

const REQUIRED_OPTIONS: [&str; 5] = [
    "states",
    "events",
    "edges",
    "on_successful_transition",
    "on_failed_transition",
];
const OPTIONAL_OPTIONS: [&str; 1] = ["parameters"];
const REQUIRED_EDGE_KEYS: [&str; 4] = ["from", "to", "action", "callbacks"];
const OPTIONAL_EDGE_KEYS: [&str; 2] = ["on_events", "parameters"];

/// Named checks that document parameters may refer to.
///
/// # Example
///
/// ```rust
/// use statefield::core::Check;
/// use statefield::schema::{CheckSet, Definition};
///
/// let checks = CheckSet::new().with("positive", Check::new(|v| v.as_i64().is_some_and(|n| n > 0)));
///
/// let definition = Definition::from_json_str(
///     r#"{
///         "state": {
///             "states": {"initial": 1, "final": 2},
///             "events": [],
///             "parameters": {"amount": {"name": "amount", "check": "positive"}},
///             "edges": [
///                 {"from": "initial", "to": "final", "action": "move",
///                  "callbacks": {"on": false, "after": false}, "parameters": ["amount"]}
///             ],
///             "on_successful_transition": false,
///             "on_failed_transition": false
///         }
///     }"#,
///     &checks,
/// )
/// .unwrap();
///
/// assert_eq!(definition.field(), "state");
/// ```
#[derive(Clone, Debug, Default)]
pub struct CheckSet {
    checks: HashMap<String, Check>,
}

impl CheckSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, check: Check) -> Self {
        self.insert(name, check);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, check: Check) {
        self.checks.insert(name.into(), check);
    }

    pub fn get(&self, name: &str) -> Option<&Check> {
        self.checks.get(name)
    }
}

impl Definition {
    /// Parse a JSON document.
    pub fn from_json_str(source: &str, checks: &CheckSet) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(source)?;
        Self::from_value(&value, checks)
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(source: &str, checks: &CheckSet) -> Result<Self, ConfigError> {
        let value: Value = serde_yaml::from_str(source)?;
        Self::from_value(&value, checks)
    }

    /// Read a definition out of an already-decoded document.
    ///
    /// Only the document envelope is checked here. A malformed section is
    /// recorded on the definition and reported by `compile` at the point
    /// where its rule runs, so the first failing rule wins regardless of
    /// where in the document it sits.
    pub fn from_value(value: &Value, checks: &CheckSet) -> Result<Self, ConfigError> {
        let document = value.as_object().ok_or(ConfigError::NotAMapping)?;
        if document.len() != 1 {
            return Err(ConfigError::FieldAndMappings);
        }
        let Some((field, body)) = document.iter().next() else {
            return Err(ConfigError::FieldAndMappings);
        };
        let body = body.as_object().ok_or(ConfigError::FieldAndMappings)?;

        let has_required = REQUIRED_OPTIONS.iter().all(|key| body.contains_key(*key));
        let only_known = body
            .keys()
            .all(|key| REQUIRED_OPTIONS.contains(&key.as_str()) || OPTIONAL_OPTIONS.contains(&key.as_str()));
        if !has_required || !only_known {
            return Err(ConfigError::UnknownOptions);
        }

        let mut faults = Faults::default();
        let states = parse_states(&body["states"], &mut faults);
        let events = string_list(&body["events"]).unwrap_or_else(|| {
            faults.events = true;
            Vec::new()
        });
        let parameters = match body.get("parameters") {
            Some(Value::Null) | None => None,
            Some(parameters) => parse_parameters(parameters, checks, &mut faults),
        };
        let edges = parse_edges(&body["edges"], &mut faults);
        let on_successful_transition = body["on_successful_transition"].as_bool().unwrap_or_else(|| {
            faults.on_successful_transition = true;
            false
        });
        let on_failed_transition = body["on_failed_transition"].as_bool().unwrap_or_else(|| {
            faults.on_failed_transition = true;
            false
        });

        Ok(Definition {
            field: field.clone(),
            states,
            events,
            parameters,
            edges,
            on_successful_transition,
            on_failed_transition,
            faults,
        })
    }
}

fn parse_states(value: &Value, faults: &mut Faults) -> Vec<(String, StateCode)> {
    let Some(states) = value.as_object() else {
        faults.states = Some(StatesFault::NotMapping);
        return Vec::new();
    };

    let mut parsed = Vec::with_capacity(states.len());
    for (name, code) in states {
        match code.as_u64().and_then(|code| StateCode::try_from(code).ok()) {
            Some(code) => parsed.push((name.clone(), code)),
            None => faults.states = Some(StatesFault::InvalidMapping),
        }
    }
    parsed
}

fn parse_parameters(
    value: &Value,
    checks: &CheckSet,
    faults: &mut Faults,
) -> Option<Vec<(String, ParameterDef)>> {
    let Some(parameters) = value.as_object() else {
        faults.parameters = true;
        return None;
    };

    let parsed = parameters
        .iter()
        .map(|(id, details)| {
            let Some(details) = details
                .as_object()
                .filter(|d| d.len() == 2 && d.contains_key("name") && d.contains_key("check"))
            else {
                faults.parameter.insert(id.clone(), ParameterFault::Shape);
                return (id.clone(), placeholder_parameter());
            };
            // A non-string name stays empty and fails the identifier rule.
            let name = details["name"].as_str().unwrap_or_default().to_string();
            let check = match details["check"].as_str().and_then(|check| checks.get(check)) {
                Some(check) => check.clone(),
                None => {
                    faults.parameter.insert(id.clone(), ParameterFault::Check);
                    Check::any()
                }
            };
            (id.clone(), ParameterDef { name, check })
        })
        .collect();
    Some(parsed)
}

fn placeholder_parameter() -> ParameterDef {
    ParameterDef {
        name: String::new(),
        check: Check::any(),
    }
}

fn parse_edges(value: &Value, faults: &mut Faults) -> Vec<EdgeDef> {
    let edges = match value.as_array() {
        Some(edges) if edges.iter().all(Value::is_object) => edges,
        _ => {
            faults.edges = true;
            return Vec::new();
        }
    };

    edges
        .iter()
        .filter_map(Value::as_object)
        .enumerate()
        .map(|(index, edge)| {
            let (edge, edge_faults) = parse_edge(edge);
            if !edge_faults.is_empty() {
                faults.edge.insert(index, edge_faults);
            }
            edge
        })
        .collect()
}

/// Non-string `from`, `to` and `action` values become empty strings, which
/// no state or identifier rule accepts.
fn parse_edge(edge: &Map<String, Value>) -> (EdgeDef, Vec<EdgeFault>) {
    let mut faults = Vec::new();
    let has_required = REQUIRED_EDGE_KEYS.iter().all(|key| edge.contains_key(*key));
    let only_known = edge.keys().all(|key| {
        REQUIRED_EDGE_KEYS.contains(&key.as_str()) || OPTIONAL_EDGE_KEYS.contains(&key.as_str())
    });
    if !has_required || !only_known {
        faults.push(EdgeFault::Keys);
    }

    let text = |key: &str| {
        edge.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let callbacks = edge
        .get("callbacks")
        .and_then(parse_callbacks)
        .unwrap_or_else(|| {
            faults.push(EdgeFault::Callbacks);
            Callbacks::default()
        });
    let mut optional_list = |key: &str, fault: EdgeFault| match edge.get(key) {
        Some(Value::Null) | None => None,
        Some(list) => string_list(list).or_else(|| {
            faults.push(fault);
            None
        }),
    };
    let on_events = optional_list("on_events", EdgeFault::Events);
    let parameters = optional_list("parameters", EdgeFault::Parameters);

    let edge = EdgeDef {
        from: text("from"),
        to: text("to"),
        action: text("action"),
        callbacks,
        on_events,
        parameters,
    };
    (edge, faults)
}

fn parse_callbacks(value: &Value) -> Option<Callbacks> {
    let callbacks = value.as_object()?;
    if callbacks.len() != 2 {
        return None;
    }
    Some(Callbacks {
        on: callbacks.get("on")?.as_bool()?,
        after: callbacks.get("after")?.as_bool()?,
    })
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{compile, HostInterface};
    use serde_json::json;

    fn document(body: Value) -> Value {
        json!({ "state": body })
    }

    fn minimal_body() -> Value {
        json!({
            "states": {"initial": 1, "final": 2},
            "events": [],
            "edges": [
                {"from": "initial", "to": "final", "action": "move", "callbacks": {"on": false, "after": false}}
            ],
            "on_successful_transition": false,
            "on_failed_transition": false
        })
    }

    fn parse(value: Value) -> Result<Definition, ConfigError> {
        Definition::from_value(&value, &CheckSet::new())
    }

    fn compile_document(body: Value) -> ConfigError {
        let definition = parse(document(body)).unwrap();
        compile(definition, &HostInterface::new("SampleClass")).unwrap_err()
    }

    #[test]
    fn parses_minimal_document() {
        let definition = parse(document(minimal_body())).unwrap();

        assert_eq!(definition.field, "state");
        assert_eq!(
            definition.states,
            vec![("initial".to_string(), 1), ("final".to_string(), 2)]
        );
        assert_eq!(definition.edges, vec![EdgeDef::new("initial", "final", "move")]);
        assert!(definition.parameters.is_none());
        assert_eq!(definition.faults, Faults::default());
    }

    #[test]
    fn rejects_non_mapping() {
        assert!(matches!(parse(json!("state")), Err(ConfigError::NotAMapping)));
    }

    #[test]
    fn rejects_field_without_mappings() {
        assert!(matches!(
            parse(json!({"state": "foo"})),
            Err(ConfigError::FieldAndMappings)
        ));
        assert!(matches!(
            parse(json!({"a": {}, "b": {}})),
            Err(ConfigError::FieldAndMappings)
        ));
    }

    #[test]
    fn rejects_unknown_or_missing_options() {
        assert!(matches!(
            parse(document(json!({"foo": 1, "bar": 2}))),
            Err(ConfigError::UnknownOptions)
        ));

        let mut body = minimal_body();
        body["extra"] = json!(true);
        assert!(matches!(parse(document(body)), Err(ConfigError::UnknownOptions)));
    }

    #[test]
    fn malformed_sections_load_and_fail_to_compile() {
        let mut body = minimal_body();
        body["events"] = json!(2);
        body["edges"] = json!("nothing");
        let definition = parse(document(body)).unwrap();

        assert!(definition.faults.events);
        assert!(definition.faults.edges);
        assert!(definition.edges.is_empty());
    }

    #[test]
    fn rejects_empty_states() {
        let mut body = minimal_body();
        body["states"] = json!({});
        assert!(matches!(compile_document(body), ConfigError::NoStates));

        let mut body = minimal_body();
        body["states"] = json!(["initial", "final"]);
        assert!(matches!(compile_document(body), ConfigError::StatesNotMapping));
    }

    #[test]
    fn rejects_non_integer_state_codes() {
        let mut body = minimal_body();
        body["states"] = json!({"foo": "hello", "bar": 4.7});
        assert!(matches!(
            compile_document(body),
            ConfigError::InvalidStateMapping
        ));

        let mut body = minimal_body();
        body["states"] = json!({"foo": -1});
        assert!(matches!(
            compile_document(body),
            ConfigError::InvalidStateMapping
        ));
    }

    #[test]
    fn rejects_non_list_events() {
        let mut body = minimal_body();
        body["events"] = json!(2);
        assert!(matches!(compile_document(body), ConfigError::InvalidEvents));
    }

    #[test]
    fn rejects_malformed_parameters() {
        let mut body = minimal_body();
        body["parameters"] = json!(["foo_message"]);
        assert!(matches!(compile_document(body), ConfigError::InvalidParameters));

        let mut body = minimal_body();
        body["parameters"] = json!({"foo_message": {"name": "message"}});
        assert_eq!(
            compile_document(body).to_string(),
            "`parameters.foo_message` should be a mapping with exactly the keys name and check"
        );

        let mut body = minimal_body();
        body["parameters"] = json!({"foo_message": {"name": 3, "check": "any"}});
        assert!(matches!(
            compile_document(body),
            ConfigError::ParameterName { id } if id == "foo_message"
        ));

        let mut body = minimal_body();
        body["parameters"] = json!({"foo_message": {"name": "message", "check": "unknown"}});
        assert!(matches!(
            compile_document(body),
            ConfigError::ParameterCheck { id } if id == "foo_message"
        ));
    }

    #[test]
    fn parameters_are_reported_in_declaration_order() {
        let mut body = minimal_body();
        body["parameters"] = json!({
            "first": {"name": "first", "check": "unknown"},
            "second": {"name": "second"}
        });
        assert!(matches!(
            compile_document(body),
            ConfigError::ParameterCheck { id } if id == "first"
        ));
    }

    #[test]
    fn resolves_named_checks() {
        let checks = CheckSet::new().with("positive", Check::new(|v| v.as_i64().is_some_and(|n| n > 0)));
        let mut body = minimal_body();
        body["parameters"] = json!({"amount": {"name": "amount", "check": "positive"}});

        let definition = Definition::from_value(&document(body), &checks).unwrap();
        let parameters = definition.parameters.unwrap();

        assert_eq!(parameters[0].0, "amount");
        assert!(parameters[0].1.check.check(&json!(3)));
        assert!(!parameters[0].1.check.check(&json!(0)));
    }

    #[test]
    fn rejects_malformed_edges() {
        let mut body = minimal_body();
        body["edges"] = json!([1, 2]);
        assert!(matches!(compile_document(body), ConfigError::InvalidEdges));

        let mut body = minimal_body();
        body["edges"] = json!([{"from": "initial", "to": "final", "action": "move"}]);
        assert!(matches!(
            compile_document(body),
            ConfigError::EdgeKeys { index: 0 }
        ));

        let mut body = minimal_body();
        body["edges"][0]["from"] = json!(1);
        assert!(matches!(
            compile_document(body),
            ConfigError::EdgeFrom { index: 0 }
        ));

        let mut body = minimal_body();
        body["edges"][0]["callbacks"] = json!({"on": true});
        assert!(matches!(
            compile_document(body),
            ConfigError::EdgeCallbacks { index: 0 }
        ));

        let mut body = minimal_body();
        body["edges"][0]["on_events"] = json!("bar");
        assert!(matches!(
            compile_document(body),
            ConfigError::EdgeEvents { index: 0 }
        ));

        let mut body = minimal_body();
        body["edges"][0]["parameters"] = json!({"amount": true});
        assert!(matches!(
            compile_document(body),
            ConfigError::EdgeParameters { index: 0 }
        ));
    }

    #[test]
    fn edge_faults_are_reported_at_their_index() {
        let mut body = minimal_body();
        body["edges"] = json!([
            {"from": "initial", "to": "final", "action": "move", "callbacks": {"on": false, "after": false}},
            {"from": "final", "to": "nowhere", "action": "back", "callbacks": {"on": false, "after": false}},
            {"from": "final", "to": "initial", "action": "reset"}
        ]);
        assert!(matches!(compile_document(body), ConfigError::EdgeTo { index: 1 }));
    }

    #[test]
    fn state_rules_run_before_edge_shape() {
        let mut body = minimal_body();
        body["states"] = json!({"a": 1, "b": 1});
        body["edges"] = json!([{"from": "a", "to": "b", "action": "go"}]);
        assert!(matches!(
            compile_document(body),
            ConfigError::InvalidStateMapping
        ));
    }

    #[test]
    fn rejects_non_boolean_hook_flags() {
        let mut body = minimal_body();
        body["on_failed_transition"] = json!(5);
        assert_eq!(
            compile_document(body).to_string(),
            "`on_failed_transition` must be a boolean"
        );
    }

    #[test]
    fn hook_flags_are_checked_last() {
        let mut body = minimal_body();
        body["on_successful_transition"] = json!("yes");
        body["edges"][0]["to"] = json!("nowhere");
        assert!(matches!(compile_document(body), ConfigError::EdgeTo { index: 0 }));

        let mut body = minimal_body();
        body["on_successful_transition"] = json!("yes");
        body["on_failed_transition"] = json!(null);
        assert!(matches!(
            compile_document(body),
            ConfigError::HookFlag { hook: "on_successful_transition" }
        ));
    }

    #[test]
    fn parses_yaml_documents() {
        let yaml = r#"
status:
  states:
    draft: 0
    published: 1
  events: [publish]
  edges:
    - from: draft
      to: published
      action: release
      callbacks: { on: true, after: false }
      on_events: [publish]
  on_successful_transition: true
  on_failed_transition: false
"#;
        let definition = Definition::from_yaml_str(yaml, &CheckSet::new()).unwrap();

        assert_eq!(definition.field, "status");
        assert_eq!(definition.events, vec!["publish".to_string()]);
        assert_eq!(
            definition.edges[0],
            EdgeDef::new("draft", "published", "release")
                .on()
                .on_events(["publish"])
        );
        assert!(definition.on_successful_transition);
    }

    #[test]
    fn reports_invalid_json() {
        let result = Definition::from_json_str("{not json", &CheckSet::new());
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }
}
