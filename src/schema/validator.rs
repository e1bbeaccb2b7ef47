//! Compilation of a [`Definition`] into a [`MachineSpec`].
//!
//! Rules run in a fixed order and the first violation is reported:
//!
//! 1. states
//! 2. event names
//! 3. event hooks (and shared parameter lists for events used by edges)
//! 4. parameters
//! 5. edges, one at a time in declaration order
//! 6. success/failure hooks
//!
//! Nothing is produced unless every rule passes.

use crate::core::{is_identifier, SymbolError, SymbolTable};
use crate::runtime::{Edge, MachineSpec, Parameter};
use crate::schema::definition::{
    Definition, EdgeDef, EdgeFault, ParameterDef, ParameterFault, StatesFault,
};
use crate::schema::error::ConfigError;
use crate::schema::interface::{render_signature, HostInterface};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::info;

const TRANSITION_HOOK_KEYWORDS: [&str; 4] = ["field", "action", "from", "to"];

/// Validate `definition` against the host's `interface` and compile it.
///
/// # Example
///
/// ```rust
/// use statefield::schema::{compile, Definition, EdgeDef, HostInterface};
///
/// let definition = Definition::builder("state")
///     .state("initial", 1)
///     .state("final", 2)
///     .edge(EdgeDef::new("initial", "final", "move"))
///     .build();
///
/// let machine = compile(definition, &HostInterface::new("Sample")).unwrap();
///
/// assert_eq!(machine.states().code_of("final"), Some(2));
/// assert!(machine.edge("move").is_some());
/// ```
pub fn compile(definition: Definition, interface: &HostInterface) -> Result<MachineSpec, ConfigError> {
    let symbols = check_states(&definition, interface)?;
    check_event_names(&definition, interface)?;
    check_event_hooks(&definition, interface)?;
    check_parameters(&definition)?;
    check_edges(&definition, interface, &symbols)?;
    check_transition_hook(
        "on_successful_transition",
        definition.on_successful_transition,
        definition.faults.on_successful_transition,
        interface,
    )?;
    check_transition_hook(
        "on_failed_transition",
        definition.on_failed_transition,
        definition.faults.on_failed_transition,
        interface,
    )?;

    let machine = assemble(definition, interface, symbols);
    info!(
        host_type = %machine.host_type,
        field = %machine.field,
        states = machine.symbols.len(),
        edges = machine.edges.len(),
        events = machine.events.len(),
        "Compiled state machine"
    );
    Ok(machine)
}

fn check_states(definition: &Definition, interface: &HostInterface) -> Result<SymbolTable, ConfigError> {
    match definition.faults.states {
        Some(StatesFault::NotMapping) => return Err(ConfigError::StatesNotMapping),
        Some(StatesFault::InvalidMapping) => return Err(ConfigError::InvalidStateMapping),
        None => {}
    }
    if definition.states.is_empty() {
        return Err(ConfigError::NoStates);
    }
    if !definition.states.iter().all(|(name, _)| is_identifier(name)) {
        return Err(ConfigError::InvalidStateMapping);
    }

    let symbols = SymbolTable::from_pairs(definition.states.iter().cloned()).map_err(|e| match e {
        SymbolError::Empty => ConfigError::NoStates,
        SymbolError::DuplicateName(_) | SymbolError::DuplicateCode(_) => {
            ConfigError::InvalidStateMapping
        }
    })?;

    for state in symbols.names() {
        if interface.has_type_operation(state) {
            return Err(ConfigError::StateClashesWithTypeOperation {
                state: state.to_string(),
                type_name: interface.type_name().to_string(),
            });
        }
        if interface.has_operation(&format!("is_{state}")) {
            return Err(ConfigError::StateClashesWithPredicate {
                state: state.to_string(),
                type_name: interface.type_name().to_string(),
            });
        }
    }

    Ok(symbols)
}

fn check_event_names(definition: &Definition, interface: &HostInterface) -> Result<(), ConfigError> {
    if definition.faults.events {
        return Err(ConfigError::InvalidEvents);
    }
    let mut seen = HashSet::new();
    for event in &definition.events {
        if !is_identifier(event) || !seen.insert(event.as_str()) {
            return Err(ConfigError::InvalidEvents);
        }
    }

    for event in &definition.events {
        if interface.has_operation(event) || generates(definition, event) {
            return Err(ConfigError::EventClashesWithOperation {
                event: event.clone(),
                type_name: interface.type_name().to_string(),
            });
        }
    }

    Ok(())
}

fn check_event_hooks(definition: &Definition, interface: &HostInterface) -> Result<(), ConfigError> {
    for event in &definition.events {
        let subscribers: Vec<&EdgeDef> = definition
            .edges
            .iter()
            .filter(|edge| edge.listens_to(event))
            .collect();

        let mut expected = vec!["action".to_string()];
        if let Some(first) = subscribers.first() {
            let parameter_sets: HashSet<BTreeSet<&str>> = subscribers
                .iter()
                .map(|edge| edge.parameter_ids().iter().map(String::as_str).collect())
                .collect();
            if parameter_sets.len() > 1 {
                return Err(ConfigError::MixedEventParameters {
                    event: event.clone(),
                    actions: subscribers.iter().map(|edge| edge.action.clone()).collect(),
                });
            }
            for name in carried_names(definition, first.parameter_ids()) {
                if !expected.contains(&name) {
                    expected.push(name);
                }
            }
        }

        for prefix in ["on", "after"] {
            let hook = format!("{prefix}_{event}");
            if !interface.accepts_exactly(&hook, &expected) {
                return Err(ConfigError::EventHookNotFound {
                    signature: render_signature(&hook, &expected),
                });
            }
        }
    }

    Ok(())
}

fn check_parameters(definition: &Definition) -> Result<(), ConfigError> {
    if definition.faults.parameters {
        return Err(ConfigError::InvalidParameters);
    }
    let Some(parameters) = &definition.parameters else {
        return Ok(());
    };

    let mut seen = HashSet::new();
    for (id, _) in parameters {
        if !is_identifier(id) || !seen.insert(id.as_str()) {
            return Err(ConfigError::InvalidParameters);
        }
    }

    for (id, parameter) in parameters {
        let fault = definition.faults.parameter.get(id);
        if fault == Some(&ParameterFault::Shape) {
            return Err(ConfigError::ParameterShape { id: id.clone() });
        }
        if !is_identifier(&parameter.name) {
            return Err(ConfigError::ParameterName { id: id.clone() });
        }
        if fault == Some(&ParameterFault::Check) {
            return Err(ConfigError::ParameterCheck { id: id.clone() });
        }
    }

    Ok(())
}

fn check_edges(
    definition: &Definition,
    interface: &HostInterface,
    symbols: &SymbolTable,
) -> Result<(), ConfigError> {
    if definition.faults.edges {
        return Err(ConfigError::InvalidEdges);
    }
    let faults = &definition.faults;
    let mut actions = HashSet::new();
    let mut routes = HashSet::new();

    for (index, edge) in definition.edges.iter().enumerate() {
        let action = edge.action.as_str();
        let keywords = carried_names(definition, edge.parameter_ids());

        if faults.edge_has(index, EdgeFault::Keys) {
            return Err(ConfigError::EdgeKeys { index });
        }
        if !symbols.contains(&edge.from) {
            return Err(ConfigError::EdgeFrom { index });
        }
        if !symbols.contains(&edge.to) {
            return Err(ConfigError::EdgeTo { index });
        }
        if !routes.insert((edge.from.as_str(), edge.to.as_str())) {
            return Err(ConfigError::DuplicateEdge { index });
        }
        if !is_identifier(action) {
            return Err(ConfigError::EdgeAction { index });
        }
        if interface.has_operation(action) || generates(definition, action) {
            return Err(ConfigError::ActionClashesWithOperation {
                action: action.to_string(),
                type_name: interface.type_name().to_string(),
            });
        }
        if interface.has_operation(&format!("can_{action}")) {
            return Err(ConfigError::ActionClashesWithCheck {
                action: action.to_string(),
                type_name: interface.type_name().to_string(),
            });
        }
        if !actions.insert(action) {
            return Err(ConfigError::DuplicateAction {
                index,
                action: action.to_string(),
            });
        }
        if definition.events.iter().any(|event| event == action) {
            return Err(ConfigError::ActionClashesWithEvent {
                index,
                action: action.to_string(),
            });
        }

        if faults.edge_has(index, EdgeFault::Callbacks) {
            return Err(ConfigError::EdgeCallbacks { index });
        }
        let mut expected: Vec<&str> = Vec::with_capacity(keywords.len());
        for name in &keywords {
            if !expected.contains(&name.as_str()) {
                expected.push(name);
            }
        }
        for (enabled, prefix) in [(edge.callbacks.on, "on"), (edge.callbacks.after, "after")] {
            let hook = format!("{prefix}_{action}");
            if enabled && !interface.accepts_exactly(&hook, &expected) {
                return Err(ConfigError::ActionHookNotFound {
                    signature: render_signature(&hook, &expected),
                });
            }
        }

        if faults.edge_has(index, EdgeFault::Events) {
            return Err(ConfigError::EdgeEvents { index });
        }
        if let Some(events) = &edge.on_events {
            for (position, event) in events.iter().enumerate() {
                if !definition.events.contains(event) {
                    return Err(ConfigError::UnregisteredEvent {
                        event: event.clone(),
                        index,
                        position,
                    });
                }
            }
        }

        if faults.edge_has(index, EdgeFault::Parameters) {
            return Err(ConfigError::EdgeParameters { index });
        }
        if expected.len() != keywords.len() {
            return Err(ConfigError::DuplicateParameterName { index });
        }

        for (position, id) in edge.parameter_ids().iter().enumerate() {
            if find_parameter(definition, id).is_none() {
                return Err(ConfigError::UnregisteredParameter {
                    parameter: id.clone(),
                    index,
                    position,
                });
            }
        }
    }

    Ok(())
}

fn check_transition_hook(
    hook: &'static str,
    enabled: bool,
    malformed: bool,
    interface: &HostInterface,
) -> Result<(), ConfigError> {
    if malformed {
        return Err(ConfigError::HookFlag { hook });
    }
    if enabled && !interface.accepts_exactly(hook, &TRANSITION_HOOK_KEYWORDS) {
        return Err(ConfigError::HookSignature { hook });
    }
    Ok(())
}

/// Whether the machine itself generates an operation called `name`: the
/// field reader or one of the `is_<state>` predicates.
fn generates(definition: &Definition, name: &str) -> bool {
    name == definition.field
        || name
            .strip_prefix("is_")
            .is_some_and(|state| definition.states.iter().any(|(candidate, _)| candidate == state))
}

fn find_parameter<'a>(definition: &'a Definition, id: &str) -> Option<&'a ParameterDef> {
    definition
        .parameters
        .as_ref()?
        .iter()
        .find(|(candidate, _)| candidate == id)
        .map(|(_, parameter)| parameter)
}

/// Carried names for a list of parameter ids, skipping undeclared ids.
fn carried_names(definition: &Definition, ids: &[String]) -> Vec<String> {
    ids.iter()
        .filter_map(|id| find_parameter(definition, id))
        .map(|parameter| parameter.name.clone())
        .collect()
}

fn assemble(definition: Definition, interface: &HostInterface, symbols: SymbolTable) -> MachineSpec {
    let parameters: Vec<Parameter> = definition
        .parameters
        .unwrap_or_default()
        .into_iter()
        .map(|(id, parameter)| Parameter {
            id,
            name: parameter.name,
            check: parameter.check,
        })
        .collect();

    let mut actions = HashMap::new();
    let mut edges: Vec<Edge> = Vec::with_capacity(definition.edges.len());
    for edge in definition.edges {
        let (Some(from_code), Some(to_code)) = (symbols.code_of(&edge.from), symbols.code_of(&edge.to)) else {
            continue;
        };
        let parameter_ids = edge.parameters.unwrap_or_default();
        let required = parameters
            .iter()
            .filter(|p| parameter_ids.contains(&p.id))
            .cloned()
            .collect();
        actions.insert(edge.action.clone(), edges.len());

        edges.push(Edge {
            from: edge.from,
            to: edge.to,
            from_code,
            to_code,
            action: edge.action,
            callbacks: edge.callbacks,
            on_events: edge.on_events.unwrap_or_default(),
            parameter_ids,
            parameters: required,
        });
    }

    MachineSpec {
        host_type: interface.type_name().to_string(),
        field: definition.field,
        symbols,
        events: definition.events,
        edges,
        actions,
        parameters,
        success_hook: definition.on_successful_transition,
        failure_hook: definition.on_failed_transition,
    }
}
