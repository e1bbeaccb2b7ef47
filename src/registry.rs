//! # Machine Registry
//!
//! Append-only store of compiled machines, keyed by host type and field.
//!
//! Registering a machine compiles its definition against the host's declared
//! interface extended with every operation generated by machines already
//! registered for that host, so two machines on one type cannot hand out the
//! same generated name.
//!
//! ## Usage
//!
//! ```rust
//! use statefield::core::{Arguments, StateCode};
//! use statefield::host::Host;
//! use statefield::registry::Registry;
//! use statefield::runtime::HookError;
//! use statefield::schema::{Definition, EdgeDef, HostInterface};
//!
//! struct Lamp;
//!
//! impl Host for Lamp {
//!     fn interface() -> HostInterface {
//!         HostInterface::new("Lamp")
//!     }
//!
//!     fn invoke(&mut self, _hook: &str, _args: &Arguments) -> Result<(), HookError> {
//!         Ok(())
//!     }
//! }
//!
//! let registry = Registry::new();
//! let definition = Definition::builder("power")
//!     .state("off", 0)
//!     .state("on", 1)
//!     .edge(EdgeDef::new("off", "on", "switch_on"))
//!     .build();
//!
//! let machine = registry.register::<Lamp>(definition)?;
//! assert_eq!(machine.field(), "power");
//! assert!(registry.get::<Lamp>("power").is_some());
//! # Ok::<(), statefield::schema::ConfigError>(())
//! ```

use crate::host::Host;
use crate::runtime::MachineSpec;
use crate::schema::{compile, ConfigError, Definition};
use parking_lot::RwLock;
use std::any::{type_name, TypeId};
use std::sync::Arc;
use tracing::info;

struct Entry {
    host: TypeId,
    machine: Arc<MachineSpec>,
}

/// Registry of compiled machines.
#[derive(Default)]
pub struct Registry {
    /// Registration order is kept so `machines` lists a type's machines in
    /// the order they were declared.
    entries: RwLock<Vec<Entry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `definition` for host type `H` and store it.
    ///
    /// On any error the registry is left unchanged.
    pub fn register<H: Host + 'static>(&self, definition: Definition) -> Result<Arc<MachineSpec>, ConfigError> {
        let host = TypeId::of::<H>();
        let mut entries = self.entries.write();

        let mut interface = H::interface();
        if entries
            .iter()
            .any(|entry| entry.host == host && entry.machine.field() == definition.field())
        {
            return Err(ConfigError::DuplicateMachine {
                type_name: interface.type_name().to_string(),
                field: definition.field().to_string(),
            });
        }

        for entry in entries.iter().filter(|entry| entry.host == host) {
            for operation in entry.machine.generated_operations() {
                interface.add_operation(operation, Vec::new());
            }
            for operation in entry.machine.generated_type_operations() {
                interface.add_type_operation(operation);
            }
        }

        let machine = Arc::new(compile(definition, &interface)?);
        info!(
            host = type_name::<H>(),
            field = machine.field(),
            "Registered state machine"
        );

        entries.push(Entry {
            host,
            machine: Arc::clone(&machine),
        });
        Ok(machine)
    }

    /// The machine governing `field` on host type `H`.
    pub fn get<H: 'static>(&self, field: &str) -> Option<Arc<MachineSpec>> {
        let host = TypeId::of::<H>();
        self.entries
            .read()
            .iter()
            .find(|entry| entry.host == host && entry.machine.field() == field)
            .map(|entry| Arc::clone(&entry.machine))
    }

    /// Every machine registered for host type `H`, in registration order.
    pub fn machines<H: 'static>(&self) -> Vec<Arc<MachineSpec>> {
        let host = TypeId::of::<H>();
        self.entries
            .read()
            .iter()
            .filter(|entry| entry.host == host)
            .map(|entry| Arc::clone(&entry.machine))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
