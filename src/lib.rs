//! Statefield: declarative state machines over a stored field
//!
//! A machine is declared once per host type and field: the named states and
//! the integer codes stored for them, the permitted edges, the actions that
//! perform those edges, events that pick among several edges, and the
//! parameters carried into hooks. The declaration is checked up front against
//! what the host type exposes; a machine that compiles can no longer collide
//! with host operations or call a hook that does not exist.
//!
//! # Core Concepts
//!
//! - **Definition**: the raw declaration, built in code or loaded from JSON/YAML
//! - **MachineSpec**: the compiled, immutable machine
//! - **Registry**: compiled machines per host type and field
//! - **Record**: a host instance plus the storage of its fields
//!
//! # Example
//!
//! ```rust
//! use statefield::arguments;
//! use statefield::core::Arguments;
//! use statefield::host::Host;
//! use statefield::memory::MemoryStore;
//! use statefield::registry::Registry;
//! use statefield::runtime::HookError;
//! use statefield::schema::{Definition, EdgeDef, HostInterface};
//!
//! #[derive(Default)]
//! struct Order {
//!     shipped_with: Option<String>,
//! }
//!
//! impl Host for Order {
//!     fn interface() -> HostInterface {
//!         HostInterface::new("Order").operation("on_ship", &["carrier"])
//!     }
//!
//!     fn invoke(&mut self, hook: &str, args: &Arguments) -> Result<(), HookError> {
//!         if hook == "on_ship" {
//!             self.shipped_with = args.get("carrier").map(|c| c.to_string());
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let registry = Registry::new();
//! let machine = registry.register::<Order>(
//!     Definition::builder("status")
//!         .state("pending", 0)
//!         .state("shipped", 1)
//!         .parameter("carrier", "carrier", statefield::core::Check::any())
//!         .edge(EdgeDef::new("pending", "shipped", "ship").on().parameters(["carrier"]))
//!         .build(),
//! )?;
//!
//! let store = MemoryStore::new();
//! let id = store.insert([("status", 0)]);
//! let mut order = store.open(id, Order::default()).unwrap();
//!
//! machine.attempt(&mut order, "ship", arguments! { carrier: "post" })?;
//!
//! assert_eq!(machine.current_state(&order), Some("shipped"));
//! assert!(!machine.can_perform(&order, "ship")?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod core;
pub mod host;
pub mod memory;
pub mod registry;
pub mod runtime;
pub mod schema;

// Re-export commonly used types
pub use core::{Arguments, Check, StateCode, SymbolTable};
pub use host::{Host, Record, TransitionReport};
pub use registry::Registry;
pub use runtime::{MachineError, MachineSpec};
pub use schema::{ConfigError, Definition, EdgeDef, HostInterface};
