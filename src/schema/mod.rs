//! Schema: machine definitions and their compilation.
//!
//! A [`Definition`] is the raw, unchecked description of a machine, built
//! with [`DefinitionBuilder`] or loaded from JSON/YAML. [`compile`] checks it
//! against the host's [`HostInterface`] and produces a
//! [`MachineSpec`](crate::runtime::MachineSpec), or the first
//! [`ConfigError`] found.

mod definition;
mod error;
mod interface;
mod parse;
mod validator;

pub use definition::{Callbacks, Definition, DefinitionBuilder, EdgeDef, ParameterDef};
pub use error::ConfigError;
pub use interface::HostInterface;
pub use parse::CheckSet;
pub use validator::compile;
