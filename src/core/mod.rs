//! Core value types shared by the schema and the runtime.
//!
//! This module contains the small, pure building blocks of a machine:
//! - The symbol table mapping state names to stored codes
//! - Parameter checks
//! - Keyword argument bags
//!
//! Nothing in here touches a record or invokes a hook.

mod arguments;
mod check;
#[macro_use]
mod macros;
mod symbols;

pub use arguments::Arguments;
pub use check::Check;
pub use symbols::{StateCode, SymbolError, SymbolTable};

/// Whether `name` is a plain identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
