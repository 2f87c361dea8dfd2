//! Domain layer: taxonomy entities, schema and lint rules
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod lint;
pub mod schema;

pub use entities::*;
pub use error::DomainError;
pub use lint::LintRules;
