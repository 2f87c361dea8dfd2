//! Infrastructure layer: I/O implementations and DI container
//!
//! This layer implements I/O boundary traits, the git adapters, and wires
//! up services.

pub mod di;
pub mod error;
pub mod git;
pub mod traits;

pub use error::InfraError;
