//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, RepoCloner, etc.)
//! but are themselves concrete structs, not traits.

mod init;
mod taxonomy;

pub use init::{InitOptions, InitOutcome, InitService};
pub use taxonomy::TaxonomyService;
