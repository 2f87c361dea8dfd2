//! `ilab`: initialize an InstructLab environment and validate taxonomy repositories.
//!
//! Layering follows the dependency direction
//! `cli` → `infrastructure` → `application` → `domain`.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
