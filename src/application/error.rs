//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{DomainError, ValidationReport};
use crate::infrastructure::git::GitError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Git(#[from] GitError),

    #[error("failed to clone {repository}: {source}")]
    Clone {
        repository: String,
        #[source]
        source: GitError,
    },

    #[error("taxonomy path not found: {0}")]
    TaxonomyNotFound(PathBuf),

    /// Validation finished and at least one file carries errors.
    #[error("{message}")]
    InvalidTaxonomy {
        message: String,
        report: Box<ValidationReport>,
    },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
