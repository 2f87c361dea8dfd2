//! Infrastructure-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;

/// Infrastructure errors wrap application errors.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),
}

impl InfraError {
    /// True when the underlying cause is a configuration problem.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Application(ApplicationError::Config { .. }))
    }
}
