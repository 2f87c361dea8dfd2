//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    /// Failure already reported to the user (or suppressed by `--quiet`).
    #[error("exit with status {0}")]
    Exit(i32),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::from(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Exit(code) => *code,
            CliError::Infra(e) if e.is_config() => crate::exitcode::CONFIG,
            CliError::Infra(_) => crate::exitcode::FAILURE,
        }
    }

    /// Whether `main` still has to print this error.
    pub fn is_reported(&self) -> bool {
        matches!(self, CliError::Exit(_))
    }
}
