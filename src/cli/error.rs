//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::{ApplicationError, ConnectionError};
use crate::domain::{DomainError, RemoteErrorKind};
use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),

    /// Chart toolkit commands are declared but not carried by this client
    #[error("'helm {command}' needs the chart toolkit, which is not part of this client")]
    Unsupported { command: String },
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl From<ConnectionError> for CliError {
    fn from(e: ConnectionError) -> Self {
        ApplicationError::from(e).into()
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        ApplicationError::from(e).into()
    }
}

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => exitcode::USAGE,
            CliError::Unsupported { .. } => exitcode::FAILURE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => exitcode::IOERR,
                InfraError::PluginExit { code, .. } => *code,
                InfraError::Application(e) => application_exit_code(e),
            },
        }
    }
}

fn application_exit_code(e: &ApplicationError) -> i32 {
    match e {
        ApplicationError::Connection(ConnectionError::TlsConfigInvalid { .. }) => {
            exitcode::TLS_CONFIG
        }
        ApplicationError::Connection(_) => exitcode::UNAVAILABLE,
        ApplicationError::Remote(e) => remote_exit_code(e.kind),
        ApplicationError::Release { kind, .. } => remote_exit_code(*kind),
        ApplicationError::Domain(DomainError::ArgumentCount { .. }) => exitcode::USAGE,
        ApplicationError::Domain(_) => exitcode::DATAERR,
        ApplicationError::OperationFailed { .. } => exitcode::IOERR,
    }
}

fn remote_exit_code(kind: RemoteErrorKind) -> i32 {
    match kind {
        RemoteErrorKind::Unavailable => exitcode::UNAVAILABLE,
        _ => exitcode::FAILURE,
    }
}
