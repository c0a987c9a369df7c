//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{DomainError, RemoteCallError, RemoteErrorKind};

/// Failures while establishing the channel to the remote service.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("could not get kubernetes config for context '{context}': {message}")]
    ConfigUnavailable { context: String, message: String },

    #[error("could not create tunnel to the remote service in namespace '{namespace}': {message}")]
    TunnelFailed { namespace: String, message: String },

    #[error("invalid TLS configuration: {}: {message}", .path.display())]
    TlsConfigInvalid { path: PathBuf, message: String },
}

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Connection(#[from] ConnectionError),

    /// Untranslated remote failure, transport framing included
    #[error("{0}")]
    Remote(#[from] RemoteCallError),

    /// Remote failure reduced to the remote-supplied description
    #[error("{message}")]
    Release {
        kind: RemoteErrorKind,
        message: String,
    },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
