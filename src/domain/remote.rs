//! Requests, responses and errors exchanged with the remote release service.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    NotFound,
    AlreadyExists,
    InvalidArgument,
    FailedPrecondition,
    Unavailable,
    Internal,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteErrorKind::NotFound => "NotFound",
            RemoteErrorKind::AlreadyExists => "AlreadyExists",
            RemoteErrorKind::InvalidArgument => "InvalidArgument",
            RemoteErrorKind::FailedPrecondition => "FailedPrecondition",
            RemoteErrorKind::Unavailable => "Unavailable",
            RemoteErrorKind::Internal => "Internal",
            RemoteErrorKind::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Failure of a remote operation, still carrying its transport framing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("rpc error: code = {kind} desc = {description}")]
pub struct RemoteCallError {
    pub kind: RemoteErrorKind,
    /// Human-readable description supplied by the remote side
    pub description: String,
}

impl RemoteCallError {
    pub fn new(kind: RemoteErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    pub fn unavailable(description: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Unavailable, description)
    }
}

/// One named operation for the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRequest {
    pub operation: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub flags: BTreeMap<String, String>,
}

impl RemoteRequest {
    pub fn new(operation: &str, args: Vec<String>, flags: BTreeMap<String, String>) -> Self {
        Self {
            operation: operation.to_string(),
            args,
            flags,
        }
    }
}

/// Reply to a `RemoteRequest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemoteResponse {
    Ok {
        #[serde(default)]
        body: String,
    },
    Error {
        code: RemoteErrorKind,
        description: String,
    },
}

impl RemoteResponse {
    pub fn into_result(self) -> Result<String, RemoteCallError> {
        match self {
            RemoteResponse::Ok { body } => Ok(body),
            RemoteResponse::Error { code, description } => {
                Err(RemoteCallError::new(code, description))
            }
        }
    }
}
