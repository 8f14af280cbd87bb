use std::fmt;

use discovery_core::RunError;
use thiserror::Error;

/// Failure of a single backend call. No retries happen at the client layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: FailureKind,
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedResponse, message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    MalformedResponse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "request timed out"),
            FailureKind::Network => write!(f, "transport failure"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
        }
    }
}

impl From<ClientError> for RunError {
    fn from(err: ClientError) -> Self {
        match err.kind {
            FailureKind::MalformedResponse => RunError::MalformedResponse(err.message),
            _ => RunError::Network(err.to_string()),
        }
    }
}
