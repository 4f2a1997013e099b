//! Error types for Papero Core

use thiserror::Error;

/// Result type alias using PaperoError
pub type Result<T> = std::result::Result<T, PaperoError>;

/// Top-level error type for all Papero operations
#[derive(Debug, Error)]
pub enum PaperoError {
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Save error: {0}")]
    Save(#[from] SaveError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised by a [`ReadingService`](crate::service::ReadingService)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Network or reachability failure
    #[error("{0}")]
    Transport(String),

    /// The service answered with a non-success status
    #[error("rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The response body could not be understood
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Whether the service was reached at all
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// The service's message when it refused the request itself (4xx)
    pub fn refusal(&self) -> Option<&str> {
        match self {
            Self::Rejected { status, message } if (400..500).contains(status) => Some(message),
            _ => None,
        }
    }
}

/// A progress write that did not reach durable remote state
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SaveError {
    /// The service refused the write
    #[error("write rejected: {0}")]
    Rejected(String),

    /// The service could not be reached or answered unintelligibly
    #[error("service unreachable: {0}")]
    Unreachable(String),
}

impl From<ServiceError> for SaveError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Rejected { status, message } => {
                Self::Rejected(format!("{} ({})", message, status))
            }
            ServiceError::Transport(detail) | ServiceError::Decode(detail) => {
                Self::Unreachable(detail)
            }
        }
    }
}

/// Errors surfaced by the reading session controller
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The operation is not valid in the controller's current state
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error(transparent)]
    Save(#[from] SaveError),
}
