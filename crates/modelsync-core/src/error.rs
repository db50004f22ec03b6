//! Error handling
//!
//! Typed errors for the transport boundary, payload parsing and validation,
//! with retry classification and recovery suggestions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised at the transport boundary
#[derive(Error, Debug)]
pub enum TransportError {
    /// Request could not be sent or the connection failed
    #[error("Request to '{location}' failed: {source}")]
    Http {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("Server returned {status} for '{location}'")]
    Status { location: String, status: u16 },

    /// Nothing exists at the location
    #[error("Resource not found: '{location}'")]
    NotFound { location: String },

    /// Local I/O failure (directory transport)
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Response body is not valid JSON
    #[error("Malformed payload from '{location}': {details}")]
    Malformed { location: String, details: String },

    /// Location cannot be mapped onto the transport
    #[error("Invalid location '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },

    /// Transport was taken offline
    #[error("Transport is offline, cannot reach '{location}'")]
    Offline { location: String },
}

impl TransportError {
    /// Create an error from an I/O error with path context
    pub fn from_io(error: io::Error, path: PathBuf, location: &str) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => TransportError::NotFound {
                location: location.to_string(),
            },
            _ => TransportError::Io {
                path,
                source: error,
            },
        }
    }

    /// Check if repeating the request might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Http { source, .. } => source.is_timeout() || source.is_connect(),
            TransportError::Status { status, .. } => *status >= 500 || *status == 429,
            TransportError::Offline { .. } => true,
            _ => false,
        }
    }
}

/// Payload does not have the shape a kind's `parse` expects
#[derive(Error, Debug)]
pub enum ParseError {
    /// Attributes must come from a JSON object
    #[error("Expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    /// Envelope field is absent
    #[error("Payload has no '{field}' field")]
    MissingField { field: String },

    /// Attributes do not fit a typed record
    #[error("Attributes do not match record: {0}")]
    Record(#[from] serde_json::Error),
}

/// A candidate attribute set was rejected by the kind's validation policy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct ValidationError {
    pub reason: String,
}

impl ValidationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors returned by `fetch` and `save`
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to parse payload: {0}")]
    Parse(#[from] ParseError),

    #[error("Validation failed: {0}")]
    Invalid(#[from] ValidationError),
}

impl SyncError {
    /// Check if the caller may retry the operation unchanged
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Validation reason, if this is a validation failure
    pub fn validation_reason(&self) -> Option<&str> {
        match self {
            SyncError::Invalid(e) => Some(&e.reason),
            _ => None,
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            SyncError::Transport(TransportError::Http { .. })
            | SyncError::Transport(TransportError::Offline { .. }) => {
                Some("Check that the server is running and base_url is correct, then retry.")
            }
            SyncError::Transport(TransportError::NotFound { .. }) => {
                Some("Check the location, or save the model first to create it.")
            }
            SyncError::Transport(TransportError::Status { .. }) => {
                Some("The server rejected the request. Retry later if it is a 5xx status.")
            }
            SyncError::Parse(_) | SyncError::Transport(TransportError::Malformed { .. }) => {
                Some("The payload does not match the model kind. Check the envelope field.")
            }
            SyncError::Invalid(_) => Some("Fix the attributes named in the message and retry."),
            _ => None,
        }
    }
}

/// Result type for fetch and save
pub type SyncResult<T> = Result<T, SyncError>;
