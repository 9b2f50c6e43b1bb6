//! Error types for the toonctx domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant; codec errors live
//! next to the codec in `toonctx-codec`.

use thiserror::Error;

/// The top-level error type for toonctx operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Host collaborator errors ---
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by the host runtime's collaborators.
///
/// Assemblers never let these escape: they are logged and turned into an
/// empty, error-flagged provider result.
#[derive(Debug, Clone, Error)]
pub enum HostError {
    #[error("Record store error: {0}")]
    Store(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Action validation failed for {action}: {reason}")]
    Validation { action: String, reason: String },

    #[error("Room not found: {0}")]
    RoomNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_error_displays_correctly() {
        let err = Error::Host(HostError::Embedding("empty input text".into()));
        assert!(err.to_string().contains("Embedding"));
        assert!(err.to_string().contains("empty input text"));
    }

    #[test]
    fn validation_error_names_action() {
        let err = HostError::Validation {
            action: "SEND_MESSAGE".into(),
            reason: "no target room".into(),
        };
        assert!(err.to_string().contains("SEND_MESSAGE"));
        assert!(err.to_string().contains("no target room"));
    }
}
