//! Error types for the call-control layer
//!
//! Protocol no-ops (an ACCEPT for an unknown SID, a TERMINATE without a
//! reason, ...) are not errors and never show up here; the dispatcher reports
//! them as [`crate::phone::Transition::Ignored`]. What remains are failures an
//! application caller or the `on_error` hook has to react to.

use thiserror::Error;

use crate::types::{CallState, SessionId};

/// Result type for call-control operations
pub type Result<T> = std::result::Result<T, CallError>;

/// Errors that can occur in the call-control layer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallError {
    /// The signaling gateway could not deliver an outbound message
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// A session is already registered under this SID
    #[error("Session already registered: {sid}")]
    DuplicateSession { sid: SessionId },

    /// No live session is registered under this SID
    #[error("Session not found: {sid}")]
    SessionNotFound { sid: SessionId },

    /// The operation is not valid for the session's current state
    #[error("Cannot {operation} session {sid} in state {state:?}")]
    InvalidState {
        sid: SessionId,
        state: CallState,
        operation: &'static str,
    },

    /// A set-once identity field of a call session was bound twice
    #[error("Call session {field} is already bound")]
    AlreadyBound { field: &'static str },

    /// A call session failed to produce or consume media data
    #[error("Media error: {message}")]
    Media { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The inbound event stream was already taken or has closed
    #[error("Signaling dispatcher is not running")]
    DispatcherStopped,

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CallError {
    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a media error
    pub fn media(message: impl Into<String>) -> Self {
        Self::Media {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn session_not_found(sid: &SessionId) -> Self {
        Self::SessionNotFound { sid: sid.clone() }
    }

    /// Whether this error originated in the signaling transport
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<toml::de::Error> for CallError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CallError::transport("connection reset");
        assert_eq!(err.to_string(), "Transport error: connection reset");

        let err = CallError::InvalidState {
            sid: SessionId::from("s1"),
            state: CallState::PendingOut,
            operation: "answer",
        };
        assert_eq!(err.to_string(), "Cannot answer session s1 in state PendingOut");
    }

    #[test]
    fn test_transport_classification() {
        assert!(CallError::transport("down").is_transport());
        assert!(!CallError::media("no codec").is_transport());
        assert!(!CallError::session_not_found(&SessionId::from("x")).is_transport());
    }
}
