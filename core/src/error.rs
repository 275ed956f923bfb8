//! Error types for the task board client.
//!
//! # Design
//! `Rejected` carries the human-readable `error` the service put in its reply
//! body; that is the only message ever shown to the user verbatim. Every other
//! variant is reported with the calling operation's generic fallback text, and
//! keeps its details for the log.

use thiserror::Error;

/// Errors produced while building, executing, or parsing API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed (connection refused, DNS, reset, ...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The service answered with `success: false` or a non-2xx status and an
    /// explanatory `error` field.
    #[error("rejected by server (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The service returned 404 without an explanation.
    #[error("resource not found")]
    NotFound,

    /// Any other non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be decoded into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be encoded as a form body.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    /// Text to show the user: the server's own message when it sent one,
    /// otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Rejected { message, .. } => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Client-side form validation failure. Blocks submission before any request
/// is built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: &'static str,
}

impl ValidationError {
    pub(crate) const fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// A wire name that does not match any `Priority` or `Status` variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {kind}: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_uses_server_message() {
        let err = ApiError::Rejected {
            status: 400,
            message: "User with this name already exists".to_string(),
        };
        assert_eq!(err.user_message("Error registering user"), "User with this name already exists");
    }

    #[test]
    fn other_errors_fall_back() {
        let err = ApiError::Transport("connection refused".to_string());
        assert_eq!(err.user_message("Error adding task"), "Error adding task");
        assert_eq!(ApiError::NotFound.user_message("Error deleting task"), "Error deleting task");
    }
}
