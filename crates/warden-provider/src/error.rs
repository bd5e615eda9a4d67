//! Provider error contract.
//!
//! Every remote call resolves to a data payload or to a
//! [`ProviderError`]. Errors are never retried; the operator-facing
//! message is the provider-supplied one when present and a generic
//! fallback otherwise.

use thiserror::Error;

/// Fallback shown to operators when the service reports no message.
pub const GENERIC_FAILURE: &str = "Something went wrong.";

/// Errors produced by a provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The service answered with an error payload.
    #[error("provider returned {status}: {}", .message.as_deref().unwrap_or(GENERIC_FAILURE))]
    Api {
        /// HTTP status of the response.
        status: u16,
        /// Machine-readable error code, when the service sent one.
        code: Option<String>,
        /// Human-readable message, when the service sent one.
        message: Option<String>,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Creates an API error from response parts.
    #[must_use]
    pub fn api(status: u16, code: Option<String>, message: Option<String>) -> Self {
        Self::Api {
            status,
            code,
            message,
        }
    }

    /// A 404 for a missing user.
    #[must_use]
    pub fn user_not_found(id: &str) -> Self {
        Self::api(
            404,
            Some("USER_NOT_FOUND".to_string()),
            Some(format!("User {id} was not found.")),
        )
    }

    /// A 409 for a value that already exists.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::api(409, Some("CONFLICT".to_string()), Some(message.into()))
    }

    /// A 401 for a missing or invalid session.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::api(
            401,
            Some("UNAUTHORIZED".to_string()),
            Some("Invalid or expired session.".to_string()),
        )
    }

    /// A 400 for a request the service rejected.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::api(400, Some("INVALID_REQUEST".to_string()), Some(message.into()))
    }

    /// The message to show an operator: the provider-supplied one when
    /// present, the generic fallback otherwise. Transport and decode
    /// details stay in the logs.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } if !message.is_empty() => message,
            _ => GENERIC_FAILURE,
        }
    }

    /// HTTP status of the remote response, when one arrived.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }

    /// Whether the remote response was a 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status >= 400 && *status < 500)
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
