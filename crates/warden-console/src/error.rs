//! Console API error types.
//!
//! Maps validation failures, missing sessions, and provider errors to
//! HTTP responses with a stable error code and an operator-facing
//! message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use warden_provider::{ProviderError, GENERIC_FAILURE};

/// Errors that can occur in the console API.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The request failed client-side validation.
    #[error("{0}")]
    Validation(String),

    /// No valid operator session accompanied the request.
    #[error("Authentication required.")]
    Unauthorized,

    /// The operator lacks the required role.
    #[error("{0}")]
    Forbidden(String),

    /// The remote identity service rejected or failed the call.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Internal console fault.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConsoleError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns the HTTP status code for this error.
    ///
    /// Provider errors keep the remote status when it was a client
    /// error; everything else from the provider surfaces as a bad
    /// gateway.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Provider(err) => err
                .status()
                .filter(|_| err.is_client_error())
                .and_then(|status| StatusCode::from_u16(status).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::Provider(_) => "provider_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// The message shown to the operator.
    #[must_use]
    pub fn operator_message(&self) -> &str {
        match self {
            Self::Validation(message) | Self::Forbidden(message) => message,
            Self::Unauthorized => "Authentication required.",
            Self::Provider(err) => err.message(),
            Self::Internal(_) => GENERIC_FAILURE,
        }
    }
}

/// API error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error: String,
    /// Operator-facing message.
    pub message: String,
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(error = %self, code = self.error_code(), "console request failed");
        } else {
            tracing::debug!(error = %self, code = self.error_code(), "console request rejected");
        }
        let body = ErrorResponse {
            error: self.error_code().to_string(),
            message: self.operator_message().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for console operations.
pub type ConsoleResult<T> = Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_is_bad_request() {
        let err = ConsoleError::validation("Passwords do not match.");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "validation_error");
        assert_eq!(err.operator_message(), "Passwords do not match.");
    }

    #[test]
    fn provider_client_error_keeps_status_and_message() {
        let err = ConsoleError::from(ProviderError::api(
            409,
            None,
            Some("User already exists.".to_string()),
        ));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.operator_message(), "User already exists.");
    }

    #[test]
    fn provider_server_error_becomes_bad_gateway_with_fallback() {
        let err = ConsoleError::from(ProviderError::api(500, None, None));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.operator_message(), GENERIC_FAILURE);
    }

    #[test]
    fn transport_error_becomes_bad_gateway() {
        let err = ConsoleError::from(ProviderError::Transport("refused".to_string()));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.operator_message(), GENERIC_FAILURE);
    }

    #[test]
    fn internal_detail_stays_out_of_the_message() {
        let err = ConsoleError::Internal("poisoned lock".to_string());
        assert_eq!(err.operator_message(), GENERIC_FAILURE);
    }
}
