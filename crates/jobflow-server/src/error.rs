//! Error types for the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use jobflow_engine::EngineError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Malformed request outside the engine's own validation.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body over the configured size limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Engine error.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Error code for programmatic handling.
    pub code: String,
}

impl ServerError {
    /// HTTP status and stable error code.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ServerError::PayloadTooLarge(_) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large")
            }
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ServerError::Engine(e) => match e {
                EngineError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
                EngineError::StepNotFound { .. } => (StatusCode::NOT_FOUND, "step_not_found"),
                EngineError::NoDropdownConfigured { .. } => {
                    (StatusCode::BAD_REQUEST, "no_dropdown_configured")
                }
                EngineError::NoRoutineConfigured { .. } => {
                    (StatusCode::BAD_REQUEST, "no_routine_configured")
                }
                EngineError::JobNotFound(_) => (StatusCode::NOT_FOUND, "job_not_found"),
                EngineError::Invocation { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "invocation_error")
                }
                EngineError::NoResult { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "no_result"),
                EngineError::RoutineReported(_) => (StatusCode::BAD_REQUEST, "routine_error"),
                EngineError::JobStart(_) => (StatusCode::UNPROCESSABLE_ENTITY, "job_start_failed"),
                EngineError::LogWrite(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "log_write_failed")
                }
                EngineError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
                EngineError::Store(_) => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"),
                EngineError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            },
        }
    }
}

impl ServerError {
    /// Whether the client may resend the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServerError::Engine(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let retryable = self.is_retryable();
        let message = self.to_string();

        if status.is_server_error() && !retryable {
            tracing::error!(status = %status, code, error = %message, "Server error");
        } else if status.is_server_error() {
            tracing::warn!(
                status = %status,
                code,
                retryable,
                error = %message,
                "Transient server error"
            );
        } else {
            tracing::warn!(status = %status, code, error = %message, "Client error");
        }

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
