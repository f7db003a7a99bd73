use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error as ThisError;

use super::IsRetryable;

#[derive(Debug, ThisError)]
pub enum LaunchpadError {
    /// Caller input failed validation.
    #[error("Invalid request ({code}): {message}")]
    Validation { code: &'static str, message: String },

    /// A unique constraint rejected the write.
    #[error("Conflict ({code}): {message}")]
    Conflict { code: &'static str, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("Forbidden ({code}): {message}")]
    Forbidden { code: &'static str, message: String },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Rate limit exceeded")]
    RateLimited,

    /// An optional integration has no credentials configured.
    #[error("Integration disabled: {0}")]
    Disabled(&'static str),

    #[error("Upstream error with status: {0}")]
    UpstreamStatus(StatusCode),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Stream protocol error: {0}")]
    StreamProtocolError(String),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl LaunchpadError {
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        LaunchpadError::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn already_registered() -> Self {
        LaunchpadError::Conflict {
            code: "ALREADY_REGISTERED",
            message: "This email is already registered.".to_string(),
        }
    }
}

/// True when `err` is a unique-constraint violation reported by the database.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

impl From<JsonRejection> for LaunchpadError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(rejection = %rejection, "Request body rejected");
        match rejection {
            JsonRejection::JsonSyntaxError(_) => {
                LaunchpadError::validation("INVALID_JSON", "invalid JSON")
            }
            JsonRejection::BytesRejection(e) => {
                LaunchpadError::UnexpectedError(format!("Failed to read request body: {e}"))
            }
            other => LaunchpadError::validation("INVALID_REQUEST", other.body_text()),
        }
    }
}

impl From<QueryRejection> for LaunchpadError {
    fn from(rejection: QueryRejection) -> Self {
        LaunchpadError::validation("INVALID_QUERY", rejection.body_text())
    }
}

impl IntoResponse for LaunchpadError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            LaunchpadError::Validation { code, message } => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject::new(code, message),
            ),

            LaunchpadError::Conflict { code, message } => {
                (StatusCode::CONFLICT, ApiErrorObject::new(code, message))
            }

            LaunchpadError::Unauthorized(reason) => (
                StatusCode::UNAUTHORIZED,
                ApiErrorObject::new("UNAUTHORIZED", reason),
            ),

            LaunchpadError::Forbidden { code, message } => {
                (StatusCode::FORBIDDEN, ApiErrorObject::new(code, message))
            }

            LaunchpadError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ApiErrorObject::new("NOT_FOUND", format!("{what} not found.")),
            ),

            LaunchpadError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                ApiErrorObject::new("RATE_LIMITED", "Too many requests, slow down."),
            ),

            LaunchpadError::Disabled(what) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiErrorObject::new("DISABLED", format!("{what} is not configured.")),
            ),

            LaunchpadError::DatabaseError(ref e) => {
                tracing::error!(error = %e, "Database error");
                internal_error()
            }

            LaunchpadError::RactorError(ref e) | LaunchpadError::UnexpectedError(ref e) => {
                tracing::error!(error = %e, "Internal error");
                internal_error()
            }

            LaunchpadError::JsonError(_) => (
                StatusCode::BAD_GATEWAY,
                ApiErrorObject::new("BAD_UPSTREAM_PAYLOAD", "Failed to parse upstream response."),
            ),

            LaunchpadError::StreamProtocolError(_) | LaunchpadError::ReqwestError(_) => (
                StatusCode::BAD_GATEWAY,
                ApiErrorObject::new("UPSTREAM_ERROR", "Upstream service error."),
            ),

            LaunchpadError::UpstreamStatus(code) => {
                let (err_code, msg) = match code {
                    StatusCode::TOO_MANY_REQUESTS => {
                        ("RATE_LIMIT", "Upstream rate limit exceeded.")
                    }
                    StatusCode::UNAUTHORIZED => ("UNAUTHORIZED", "Upstream authentication failed."),
                    StatusCode::FORBIDDEN => ("FORBIDDEN", "Upstream permission denied."),
                    _ => ("UPSTREAM_ERROR", "An upstream error occurred."),
                };
                (StatusCode::BAD_GATEWAY, ApiErrorObject::new(err_code, msg))
            }
        };
        (status, Json(ApiErrorBody { inner: error_body })).into_response()
    }
}

fn internal_error() -> (StatusCode, ApiErrorObject) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ApiErrorObject::new("INTERNAL_ERROR", "An internal server error occurred."),
    )
}

/// Standardized API error response payload.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiErrorObject {
    fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}

impl IsRetryable for LaunchpadError {
    fn is_retryable(&self) -> bool {
        match self {
            LaunchpadError::ReqwestError(e) => e.is_connect() || e.is_timeout(),
            LaunchpadError::UpstreamStatus(status) => status.is_server_error(),
            _ => false,
        }
    }
}
