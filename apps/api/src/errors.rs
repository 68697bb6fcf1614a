use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::fetcher::{ContentFetchError, FetchFailure};
use crate::analysis::schema::SchemaMismatchError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Content fetch error: {0}")]
    ContentFetch(ContentFetchError),

    #[error("Model invocation error: {0}")]
    ModelInvocation(LlmError),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(#[from] SchemaMismatchError),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::ContentFetch(_) | AppError::ModelInvocation(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::SchemaMismatch(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            // nginx's "client closed request"; sent when shutdown interrupts an analysis.
            AppError::Cancelled => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST)
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::ContentFetch(_) => "CONTENT_FETCH_ERROR",
            AppError::ModelInvocation(_) => "MODEL_INVOCATION_ERROR",
            AppError::SchemaMismatch(_) => "SCHEMA_MISMATCH",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::Cancelled => "CANCELLED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Timeouts from the HTTP clients map to `Timeout`, same as the orchestrator's own limit.
impl From<ContentFetchError> for AppError {
    fn from(error: ContentFetchError) -> Self {
        match &error.failure {
            FetchFailure::Timeout(limit) => AppError::Timeout(format!(
                "content fetch for {} exceeded {}s",
                error.url,
                limit.as_secs()
            )),
            FetchFailure::Http(e) if e.is_timeout() => {
                AppError::Timeout(format!("content fetch for {} timed out", error.url))
            }
            _ => AppError::ContentFetch(error),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(error: LlmError) -> Self {
        match error {
            LlmError::Timeout => AppError::Timeout("model call timed out".to_string()),
            other => AppError::ModelInvocation(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (message, detail) = match &self {
            AppError::Validation(msg) | AppError::NotFound(msg) => (msg.clone(), msg.clone()),
            AppError::ContentFetch(e) => {
                tracing::error!("Content fetch error: {e}");
                (
                    format!("Could not fetch content from {}", e.url),
                    e.failure.to_string(),
                )
            }
            AppError::ModelInvocation(e) => {
                tracing::error!("Model invocation error: {e}");
                ("AI response failed".to_string(), e.to_string())
            }
            AppError::SchemaMismatch(e) => {
                tracing::error!("Schema mismatch: {e}");
                (
                    "The AI response did not match the expected format".to_string(),
                    e.to_string(),
                )
            }
            AppError::Timeout(msg) => {
                tracing::error!("Timeout: {msg}");
                ("The analysis took too long".to_string(), msg.clone())
            }
            AppError::Cancelled => (
                "The request was cancelled".to_string(),
                "cancelled".to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    "An internal server error occurred".to_string(),
                    "internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "message": message,
            "error": {
                "code": self.code(),
                "detail": detail
            }
        }));

        (self.status(), body).into_response()
    }
}
