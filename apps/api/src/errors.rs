use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::extract::ExtractError;
use crate::gateway::GatewayError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    /// The completion capability answered, but not with conformant data.
    /// `raw` is the untouched upstream text, kept for diagnosis.
    #[error("Invalid model output: {message}")]
    InvalidModelOutput { message: String, raw: String },

    #[error("Upstream call exceeded {0:?}")]
    UpstreamTimeout(Duration),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A read or write against the gateway failed. When the failure happens after
    /// generation, `payload` carries the generated content so only the save is retried.
    #[error("Persistence failure: {message}")]
    PersistenceFailure {
        message: String,
        payload: Option<Value>,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Machine-readable error kind, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::MissingInput(_) => "MISSING_INPUT",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            AppError::CorruptDocument(_) => "CORRUPT_DOCUMENT",
            AppError::InvalidModelOutput { .. } => "INVALID_MODEL_OUTPUT",
            AppError::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::PersistenceFailure { .. } => "PERSISTENCE_FAILURE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingInput(_)
            | AppError::UnsupportedFormat(_)
            | AppError::CorruptDocument(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidModelOutput { .. } | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PersistenceFailure { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Attaches already-generated content to a persistence failure.
    pub fn with_payload(self, generated: Value) -> Self {
        match self {
            AppError::PersistenceFailure { message, .. } => AppError::PersistenceFailure {
                message,
                payload: Some(generated),
            },
            other => other,
        }
    }
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::UnsupportedFormat(msg) => AppError::UnsupportedFormat(msg),
            ExtractError::CorruptDocument(msg) => AppError::CorruptDocument(msg),
            ExtractError::Fetch(msg) => AppError::Upstream(msg),
            ExtractError::InvalidUrl(msg) => AppError::MissingInput(format!("invalid url: {msg}")),
            too_large @ ExtractError::TooLarge { .. } => {
                AppError::UnsupportedFormat(too_large.to_string())
            }
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        // Full detail stays in the log; the message body never carries driver text.
        tracing::error!("Gateway error: {e}");
        AppError::PersistenceFailure {
            message: "A storage operation failed".to_string(),
            payload: None,
        }
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        tracing::error!("Completion error: {e}");
        match e {
            LlmError::Api { status, .. } => {
                AppError::Upstream(format!("completion API returned status {status}"))
            }
            LlmError::Http(_) => AppError::Upstream("completion API unreachable".to_string()),
            LlmError::Parse(_) => {
                AppError::Upstream("completion API returned a malformed envelope".to_string())
            }
            LlmError::RateLimited { retries } => {
                AppError::Upstream(format!("completion API rate limited after {retries} retries"))
            }
            LlmError::EmptyContent => AppError::InvalidModelOutput {
                message: "completion returned no content".to_string(),
                raw: String::new(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.kind();

        let mut error = json!({ "code": code });
        let message = match &self {
            AppError::Unauthorized => "Authentication required".to_string(),
            AppError::InvalidModelOutput { message, raw } => {
                tracing::error!("Invalid model output: {message}");
                error["raw"] = Value::String(raw.clone());
                message.clone()
            }
            AppError::PersistenceFailure { message, payload } => {
                if let Some(payload) = payload {
                    error["payload"] = payload.clone();
                }
                message.clone()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
            AppError::MissingInput(msg)
            | AppError::NotFound(msg)
            | AppError::UnsupportedFormat(msg)
            | AppError::CorruptDocument(msg)
            | AppError::Upstream(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::UpstreamTimeout(limit) => {
                format!("The AI service did not respond within {}s", limit.as_secs())
            }
        };
        error["message"] = Value::String(message);

        (status, Json(json!({ "error": error }))).into_response()
    }
}
