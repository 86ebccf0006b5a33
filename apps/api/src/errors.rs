use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::blobs::BlobError;
use crate::comparison::selector::SelectionError;
use crate::llm_client::LlmError;
use crate::pipeline::engine::PipelineError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Blob error: {0}")]
    Blob(#[from] BlobError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Pipeline(e @ PipelineError::PermissionDenied { .. }) => {
                (StatusCode::FORBIDDEN, "PERMISSION_DENIED", e.to_string())
            }
            AppError::Pipeline(e @ PipelineError::IndexOutOfRange { .. }) => {
                (StatusCode::NOT_FOUND, "INDEX_OUT_OF_RANGE", e.to_string())
            }
            AppError::Selection(e @ SelectionError::IncompatiblePair) => {
                (StatusCode::CONFLICT, "INCOMPATIBLE_PAIR", e.to_string())
            }
            AppError::Selection(e @ SelectionError::SelectionFull) => {
                (StatusCode::CONFLICT, "SELECTION_FULL", e.to_string())
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Blob(BlobError::NotFound(path)) => (
                StatusCode::NOT_FOUND,
                "BLOB_NOT_FOUND",
                format!("Stored file {path} not found"),
            ),
            AppError::Blob(e) => {
                tracing::error!("Blob error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "BLOB_ERROR",
                    "A file storage error occurred".to_string(),
                )
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
