use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::generation::orchestrator::GenerateError;
use crate::registry::RegistryError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Generation timeout: {0}")]
    GenerationTimeout(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIGURATION_ERROR",
                    "The service is missing required configuration".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Generation(msg) => {
                tracing::error!("Generation error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATION_FAILED",
                    msg.clone(),
                )
            }
            AppError::GenerationTimeout(msg) => (
                StatusCode::GATEWAY_TIMEOUT,
                "GENERATION_TIMEOUT",
                msg.clone(),
            ),
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "An upstream service error occurred".to_string(),
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

impl From<GenerateError> for AppError {
    fn from(e: GenerateError) -> Self {
        match e {
            GenerateError::Validation(msg) => AppError::Validation(msg),
            GenerateError::Configuration(msg) => AppError::Configuration(msg),
            GenerateError::ExtractionFailed(msg) => AppError::Llm(msg),
            GenerateError::NoQuestionsFound => {
                AppError::UnprocessableEntity(GenerateError::NoQuestionsFound.to_string())
            }
            e @ GenerateError::QuestionTimeout { .. } => {
                AppError::GenerationTimeout(e.to_string())
            }
            e @ GenerateError::DeadlineExceeded { .. } => {
                AppError::GenerationTimeout(e.to_string())
            }
            e @ GenerateError::QuestionFailed { .. } => AppError::Generation(e.to_string()),
            e @ GenerateError::NoAnswersGenerated => AppError::Generation(e.to_string()),
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::MissingApiKey => AppError::Configuration(e.to_string()),
            RegistryError::Http(_) | RegistryError::Api { .. } => AppError::Upstream(e.to_string()),
        }
    }
}
