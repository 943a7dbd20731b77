//! Axum route handlers for the ES generation API.

use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::generation::orchestrator::{GenerationRequest, QuestionAnswerPair};
use crate::routes::applicant_id;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub answers: Vec<QuestionAnswerPair>,
}

/// POST /api/v1/es/generate
///
/// Full generation pipeline: question extraction (skipped when the request
/// carries preset questions) → company research → profile lookup →
/// concurrent per-question generation. Answers come back in question order.
pub async fn handle_generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let applicant_id = applicant_id(&headers)?;

    let answers = state.generator.generate(applicant_id, request).await?;

    Ok(Json(GenerateResponse { answers }))
}
