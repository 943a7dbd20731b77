//! Axum route handlers for the Profile API.
//!
//! All routes are keyed by the `x-applicant-id` header set by the
//! authenticating proxy in front of this service.

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};

use crate::errors::AppError;
use crate::models::profile::{ApplicantProfile, ProfileRow};
use crate::routes::applicant_id;
use crate::state::AppState;

/// GET /api/v1/profile
///
/// Returns the caller's stored profile.
pub async fn handle_get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProfileRow>, AppError> {
    let applicant_id = applicant_id(&headers)?;

    let row = state
        .profiles
        .get_by_applicant(applicant_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound(format!("No profile for applicant {applicant_id}")))?;

    Ok(Json(row))
}

/// POST /api/v1/profile
///
/// Creates the caller's profile. Conflicts when one already exists.
pub async fn handle_create_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ApplicantProfile>,
) -> Result<(StatusCode, Json<ProfileRow>), AppError> {
    let applicant_id = applicant_id(&headers)?;

    let row = state
        .profiles
        .create(applicant_id, &body)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| {
            AppError::Conflict("A profile already exists for this applicant".to_string())
        })?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// PATCH /api/v1/profile
///
/// Replaces all four profile fields.
pub async fn handle_update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ApplicantProfile>,
) -> Result<Json<ProfileRow>, AppError> {
    let applicant_id = applicant_id(&headers)?;

    let row = state
        .profiles
        .update(applicant_id, &body)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound(format!("No profile for applicant {applicant_id}")))?;

    Ok(Json(row))
}
