pub mod health;

use axum::{
    http::HeaderMap,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::handlers as generation_handlers;
use crate::profile::handlers as profile_handlers;
use crate::registry::handlers as registry_handlers;
use crate::state::AppState;

/// Header carrying the caller's applicant identity.
pub const APPLICANT_ID_HEADER: &str = "x-applicant-id";

/// Extracts the applicant identity from `x-applicant-id`.
/// Missing, non-UTF-8 and non-UUID values are all rejected the same way.
pub fn applicant_id(headers: &HeaderMap) -> Result<Uuid, AppError> {
    headers
        .get(APPLICANT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or(AppError::Unauthorized)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // ES generation API
        .route(
            "/api/v1/es/generate",
            post(generation_handlers::handle_generate),
        )
        // Applicant profile API
        .route(
            "/api/v1/profile",
            get(profile_handlers::handle_get_profile)
                .post(profile_handlers::handle_create_profile)
                .patch(profile_handlers::handle_update_profile),
        )
        // Company registry API
        .route(
            "/api/v1/companies",
            get(registry_handlers::handle_search_companies),
        )
        .with_state(state)
}
