//! Axum route handlers for the company search API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::company::CompanyBasicInfo;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CompanySearchQuery {
    pub keyword: String,
}

/// GET /api/v1/companies?keyword=…
///
/// Proxies a corporate registry search, returning id/name pairs the client
/// feeds back into the generation request.
pub async fn handle_search_companies(
    State(state): State<AppState>,
    Query(query): Query<CompanySearchQuery>,
) -> Result<Json<Vec<CompanyBasicInfo>>, AppError> {
    if query.keyword.trim().is_empty() {
        return Err(AppError::Validation("keyword is required".to_string()));
    }

    let companies = state.registry.search_companies(&query.keyword).await?;

    Ok(Json(companies))
}
