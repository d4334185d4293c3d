//! Repurpose API handler

use super::service::{RepurposeOutcome, RepurposeRequest, RepurposeService};
use crate::api::identity::caller_identity;
use crate::api::models::{error_response, ApiFailure, ApiResponse};
use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct RepurposeState {
    pub service: Arc<RepurposeService>,
}

/// Generate platform variants of the submitted content
///
/// POST /api/v1/repurpose
pub async fn repurpose(
    State(state): State<RepurposeState>,
    headers: HeaderMap,
    Json(request): Json<RepurposeRequest>,
) -> Result<Json<ApiResponse<RepurposeOutcome>>, ApiFailure> {
    let identity = caller_identity(&headers)?;

    let outcome = state
        .service
        .repurpose(&identity.user_id, request)
        .await
        .map_err(error_response)?;

    info!(
        "Repurpose complete: user={}, platforms={}, chars={}",
        identity.user_id, outcome.metadata.platforms_processed, outcome.metadata.total_characters
    );

    Ok(Json(ApiResponse::ok(outcome)))
}
