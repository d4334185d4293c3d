//! Router assembly for all API surfaces

use crate::inference::{self, InferenceRouter, InferenceState};
use crate::metrics::METRICS;
use crate::profile::{handlers as profile_handlers, ProfileService, ProfileState};
use crate::repurpose::{handlers as repurpose_handlers, RepurposeService, RepurposeState};
use axum::{
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Shared services behind every route
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<InferenceRouter>,
    pub profiles: Arc<ProfileService>,
    pub max_body_bytes: usize,
}

/// Build inference API routes
pub fn build_inference_routes(state: InferenceState, max_body_bytes: usize) -> Router {
    Router::new()
        .route(
            "/api/v1/ai/process",
            post(inference::process).get(inference::process_info),
        )
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Build style profile API routes
pub fn build_profile_routes(state: ProfileState, max_body_bytes: usize) -> Router {
    Router::new()
        .route(
            "/api/v1/profile",
            get(profile_handlers::get_profile).put(profile_handlers::update_profile),
        )
        .route("/api/v1/profile/feedback", post(profile_handlers::submit_feedback))
        .route(
            "/api/v1/profile/analyze-style",
            post(profile_handlers::analyze_style),
        )
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Build repurpose API routes
pub fn build_repurpose_routes(state: RepurposeState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/api/v1/repurpose", post(repurpose_handlers::repurpose))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn metrics() -> String {
    METRICS.export_prometheus()
}

/// Build the complete application router
pub fn build_router(state: AppState) -> Router {
    let inference_state = InferenceState {
        router: state.router.clone(),
    };
    let profile_state = ProfileState {
        profiles: state.profiles.clone(),
        router: state.router.clone(),
    };
    let repurpose_state = RepurposeState {
        service: Arc::new(RepurposeService::new(
            state.router.clone(),
            state.profiles.clone(),
        )),
    };

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .merge(build_inference_routes(inference_state, state.max_body_bytes))
        .merge(build_profile_routes(profile_state, state.max_body_bytes))
        .merge(build_repurpose_routes(repurpose_state, state.max_body_bytes))
}
