//! Profile API handlers

use super::analysis::{
    apply_analysis, build_analysis_prompt, parse_analysis, StyleAnalysis, ANALYST_SYSTEM_PROMPT,
};
use super::engine::{calculate_completion, record_feedback, update_completion, FeedbackInput};
use super::models::{ProfileUpdate, StyleProfile};
use super::store::ProfileService;
use crate::api::identity::caller_identity;
use crate::api::models::{error_codes, error_response, ApiError, ApiFailure, ApiResponse};
use crate::error::Error;
use crate::inference::{InferenceRequest, InferenceRouter};
use crate::metrics::METRICS;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Profile API state
#[derive(Clone)]
pub struct ProfileState {
    pub profiles: Arc<ProfileService>,
    pub router: Arc<InferenceRouter>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub profile: StyleProfile,
    pub profile_completion: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_completed: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackData {
    pub feedback_recorded: bool,
    pub style_consistency_score: u8,
    pub total_feedbacks: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeStyleRequest {
    #[serde(default)]
    pub sample_posts: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeStyleData {
    pub analysis: StyleAnalysis,
    pub profile: StyleProfile,
    pub profile_completion: u8,
    pub recommendations: Vec<String>,
}

/// Fetch the caller's profile, creating it on first access
///
/// GET /api/v1/profile
pub async fn get_profile(
    State(state): State<ProfileState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<ProfileData>>, ApiFailure> {
    let identity = caller_identity(&headers)?;
    info!("Profile fetch: user={}", identity.user_id);

    let profile = state
        .profiles
        .get_or_create(&identity)
        .await
        .map_err(error_response)?;
    let profile_completion = calculate_completion(&profile);

    Ok(Json(ApiResponse::ok(ProfileData {
        profile,
        profile_completion,
        onboarding_completed: None,
    })))
}

/// Apply a field-level profile patch
///
/// PUT /api/v1/profile
pub async fn update_profile(
    State(state): State<ProfileState>,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ApiResponse<ProfileData>>, ApiFailure> {
    let identity = caller_identity(&headers)?;
    info!("Profile update: user={}", identity.user_id);

    let (profile, profile_completion) = state
        .profiles
        .update(&identity, "update", |profile| {
            update.apply_to(profile);
            Ok(update_completion(profile))
        })
        .await
        .map_err(error_response)?;

    let onboarding_completed = Some(profile.onboarding_completed);
    Ok(Json(
        ApiResponse::ok(ProfileData {
            profile,
            profile_completion,
            onboarding_completed,
        })
        .with_message("Profile updated successfully"),
    ))
}

/// Record a rating (and optional edit) of generated content
///
/// POST /api/v1/profile/feedback
pub async fn submit_feedback(
    State(state): State<ProfileState>,
    headers: HeaderMap,
    Json(input): Json<FeedbackInput>,
) -> Result<Json<ApiResponse<FeedbackData>>, ApiFailure> {
    let identity = caller_identity(&headers)?;
    info!(
        "Feedback: user={}, satisfaction={}, edited={}",
        identity.user_id,
        input.satisfaction,
        input.user_edit.is_some()
    );

    let platform_label = input.platform.map(|p| p.as_str()).unwrap_or("none");

    let (profile, ()) = state
        .profiles
        .update(&identity, "feedback", |profile| record_feedback(profile, input))
        .await
        .map_err(error_response)?;

    METRICS.record_feedback(platform_label);

    Ok(Json(
        ApiResponse::ok(FeedbackData {
            feedback_recorded: true,
            style_consistency_score: profile.preferences.style_consistency_score,
            total_feedbacks: profile.preferences.feedback.len(),
        })
        .with_message("Feedback recorded successfully"),
    ))
}

/// Derive writing style from sample posts via the model
///
/// POST /api/v1/profile/analyze-style
pub async fn analyze_style(
    State(state): State<ProfileState>,
    headers: HeaderMap,
    Json(request): Json<AnalyzeStyleRequest>,
) -> Result<Json<ApiResponse<AnalyzeStyleData>>, ApiFailure> {
    let identity = caller_identity(&headers)?;
    info!(
        "Style analysis: user={}, posts={}",
        identity.user_id,
        request.sample_posts.len()
    );

    let posts: Vec<String> = request
        .sample_posts
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect();

    if posts.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                error_codes::VALIDATION_ERROR,
                "Sample posts are required for analysis",
            )),
        ));
    }

    let inference =
        InferenceRequest::new(build_analysis_prompt(&posts)).with_text(ANALYST_SYSTEM_PROMPT);
    let result = state
        .router
        .process(inference)
        .await
        .map_err(|e| error_response(Error::from(e)))?;

    let analysis = parse_analysis(&result.content).map_err(error_response)?;

    let (profile, profile_completion) = state
        .profiles
        .update(&identity, "analyze", |profile| {
            Ok(apply_analysis(profile, posts, &analysis))
        })
        .await
        .map_err(error_response)?;

    let recommendations = analysis.recommended_improvements.clone().unwrap_or_default();
    Ok(Json(
        ApiResponse::ok(AnalyzeStyleData {
            analysis,
            profile,
            profile_completion,
            recommendations,
        })
        .with_message("Style analysis completed successfully"),
    ))
}
