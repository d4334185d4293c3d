//! Inference API handlers

use super::models::{InferenceMetadata, InferenceRequest, RateLimitSnapshot};
use super::provider::InferenceError;
use super::router::InferenceRouter;
use super::stream::FragmentStream;
use crate::metrics::METRICS;
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{error, info, warn};

const STREAM_DONE: &str = "[DONE]";
const GENERIC_FAILURE: &str = "An error occurred while processing your request";

/// Inference API state
#[derive(Clone)]
pub struct InferenceState {
    pub router: Arc<InferenceRouter>,
}

/// Body of POST /api/v1/ai/process
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub content: InferenceRequest,
    #[serde(default)]
    pub options: ProcessOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessOptions {
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    pub data: ProcessData,
    pub rate_limits: RateLimitEnvelope,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessData {
    pub content: String,
    pub metadata: InferenceMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaWindow {
    pub limit: u64,
    pub remaining: u64,
    pub reset: String,
}

/// Client-facing rate-limit block, grouped by quota window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitEnvelope {
    pub requests: QuotaWindow,
    pub tokens: QuotaWindow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl From<RateLimitSnapshot> for RateLimitEnvelope {
    fn from(snapshot: RateLimitSnapshot) -> Self {
        Self {
            requests: QuotaWindow {
                limit: snapshot.limit_requests,
                remaining: snapshot.remaining_requests,
                reset: snapshot.reset_requests,
            },
            tokens: QuotaWindow {
                limit: snapshot.limit_tokens,
                remaining: snapshot.remaining_tokens,
                reset: snapshot.reset_tokens,
            },
            retry_after: snapshot.retry_after,
        }
    }
}

/// Error body of the process endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ProcessError {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
            kind: None,
            retry_after: None,
        }
    }
}

/// Map a router failure to a status and body; 429 stays distinguishable
fn map_inference_error(e: InferenceError) -> (StatusCode, Json<ProcessError>) {
    match e {
        InferenceError::Validation(message) => (
            StatusCode::BAD_REQUEST,
            Json(ProcessError::new(format!("Invalid request: {}", message))),
        ),
        InferenceError::RateLimited {
            retry_after,
            message,
        } => {
            warn!("Inference rate limited: retry_after={:?}", retry_after);
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ProcessError {
                    error: "Rate limit exceeded".to_string(),
                    message: Some(message),
                    kind: Some("rate_limit_error".to_string()),
                    retry_after,
                }),
            )
        }
        other => {
            error!("AI processing error: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ProcessError {
                    message: Some(GENERIC_FAILURE.to_string()),
                    ..ProcessError::new("Internal server error")
                }),
            )
        }
    }
}

/// Run a text, image or multimodal request
///
/// POST /api/v1/ai/process
pub async fn process(
    State(state): State<InferenceState>,
    Json(request): Json<ProcessRequest>,
) -> Result<Response, (StatusCode, Json<ProcessError>)> {
    info!(
        "AI process request: images={}, has_text={}, stream={}",
        request.content.images.len(),
        request.content.text.is_some(),
        request.options.stream
    );

    if request.content.prompt.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ProcessError::new("Missing required field: content.prompt")),
        ));
    }

    if request.options.stream {
        let fragments = state
            .router
            .stream_process(request.content)
            .await
            .map_err(map_inference_error)?;

        return Ok(Sse::new(sse_events(fragments))
            .keep_alive(KeepAlive::default())
            .into_response());
    }

    let result = state
        .router
        .process(request.content)
        .await
        .map_err(map_inference_error)?;

    Ok(Json(ProcessResponse {
        success: true,
        data: ProcessData {
            content: result.content,
            metadata: result.metadata,
        },
        rate_limits: result.rate_limits.into(),
    })
    .into_response())
}

/// Forward fragments as `{"content": ...}` events, then the `[DONE]` marker.
///
/// An upstream failure mid-stream ends the response without `[DONE]` so the
/// client can tell a truncated stream from a complete one.
fn sse_events(fragments: FragmentStream) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(Some(fragments), |state| async move {
        let mut fragments = state?;
        match fragments.next().await {
            Some(Ok(fragment)) => {
                METRICS.record_stream_fragment();
                let data = serde_json::json!({ "content": fragment }).to_string();
                Some((Ok(Event::default().data(data)), Some(fragments)))
            }
            Some(Err(e)) => {
                error!("Stream aborted: {}", e);
                None
            }
            None => Some((Ok(Event::default().data(STREAM_DONE)), None)),
        }
    })
}

/// Describe the endpoint and the configured model catalog
///
/// GET /api/v1/ai/process
pub async fn process_info(State(state): State<InferenceState>) -> Json<serde_json::Value> {
    let models = state.router.models();
    Json(serde_json::json!({
        "message": "AI Processing API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": { "POST": "/api/v1/ai/process" },
        "supportedTypes": ["text", "image", "multimodal"],
        "models": {
            "text": {
                "fast": models.fast_text,
                "powerful": models.powerful_text,
            },
            "vision": {
                "single": models.vision_single,
                "multimodal": models.vision_multimodal,
            },
        },
    }))
}
