//! Shared API response and error bodies

use crate::error::Error;
use crate::inference::InferenceError;
use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Success envelope used by the profile and repurpose endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// API error details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Standard error codes
pub mod error_codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const UNKNOWN_PLATFORM: &str = "UNKNOWN_PLATFORM";
    pub const RATE_LIMIT: &str = "RATE_LIMIT";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

pub type ApiFailure = (StatusCode, Json<ApiError>);

/// Map a crate error to a status and body.
///
/// Rate limits keep their `retryAfter` hint in `details`; other upstream
/// failures become 502.
pub fn error_response(e: Error) -> ApiFailure {
    let (status, code) = match &e {
        Error::Validation(_) => (StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR),
        Error::UnknownPlatform(_) => (StatusCode::BAD_REQUEST, error_codes::UNKNOWN_PLATFORM),
        Error::Inference(InferenceError::Validation(_)) => {
            (StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR)
        }
        Error::Inference(InferenceError::RateLimited { retry_after, message }) => {
            let body = ApiError::new(error_codes::RATE_LIMIT, message.clone())
                .with_details(serde_json::json!({ "retryAfter": retry_after }));
            return (StatusCode::TOO_MANY_REQUESTS, Json(body));
        }
        Error::Inference(InferenceError::Timeout(_)) => {
            (StatusCode::GATEWAY_TIMEOUT, error_codes::TIMEOUT)
        }
        Error::Inference(_) => (StatusCode::BAD_GATEWAY, error_codes::UPSTREAM_ERROR),
        Error::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, error_codes::STORAGE_ERROR),
        Error::Configuration(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR)
        }
    };

    if status.is_server_error() {
        error!("Request failed: {}", e);
    }

    (status, Json(ApiError::new(code, e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_is_400() {
        let (status, Json(body)) = error_response(Error::Validation("bad".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, error_codes::VALIDATION_ERROR);
    }

    #[test]
    fn test_rate_limit_keeps_retry_after() {
        let (status, Json(body)) = error_response(Error::Inference(InferenceError::RateLimited {
            retry_after: Some(9),
            message: "slow down".to_string(),
        }));
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body.details.unwrap()["retryAfter"], 9);
    }

    #[test]
    fn test_upstream_is_502() {
        let (status, _) = error_response(Error::Inference(InferenceError::Upstream {
            status: 500,
            message: "boom".to_string(),
        }));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_envelope_omits_missing_message() {
        let value = serde_json::to_value(ApiResponse::ok(1)).unwrap();
        assert_eq!(value["success"], true);
        assert!(value.get("message").is_none());
    }
}
