//! Chat-completion provider abstraction and the Groq (OpenAI-compatible) client

use super::config::UpstreamConfig;
use super::models::{ChatCompletionRequest, ChatCompletionResponse, RateLimitSnapshot};
use super::stream::{fragment_stream, FragmentStream};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use tracing::{debug, warn};

const HEADER_LIMIT_REQUESTS: &str = "x-ratelimit-limit-requests";
const HEADER_LIMIT_TOKENS: &str = "x-ratelimit-limit-tokens";
const HEADER_REMAINING_REQUESTS: &str = "x-ratelimit-remaining-requests";
const HEADER_REMAINING_TOKENS: &str = "x-ratelimit-remaining-tokens";
const HEADER_RESET_REQUESTS: &str = "x-ratelimit-reset-requests";
const HEADER_RESET_TOKENS: &str = "x-ratelimit-reset-tokens";
const HEADER_RETRY_AFTER: &str = "retry-after";

/// Inference error types
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Rate limit exceeded: {message}")]
    RateLimited {
        retry_after: Option<u64>,
        message: String,
    },

    #[error("Upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl InferenceError {
    /// Seconds the upstream asked us to wait, if this is a quota rejection
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else {
            Self::RequestFailed(e.to_string())
        }
    }
}

/// Completion body plus the quota headers that came with it
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub completion: ChatCompletionResponse,
    pub rate_limits: RateLimitSnapshot,
}

/// Upstream chat-completion endpoint
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Run a non-streaming completion
    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ProviderResponse, InferenceError>;

    /// Start a streaming completion and return its content fragments
    async fn stream_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<FragmentStream, InferenceError>;
}

/// Groq chat-completion client
pub struct GroqProvider {
    http: Client,
    config: UpstreamConfig,
    completions_url: String,
}

impl GroqProvider {
    /// Create a new provider client
    pub fn new(config: UpstreamConfig) -> Result<Self, InferenceError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| InferenceError::RequestFailed(e.to_string()))?;

        let completions_url = config.completions_url();

        Ok(Self {
            http,
            config,
            completions_url,
        })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    /// Send the request and turn non-success statuses into typed errors
    async fn send(&self, request: &ChatCompletionRequest) -> Result<reqwest::Response, InferenceError> {
        debug!(
            "Calling upstream: model={}, messages={}, stream={}",
            request.model,
            request.messages.len(),
            request.stream
        );

        let mut req = self.http.post(&self.completions_url).json(request);

        if let Some(api_key) = &self.config.api_key {
            req = req.bearer_auth(api_key.expose_secret());
        }

        let response = req.send().await.map_err(InferenceError::from_transport)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            warn!("Upstream rate limit hit: retry_after={:?}", retry_after);
            return Err(InferenceError::RateLimited {
                retry_after,
                message: rate_limit_message(retry_after, &body),
            });
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(InferenceError::Upstream {
                status: status.as_u16(),
                message: upstream_message(&body),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatProvider for GroqProvider {
    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ProviderResponse, InferenceError> {
        let response = self.send(request).await?;
        let rate_limits = extract_rate_limits(response.headers());

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        Ok(ProviderResponse {
            completion,
            rate_limits,
        })
    }

    async fn stream_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<FragmentStream, InferenceError> {
        let response = self.send(request).await?;
        Ok(fragment_stream(response.bytes_stream()))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn header_u64(headers: &HeaderMap, name: &str) -> u64 {
    header_str(headers, name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    header_str(headers, HEADER_RETRY_AFTER).and_then(|v| v.trim().parse().ok())
}

/// Read the upstream quota headers. Missing or unparsable counts read as 0,
/// missing reset values as the empty string.
pub fn extract_rate_limits(headers: &HeaderMap) -> RateLimitSnapshot {
    RateLimitSnapshot {
        limit_requests: header_u64(headers, HEADER_LIMIT_REQUESTS),
        remaining_requests: header_u64(headers, HEADER_REMAINING_REQUESTS),
        limit_tokens: header_u64(headers, HEADER_LIMIT_TOKENS),
        remaining_tokens: header_u64(headers, HEADER_REMAINING_TOKENS),
        reset_requests: header_str(headers, HEADER_RESET_REQUESTS)
            .unwrap_or_default()
            .to_string(),
        reset_tokens: header_str(headers, HEADER_RESET_TOKENS)
            .unwrap_or_default()
            .to_string(),
        retry_after: parse_retry_after(headers),
    }
}

/// Pull `error.message` out of an OpenAI-style error body, else use the raw text
fn upstream_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str());

    match message {
        Some(message) => message.to_string(),
        None if body.trim().is_empty() => "Unknown error".to_string(),
        None => body.trim().to_string(),
    }
}

fn rate_limit_message(retry_after: Option<u64>, body: &str) -> String {
    let detail = upstream_message(body);
    match retry_after {
        Some(secs) => format!("{} (retry after {} seconds)", detail, secs),
        None => detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_extract_rate_limits_full() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_LIMIT_REQUESTS, HeaderValue::from_static("14400"));
        headers.insert(HEADER_REMAINING_REQUESTS, HeaderValue::from_static("14399"));
        headers.insert(HEADER_LIMIT_TOKENS, HeaderValue::from_static("6000"));
        headers.insert(HEADER_REMAINING_TOKENS, HeaderValue::from_static("5870"));
        headers.insert(HEADER_RESET_REQUESTS, HeaderValue::from_static("6s"));
        headers.insert(HEADER_RESET_TOKENS, HeaderValue::from_static("1.3s"));

        let limits = extract_rate_limits(&headers);
        assert_eq!(limits.limit_requests, 14400);
        assert_eq!(limits.remaining_requests, 14399);
        assert_eq!(limits.limit_tokens, 6000);
        assert_eq!(limits.remaining_tokens, 5870);
        assert_eq!(limits.reset_requests, "6s");
        assert_eq!(limits.reset_tokens, "1.3s");
        assert_eq!(limits.retry_after, None);
    }

    #[test]
    fn test_extract_rate_limits_missing_headers() {
        let limits = extract_rate_limits(&HeaderMap::new());
        assert_eq!(limits, RateLimitSnapshot::default());
    }

    #[test]
    fn test_extract_rate_limits_garbage_counts() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_LIMIT_TOKENS, HeaderValue::from_static("lots"));
        headers.insert(HEADER_RETRY_AFTER, HeaderValue::from_static("7"));

        let limits = extract_rate_limits(&headers);
        assert_eq!(limits.limit_tokens, 0);
        assert_eq!(limits.retry_after, Some(7));
    }

    #[test]
    fn test_upstream_message_from_error_body() {
        let body = r#"{"error":{"message":"model not found","type":"invalid_request_error"}}"#;
        assert_eq!(upstream_message(body), "model not found");
        assert_eq!(upstream_message("bad gateway"), "bad gateway");
        assert_eq!(upstream_message(""), "Unknown error");
    }

    #[test]
    fn test_rate_limit_message_mentions_retry() {
        let message = rate_limit_message(Some(30), r#"{"error":{"message":"TPM exceeded"}}"#);
        assert_eq!(message, "TPM exceeded (retry after 30 seconds)");
    }

    #[test]
    fn test_retry_after_accessor() {
        let err = InferenceError::RateLimited {
            retry_after: Some(3),
            message: String::new(),
        };
        assert_eq!(err.retry_after(), Some(3));
        assert_eq!(InferenceError::Timeout("t".to_string()).retry_after(), None);
    }

    #[test]
    fn test_provider_creation() {
        let provider = GroqProvider::new(UpstreamConfig::default());
        assert!(provider.is_ok());
    }
}
