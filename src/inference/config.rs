//! Configuration for the upstream chat-completion provider

use super::models::ModelTier;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upstream model identifiers per routing tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCatalog {
    #[serde(default = "default_fast_text")]
    pub fast_text: String,

    #[serde(default = "default_powerful_text")]
    pub powerful_text: String,

    #[serde(default = "default_vision_single")]
    pub vision_single: String,

    #[serde(default = "default_vision_multimodal")]
    pub vision_multimodal: String,
}

fn default_fast_text() -> String { "llama-3.1-8b-instant".to_string() }
fn default_powerful_text() -> String { "llama-3.3-70b-versatile".to_string() }
fn default_vision_single() -> String { "meta-llama/llama-4-scout-17b-16e-instruct".to_string() }
fn default_vision_multimodal() -> String { "meta-llama/llama-4-maverick-17b-128e-instruct".to_string() }

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            fast_text: default_fast_text(),
            powerful_text: default_powerful_text(),
            vision_single: default_vision_single(),
            vision_multimodal: default_vision_multimodal(),
        }
    }
}

impl ModelCatalog {
    /// Resolve the upstream model id for a tier
    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::FastText => &self.fast_text,
            ModelTier::PowerfulText => &self.powerful_text,
            ModelTier::VisionSingle => &self.vision_single,
            ModelTier::VisionMultimodal => &self.vision_multimodal,
        }
    }
}

/// Upstream provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// OpenAI-compatible API base (without the `/chat/completions` suffix)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (read from env GROQ_API_KEY if not set)
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Optional client-side request timeout in milliseconds. Unset means the
    /// client never times out on its own.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    #[serde(default)]
    pub models: ModelCatalog,
}

fn default_base_url() -> String { "https://api.groq.com/openai/v1".to_string() }

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_ms: None,
            models: ModelCatalog::default(),
        }
    }
}

impl UpstreamConfig {
    /// Apply the flat environment variables on top of the current values
    pub fn from_env(mut self) -> Self {
        if let Ok(val) = std::env::var("GROQ_API_KEY") {
            if !val.is_empty() {
                self.api_key = Some(SecretString::new(val));
            }
        }

        if let Ok(val) = std::env::var("UPSTREAM_BASE_URL") {
            self.base_url = val;
        }

        if let Ok(val) = std::env::var("UPSTREAM_TIMEOUT_MS") {
            if let Ok(timeout) = val.parse() {
                self.timeout_ms = Some(timeout);
            }
        }

        if let Ok(val) = std::env::var("MODEL_FAST_TEXT") {
            self.models.fast_text = val;
        }

        if let Ok(val) = std::env::var("MODEL_POWERFUL_TEXT") {
            self.models.powerful_text = val;
        }

        if let Ok(val) = std::env::var("MODEL_VISION_SINGLE") {
            self.models.vision_single = val;
        }

        if let Ok(val) = std::env::var("MODEL_VISION_MULTIMODAL") {
            self.models.vision_multimodal = val;
        }

        self
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Full chat-completions endpoint URL
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
