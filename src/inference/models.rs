//! Data models for inference routing

use super::InferenceError;
use serde::{Deserialize, Serialize};

/// Inline images are always sent to the upstream as JPEG data URIs
const BASE64_IMAGE_PREFIX: &str = "data:image/jpeg;base64,";

/// Image attached to an inference request
///
/// Exactly one of `url` or `base64` is expected. When both are present the
/// URL wins; when neither is present (or both are empty) the entry
/// contributes nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ImageInput {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn from_base64(payload: impl Into<String>) -> Self {
        Self {
            base64: Some(payload.into()),
            ..Default::default()
        }
    }

    /// Resolve where the image bytes come from; empty strings count as absent
    pub fn source(&self) -> Option<ImageSource<'_>> {
        let url = self.url.as_deref().filter(|u| !u.is_empty());
        let base64 = self.base64.as_deref().filter(|b| !b.is_empty());
        match (url, base64) {
            (Some(url), _) => Some(ImageSource::Url(url)),
            (None, Some(payload)) => Some(ImageSource::Base64(payload)),
            (None, None) => None,
        }
    }
}

/// Resolved image location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource<'a> {
    Url(&'a str),
    Base64(&'a str),
}

impl ImageSource<'_> {
    /// URL as sent to the upstream (`data:` URI for inline payloads)
    pub fn to_upstream_url(self) -> String {
        match self {
            Self::Url(url) => url.to_string(),
            Self::Base64(payload) => format!("{}{}", BASE64_IMAGE_PREFIX, payload),
        }
    }
}

/// Heterogeneous inference input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferenceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageInput>,
    #[serde(default)]
    pub prompt: String,
    /// Opaque caller context, kept for audit/logging only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Map<String, serde_json::Value>>,
}

impl InferenceRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.images.push(image);
        self
    }

    pub fn with_context(mut self, context: serde_json::Map<String, serde_json::Value>) -> Self {
        self.context = Some(context);
        self
    }
}

/// Shape of a validated request, decided once at the boundary
#[derive(Debug, Clone, PartialEq)]
pub enum InputShape {
    TextOnly {
        prompt: String,
        text: Option<String>,
    },
    ImageOnly {
        prompt: String,
        images: Vec<ImageInput>,
    },
    Multimodal {
        prompt: String,
        text: String,
        images: Vec<ImageInput>,
    },
}

impl InputShape {
    /// Validate and classify a request.
    ///
    /// Images count as present when the list is non-empty, even if some
    /// entries are malformed. Text counts as present only when non-empty.
    pub fn classify(request: InferenceRequest) -> Result<Self, InferenceError> {
        if request.prompt.trim().is_empty() {
            return Err(InferenceError::Validation(
                "prompt cannot be empty".to_string(),
            ));
        }

        let text = request.text.filter(|t| !t.is_empty());
        let prompt = request.prompt;

        Ok(match (request.images.is_empty(), text) {
            (false, Some(text)) => Self::Multimodal {
                prompt,
                text,
                images: request.images,
            },
            (false, None) => Self::ImageOnly {
                prompt,
                images: request.images,
            },
            (true, text) => Self::TextOnly { prompt, text },
        })
    }

    pub fn prompt(&self) -> &str {
        match self {
            Self::TextOnly { prompt, .. }
            | Self::ImageOnly { prompt, .. }
            | Self::Multimodal { prompt, .. } => prompt,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::TextOnly { .. } => "text",
            Self::ImageOnly { .. } => "image",
            Self::Multimodal { .. } => "multimodal",
        }
    }
}

/// Routing tier, mapped to a concrete model id by the model catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    FastText,
    PowerfulText,
    VisionSingle,
    VisionMultimodal,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FastText => "fast_text",
            Self::PowerfulText => "powerful_text",
            Self::VisionSingle => "vision_single",
            Self::VisionMultimodal => "vision_multimodal",
        }
    }
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Image reference inside a content part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One part of a multi-part user message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// Message content: a plain string or an ordered list of parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user_text(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }
}

// OpenAI-compatible API types
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<UpstreamUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Quota figures reported by the upstream on each response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitSnapshot {
    pub limit_requests: u64,
    pub remaining_requests: u64,
    pub limit_tokens: u64,
    pub remaining_tokens: u64,
    pub reset_requests: String,
    pub reset_tokens: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: u64,
    pub completion: u64,
    pub total: u64,
}

impl From<UpstreamUsage> for TokenUsage {
    fn from(usage: UpstreamUsage) -> Self {
        Self {
            prompt: usage.prompt_tokens,
            completion: usage.completion_tokens,
            total: usage.total_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceMetadata {
    pub model: String,
    pub processing_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
}

/// Normalized result of a non-streaming inference call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceResult {
    pub content: String,
    pub rate_limits: RateLimitSnapshot,
    pub metadata: InferenceMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_source_prefers_url() {
        let image = ImageInput {
            url: Some("https://cdn.example.com/a.png".to_string()),
            base64: Some("AAAA".to_string()),
            description: None,
        };
        assert_eq!(image.source(), Some(ImageSource::Url("https://cdn.example.com/a.png")));
    }

    #[test]
    fn test_image_source_base64_data_uri() {
        let image = ImageInput::from_base64("iVBORw0KGgo");
        let source = image.source().unwrap();
        assert_eq!(source.to_upstream_url(), "data:image/jpeg;base64,iVBORw0KGgo");
    }

    #[test]
    fn test_image_source_missing() {
        let image = ImageInput {
            description: Some("a cat".to_string()),
            ..Default::default()
        };
        assert!(image.source().is_none());
    }

    #[test]
    fn test_classify_rejects_blank_prompt() {
        let result = InputShape::classify(InferenceRequest::new("   "));
        assert!(matches!(result, Err(InferenceError::Validation(_))));
    }

    #[test]
    fn test_classify_empty_text_is_absent() {
        let request = InferenceRequest::new("Describe").with_text("");
        let shape = InputShape::classify(request).unwrap();
        assert_eq!(
            shape,
            InputShape::TextOnly {
                prompt: "Describe".to_string(),
                text: None,
            }
        );
    }

    #[test]
    fn test_classify_malformed_images_still_count() {
        let request = InferenceRequest::new("Describe").with_image(ImageInput::default());
        let shape = InputShape::classify(request).unwrap();
        assert_eq!(shape.kind(), "image");
    }

    #[test]
    fn test_classify_multimodal() {
        let request = InferenceRequest::new("Describe")
            .with_text("launch day")
            .with_image(ImageInput::from_url("https://x/y.png"));
        let shape = InputShape::classify(request).unwrap();
        assert_eq!(shape.kind(), "multimodal");
        assert_eq!(shape.prompt(), "Describe");
    }

    #[test]
    fn test_content_part_wire_format() {
        let part = ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: "https://x/y.png".to_string(),
            },
        };
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value["type"], "image_url");
        assert_eq!(value["image_url"]["url"], "https://x/y.png");

        let message = ChatMessage::user_text("hello");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "hello");
    }

    #[test]
    fn test_request_deserializes_without_optional_fields() {
        let request: InferenceRequest =
            serde_json::from_str(r#"{"prompt": "Summarize this"}"#).unwrap();
        assert!(request.images.is_empty());
        assert!(request.text.is_none());
        assert!(request.context.is_none());
    }
}
