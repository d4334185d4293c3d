//! Model selection and message construction for inference requests

use super::config::ModelCatalog;
use super::models::{
    ChatCompletionRequest, ChatMessage, ContentPart, ImageInput, ImageUrl, InferenceMetadata,
    InferenceRequest, InferenceResult, InputShape, ModelTier,
};
use super::provider::{ChatProvider, InferenceError};
use super::stream::FragmentStream;
use crate::metrics::METRICS;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 4000;

/// Text-only prompts longer than this (in characters) go to the powerful model
pub const POWERFUL_PROMPT_THRESHOLD: usize = 1000;

const MULTIMODAL_PERSONA: &str = "You are a helpful AI assistant that can analyze images and text together to provide comprehensive responses.";
const IMAGE_PERSONA: &str =
    "You are a helpful AI assistant specialized in image analysis and description.";
const TEXT_PERSONA: &str =
    "You are a helpful AI assistant specialized in text processing and content generation.";

/// Routes requests to the right upstream model and normalizes the result
pub struct InferenceRouter {
    provider: Arc<dyn ChatProvider>,
    models: ModelCatalog,
}

impl InferenceRouter {
    pub fn new(provider: Arc<dyn ChatProvider>, models: ModelCatalog) -> Self {
        Self { provider, models }
    }

    pub fn models(&self) -> &ModelCatalog {
        &self.models
    }

    /// Pick the routing tier for a classified request
    pub fn select_tier(shape: &InputShape) -> ModelTier {
        match shape {
            InputShape::Multimodal { .. } => ModelTier::VisionMultimodal,
            InputShape::ImageOnly { .. } => ModelTier::VisionSingle,
            InputShape::TextOnly { prompt, .. } => {
                if prompt.chars().count() > POWERFUL_PROMPT_THRESHOLD {
                    ModelTier::PowerfulText
                } else {
                    ModelTier::FastText
                }
            }
        }
    }

    /// System persona followed by a single user message
    pub fn build_messages(shape: &InputShape) -> Vec<ChatMessage> {
        match shape {
            InputShape::Multimodal {
                prompt,
                text,
                images,
            } => {
                let mut parts = vec![
                    ContentPart::Text {
                        text: prompt.clone(),
                    },
                    ContentPart::Text {
                        text: format!("Context: {}", text),
                    },
                ];
                parts.extend(image_parts(images));
                vec![
                    ChatMessage::system(MULTIMODAL_PERSONA),
                    ChatMessage::user_parts(parts),
                ]
            }
            InputShape::ImageOnly { prompt, images } => {
                let mut parts = vec![ContentPart::Text {
                    text: prompt.clone(),
                }];
                parts.extend(image_parts(images));
                vec![
                    ChatMessage::system(IMAGE_PERSONA),
                    ChatMessage::user_parts(parts),
                ]
            }
            InputShape::TextOnly { prompt, text } => {
                let content = match text {
                    Some(text) => format!("{}\n\nContext: {}", prompt, text),
                    None => prompt.clone(),
                };
                vec![
                    ChatMessage::system(TEXT_PERSONA),
                    ChatMessage::user_text(content),
                ]
            }
        }
    }

    fn build_request(&self, shape: &InputShape, stream: bool) -> ChatCompletionRequest {
        let tier = Self::select_tier(shape);
        let model = self.models.model_for(tier).to_string();

        debug!(
            "Routing {} request to tier={} model={}",
            shape.kind(),
            tier.as_str(),
            model
        );

        ChatCompletionRequest {
            model,
            messages: Self::build_messages(shape),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            stream,
        }
    }

    fn classify(request: InferenceRequest) -> Result<InputShape, InferenceError> {
        if let Some(context) = &request.context {
            debug!("Request context keys: {:?}", context.keys().collect::<Vec<_>>());
        }
        InputShape::classify(request)
    }

    /// Run a non-streaming completion
    pub async fn process(&self, request: InferenceRequest) -> Result<InferenceResult, InferenceError> {
        let shape = Self::classify(request)?;
        let upstream_request = self.build_request(&shape, false);
        let model = upstream_request.model.clone();

        let start = Instant::now();
        let outcome = self.provider.chat_completion(&upstream_request).await;
        let elapsed = start.elapsed();

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                if let InferenceError::RateLimited { .. } = e {
                    METRICS.record_rate_limited();
                    METRICS.record_inference(&model, "rate_limited", elapsed);
                } else {
                    METRICS.record_inference(&model, "error", elapsed);
                }
                return Err(e);
            }
        };

        let mut completion = response.completion;
        if completion.choices.is_empty() {
            METRICS.record_inference(&model, "error", elapsed);
            return Err(InferenceError::InvalidResponse(
                "upstream returned no choices".to_string(),
            ));
        }
        let content = completion
            .choices
            .swap_remove(0)
            .message
            .content
            .unwrap_or_default();

        METRICS.record_inference(&model, "success", elapsed);
        info!(
            "Inference completed: model={}, elapsed_ms={}",
            model,
            elapsed.as_millis()
        );

        Ok(InferenceResult {
            content,
            rate_limits: response.rate_limits,
            metadata: InferenceMetadata {
                model,
                processing_time: elapsed.as_millis() as u64,
                token_usage: completion.usage.map(Into::into),
            },
        })
    }

    /// Start a streaming completion
    ///
    /// Fragments come back in upstream emission order. Dropping the returned
    /// stream stops consumption and releases the upstream response.
    pub async fn stream_process(
        &self,
        request: InferenceRequest,
    ) -> Result<FragmentStream, InferenceError> {
        let shape = Self::classify(request)?;
        let upstream_request = self.build_request(&shape, true);

        let start = Instant::now();
        let outcome = self.provider.stream_chat_completion(&upstream_request).await;
        let status = match &outcome {
            Ok(_) => "success",
            Err(InferenceError::RateLimited { .. }) => {
                METRICS.record_rate_limited();
                "rate_limited"
            }
            Err(_) => "error",
        };
        METRICS.record_inference(&upstream_request.model, status, start.elapsed());

        outcome
    }
}

/// One `image_url` part per usable image; entries with no source are skipped
fn image_parts(images: &[ImageInput]) -> Vec<ContentPart> {
    images
        .iter()
        .enumerate()
        .filter_map(|(index, image)| match image.source() {
            Some(source) => Some(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: source.to_upstream_url(),
                },
            }),
            None => {
                warn!("Skipping image {} with neither url nor base64", index);
                None
            }
        })
        .collect()
}
