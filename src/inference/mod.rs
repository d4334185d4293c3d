//! Inference routing over an OpenAI-compatible chat-completion upstream
//!
//! - POST /api/v1/ai/process - Run a text, image or multimodal request
//! - GET /api/v1/ai/process - Describe the endpoint and model catalog

pub mod config;
pub mod handlers;
pub mod models;
pub mod provider;
pub mod router;
pub mod stream;

pub use config::{ModelCatalog, UpstreamConfig};
pub use handlers::{process, process_info, InferenceState};
pub use models::{
    ChatMessage, ContentPart, ImageInput, ImageSource, InferenceMetadata, InferenceRequest,
    InferenceResult, InputShape, MessageContent, ModelTier, RateLimitSnapshot, TokenUsage,
};
pub use provider::{ChatProvider, GroqProvider, InferenceError, ProviderResponse};
pub use router::InferenceRouter;
pub use stream::FragmentStream;
