//! Content repurposing service
//!
//! Routes text, image and multimodal requests to an OpenAI-compatible
//! inference upstream, builds platform-specific prompts, and keeps an
//! adaptive per-user style profile that learns from feedback.

pub mod api;
pub mod config;
pub mod error;
pub mod inference;
pub mod logging;
pub mod metrics;
pub mod profile;
pub mod prompts;
pub mod repurpose;

pub use error::{Error, Result};
