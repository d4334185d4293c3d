//! Crate-wide error type

use crate::inference::InferenceError;
use thiserror::Error;

/// Errors surfaced by the repurposing service
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Self::Configuration(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
