//! Content repurposing across social platforms
//!
//! - POST /api/v1/repurpose - Generate one variant per requested platform

pub mod handlers;
pub mod schedule;
pub mod service;

pub use handlers::RepurposeState;
pub use schedule::{next_publication_slots, PublicationSlots};
pub use service::{
    context_prompt, estimate_engagement, extract_hashtags, Engagement, GeneratedContent,
    RepurposeMetadata, RepurposeOutcome, RepurposeRequest, RepurposeService,
};
