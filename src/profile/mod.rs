//! Per-user style profiles
//!
//! - GET /api/v1/profile - Fetch (or create) the caller's profile
//! - PUT /api/v1/profile - Field-level profile update
//! - POST /api/v1/profile/feedback - Rate generated content, learn from edits
//! - POST /api/v1/profile/analyze-style - Infer style from sample posts

pub mod analysis;
pub mod engine;
pub mod handlers;
pub mod models;
pub mod store;

pub use analysis::StyleAnalysis;
pub use engine::{
    analyze_edit, calculate_completion, record_feedback, update_completion, EditAnalysis,
    FeedbackInput, FormalityShift,
};
pub use handlers::ProfileState;
pub use models::{ProfileUpdate, StyleProfile};
pub use store::{InMemoryProfileStore, ProfileService, ProfileStore, UserIdentity};
