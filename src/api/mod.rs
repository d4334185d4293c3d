//! HTTP surface: shared bodies, caller identity and router assembly

pub mod identity;
pub mod models;
pub mod routes;

pub use identity::caller_identity;
pub use models::{error_codes, error_response, ApiError, ApiFailure, ApiResponse};
pub use routes::{build_router, AppState};
