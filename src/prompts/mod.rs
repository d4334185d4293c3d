//! Platform-specific system prompt construction

pub mod builder;
pub mod platform;

pub use builder::build_system_prompt;
pub use platform::{Platform, PlatformConstraints, PlatformInstruction};
