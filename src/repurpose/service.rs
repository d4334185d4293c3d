//! Per-platform content generation

use super::schedule::{next_publication_slots, PublicationSlots};
use crate::error::{Error, Result};
use crate::inference::{ImageInput, InferenceError, InferenceRequest, InferenceRouter};
use crate::metrics::METRICS;
use crate::profile::{ProfileService, StyleProfile};
use crate::prompts::{build_system_prompt, Platform};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Minimum source text length in characters
pub const MIN_TEXT_CHARS: usize = 10;

/// Content longer than this with at least one hashtag is rated high engagement
const HIGH_ENGAGEMENT_CHARS: usize = 100;

static HASHTAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\w+").expect("hashtag pattern is valid"));

/// Body of POST /api/v1/repurpose
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepurposeRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub platforms: Option<Vec<String>>,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub brand_voice: Option<String>,
    #[serde(default)]
    pub additional_context: Option<String>,
}

impl RepurposeRequest {
    /// Check the text and resolve target platforms (all when none are given)
    pub fn validate(&self) -> Result<Vec<Platform>> {
        if self.text.trim().chars().count() < MIN_TEXT_CHARS {
            return Err(Error::Validation(format!(
                "Text must be at least {} characters long",
                MIN_TEXT_CHARS
            )));
        }

        let names = match &self.platforms {
            Some(names) if !names.is_empty() => names,
            _ => return Ok(Platform::ALL.to_vec()),
        };

        let mut platforms = Vec::with_capacity(names.len());
        for name in names {
            let platform: Platform = name.parse()?;
            if !platforms.contains(&platform) {
                platforms.push(platform);
            }
        }
        Ok(platforms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engagement {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub platform: Platform,
    pub content: String,
    pub hashtags: Vec<String>,
    pub character_count: usize,
    pub estimated_engagement: Engagement,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepurposeMetadata {
    pub generated_at: DateTime<Utc>,
    pub platforms_processed: usize,
    pub total_characters: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepurposeOutcome {
    pub original: String,
    pub results: Vec<GeneratedContent>,
    pub metadata: RepurposeMetadata,
    pub scheduled_at: PublicationSlots,
}

pub fn extract_hashtags(content: &str) -> Vec<String> {
    HASHTAG_RE
        .find_iter(content)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn estimate_engagement(character_count: usize, hashtags: &[String]) -> Engagement {
    if character_count > HIGH_ENGAGEMENT_CHARS && !hashtags.is_empty() {
        Engagement::High
    } else {
        Engagement::Medium
    }
}

fn suggestions(platform: Platform) -> Vec<String> {
    let hashtag_hint = match platform {
        Platform::Instagram => "more",
        _ => "relevant",
    };
    vec![
        format!("Consider adding {} hashtags", hashtag_hint),
        "Engage with your audience by asking questions".to_string(),
        "Share at optimal times for your audience".to_string(),
    ]
}

/// User-side instructions carrying the source content
pub fn context_prompt(platform: Platform, request: &RepurposeRequest) -> String {
    let mut lines = Vec::new();
    if let Some(audience) = request.target_audience.as_deref().filter(|a| !a.is_empty()) {
        lines.push(format!("Target Audience: {}", audience));
    }
    if let Some(voice) = request.brand_voice.as_deref().filter(|v| !v.is_empty()) {
        lines.push(format!("Brand Voice: {}", voice));
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!("Original Content: {}", request.text));
    lines.push(String::new());
    lines.push(format!(
        "Please repurpose this content for {} following the guidelines provided.",
        platform
    ));
    lines.join("\n")
}

/// Generates platform variants, personalized by onboarded profiles
pub struct RepurposeService {
    router: Arc<InferenceRouter>,
    profiles: Arc<ProfileService>,
}

impl RepurposeService {
    pub fn new(router: Arc<InferenceRouter>, profiles: Arc<ProfileService>) -> Self {
        Self { router, profiles }
    }

    /// Profile used for personalization; lookup failures fall back to none
    async fn personalization(&self, user_id: &str) -> Option<StyleProfile> {
        match self.profiles.find(user_id).await {
            Ok(profile) => profile.filter(|p| p.onboarding_completed),
            Err(e) => {
                warn!("Profile lookup failed for {}, using defaults: {}", user_id, e);
                None
            }
        }
    }

    async fn generate(
        &self,
        platform: Platform,
        request: &RepurposeRequest,
        profile: Option<&StyleProfile>,
    ) -> std::result::Result<GeneratedContent, InferenceError> {
        let system_prompt =
            build_system_prompt(platform, request.additional_context.as_deref(), profile);

        let mut inference =
            InferenceRequest::new(system_prompt).with_text(context_prompt(platform, request));
        for url in request.images.iter().filter(|u| !u.is_empty()) {
            inference = inference.with_image(ImageInput::from_url(url.clone()));
        }

        let result = self.router.process(inference).await?;
        let hashtags = extract_hashtags(&result.content);
        let character_count = result.content.chars().count();

        Ok(GeneratedContent {
            platform,
            estimated_engagement: estimate_engagement(character_count, &hashtags),
            content: result.content,
            hashtags,
            character_count,
            suggestions: suggestions(platform),
        })
    }

    /// Generate one variant per platform.
    ///
    /// A failing platform is skipped so the others still come back, except
    /// for rate limits, which abort the whole request.
    pub async fn repurpose(&self, user_id: &str, request: RepurposeRequest) -> Result<RepurposeOutcome> {
        let platforms = request.validate()?;
        let profile = self.personalization(user_id).await;

        info!(
            "Repurposing for user={}: platforms={:?}, personalized={}",
            user_id,
            platforms,
            profile.is_some()
        );

        let mut results = Vec::with_capacity(platforms.len());
        for platform in platforms {
            match self.generate(platform, &request, profile.as_ref()).await {
                Ok(content) => {
                    METRICS.record_repurpose(platform.as_str(), true);
                    results.push(content);
                }
                Err(e @ InferenceError::RateLimited { .. }) => {
                    METRICS.record_repurpose(platform.as_str(), false);
                    return Err(e.into());
                }
                Err(e) => {
                    METRICS.record_repurpose(platform.as_str(), false);
                    warn!("Generation failed for {}: {}", platform, e);
                }
            }
        }

        let now = Utc::now();
        Ok(RepurposeOutcome {
            metadata: RepurposeMetadata {
                generated_at: now,
                platforms_processed: results.len(),
                total_characters: results.iter().map(|r| r.character_count).sum(),
            },
            original: request.text,
            results,
            scheduled_at: next_publication_slots(now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> RepurposeRequest {
        RepurposeRequest {
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_defaults_to_all_platforms() {
        let platforms = request("Long enough text").validate().unwrap();
        assert_eq!(platforms, Platform::ALL.to_vec());
    }

    #[test]
    fn test_validate_short_text() {
        assert!(matches!(
            request("too short").validate(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_validate_unknown_platform() {
        let mut req = request("Long enough text");
        req.platforms = Some(vec!["twitter".to_string(), "myspace".to_string()]);
        assert!(matches!(req.validate(), Err(Error::UnknownPlatform(_))));
    }

    #[test]
    fn test_validate_dedupes_platforms() {
        let mut req = request("Long enough text");
        req.platforms = Some(vec!["twitter".to_string(), "Twitter".to_string()]);
        assert_eq!(req.validate().unwrap(), vec![Platform::Twitter]);
    }

    #[test]
    fn test_extract_hashtags() {
        let tags = extract_hashtags("Ship it #rust #async_io! no#tag? #");
        assert_eq!(tags, vec!["#rust", "#async_io", "#tag"]);
    }

    #[test]
    fn test_engagement_estimate() {
        let tags = vec!["#a".to_string()];
        assert_eq!(estimate_engagement(101, &tags), Engagement::High);
        assert_eq!(estimate_engagement(100, &tags), Engagement::Medium);
        assert_eq!(estimate_engagement(500, &[]), Engagement::Medium);
    }

    #[test]
    fn test_context_prompt_layout() {
        let mut req = request("We shipped v2");
        req.target_audience = Some("developers".to_string());

        let prompt = context_prompt(Platform::Facebook, &req);
        assert_eq!(
            prompt,
            "Target Audience: developers\n\nOriginal Content: We shipped v2\n\n\
             Please repurpose this content for facebook following the guidelines provided."
        );
    }

    #[test]
    fn test_context_prompt_without_extras() {
        let prompt = context_prompt(Platform::Twitter, &request("We shipped v2"));
        assert!(prompt.starts_with("Original Content: We shipped v2"));
    }
}
