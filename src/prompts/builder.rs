//! System prompt assembly for a target platform

use super::platform::Platform;
use crate::profile::models::{HashtagStyle, StyleProfile};
use std::fmt::Write;

const CLOSING_INSTRUCTION: &str = "Now transform the provided content according to these guidelines while maintaining the core message and value proposition. If user profile is provided, ensure the content matches their unique voice, tone, and style preferences.";

const PROFILE_PRIORITY: &str = "IMPORTANT: Prioritize the user's profile preferences over platform defaults. Maintain their unique voice and style while adapting to platform requirements.";

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn bullet_list(out: &mut String, items: &[&str]) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str("- ");
        out.push_str(item);
    }
}

fn push_profile_section(out: &mut String, platform: Platform, profile: &StyleProfile) {
    let platform_style = profile.platform_style(platform);
    let tone = platform_style
        .and_then(|s| s.tone)
        .unwrap_or(profile.writing_style.tone);
    let hashtags = platform_style
        .and_then(|s| s.hashtag_style)
        .unwrap_or(HashtagStyle::Moderate);

    let style = &profile.writing_style;
    let voice = &profile.brand_voice;
    let prefs = &profile.content_preferences;
    let patterns = &profile.sample_content.analyzed_patterns;

    // Writing to a String cannot fail
    let _ = write!(
        out,
        "\n\nUSER PROFILE & BRAND VOICE:\n\
         - Writing Tone: {} (override platform default)\n\
         - Personality: {}\n\
         - Formality Level: {}\n\
         - Humor Style: {}\n\
         - Brand Type: {}\n\
         - Industry: {}\n\
         - Target Audience: {}\n\
         - Brand Adjectives: {}\n\
         - Core Values: {}\n\
         - Vocabulary Level: {}\n\
         - Hashtag Preference: {}",
        tone,
        style.personality,
        style.formality_level,
        style.humor_style,
        voice.brand_type,
        voice.industry,
        voice.target_audience,
        voice.adjectives.join(", "),
        voice.values.join(", "),
        patterns.vocabulary_level,
        hashtags,
    );

    let _ = write!(
        out,
        "\n\nCONTENT PREFERENCES:\n\
         - Preferred Topics: {}\n\
         - Content Pillars: {}\n\
         - Preferred Formats: {}\n\
         - Topics to Avoid: {}",
        prefs.topics.join(", "),
        prefs.content_pillars.join(", "),
        prefs.preferred_formats.join(", "),
        prefs.avoid_topics.join(", "),
    );

    let _ = write!(
        out,
        "\n\nWRITING STYLE PATTERNS:\n\
         - Common Phrases: {}\n\
         - Sentence Structure: {}\n\
         - Style Notes: {}",
        patterns.common_phrases.join(", "),
        patterns.sentence_structure,
        patterns.style_notes,
    );

    out.push_str("\n\n");
    out.push_str(PROFILE_PRIORITY);
}

/// Build the complete system instruction for a platform.
///
/// Deterministic: identical arguments always produce identical output. The
/// profile section overrides platform defaults; additional context goes last
/// before the closing instruction.
pub fn build_system_prompt(
    platform: Platform,
    additional_context: Option<&str>,
    profile: Option<&StyleProfile>,
) -> String {
    let instruction = platform.instruction();
    let constraints = &instruction.constraints;

    let mut out = String::with_capacity(4096);
    out.push_str(instruction.base_prompt);

    let _ = write!(
        out,
        "\n\nPLATFORM CONSTRAINTS:\n\
         - Maximum character limit: {}\n\
         - Hashtags supported: {}\n\
         - Recommended hashtag count: {}\n\
         - Images supported: {}\n\
         - Video supported: {}\n\
         - Links supported: {}",
        constraints.max_length,
        yes_no(constraints.supports_hashtags),
        constraints.recommended_hashtag_count,
        yes_no(constraints.supports_images),
        yes_no(constraints.supports_video),
        yes_no(constraints.supports_links),
    );

    out.push_str("\n\nTONE GUIDELINES:\n");
    bullet_list(&mut out, instruction.tone_guidelines);
    out.push_str("\n\nFORMAT GUIDELINES:\n");
    bullet_list(&mut out, instruction.format_guidelines);
    out.push_str("\n\nENGAGEMENT OPTIMIZATION:\n");
    bullet_list(&mut out, instruction.engagement_tips);

    if let Some(profile) = profile {
        push_profile_section(&mut out, platform, profile);
    }

    if let Some(context) = additional_context.filter(|c| !c.is_empty()) {
        out.push_str("\n\nAdditional Context: ");
        out.push_str(context);
    }

    out.push_str("\n\n");
    out.push_str(CLOSING_INSTRUCTION);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::models::{PlatformStyle, Tone};

    fn profile() -> StyleProfile {
        let mut profile = StyleProfile::new("u1", "u1@example.com", Some("Ada".to_string()));
        profile.brand_voice.industry = "fintech".to_string();
        profile.brand_voice.adjectives = vec!["bold".to_string(), "clear".to_string()];
        profile.content_preferences.topics = vec!["payments".to_string()];
        profile
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let profile = profile();
        let a = build_system_prompt(Platform::Instagram, Some("launch week"), Some(&profile));
        let b = build_system_prompt(Platform::Instagram, Some("launch week"), Some(&profile));
        assert_eq!(a, b);
    }

    #[test]
    fn test_constraints_section() {
        let prompt = build_system_prompt(Platform::Twitter, None, None);
        assert!(prompt.starts_with("You are an expert Twitter content creator"));
        assert!(prompt.contains("- Maximum character limit: 280\n"));
        assert!(prompt.contains("- Recommended hashtag count: 2\n"));
        assert!(prompt.contains("- Links supported: Yes\n\nTONE GUIDELINES:\n- Be direct"));
        assert!(!prompt.contains("USER PROFILE"));
        assert!(prompt.ends_with(CLOSING_INSTRUCTION));
    }

    #[test]
    fn test_instagram_disallows_links() {
        let prompt = build_system_prompt(Platform::Instagram, None, None);
        assert!(prompt.contains("- Links supported: No"));
    }

    #[test]
    fn test_profile_section_overrides() {
        let mut profile = profile();
        profile.platform_styles.insert(
            Platform::Facebook,
            PlatformStyle {
                tone: Some(Tone::Humorous),
                ..Default::default()
            },
        );

        let prompt = build_system_prompt(Platform::Facebook, None, Some(&profile));
        assert!(prompt.contains("- Writing Tone: humorous (override platform default)"));
        assert!(prompt.contains("- Hashtag Preference: moderate"));
        assert!(prompt.contains("- Industry: fintech"));
        assert!(prompt.contains("- Brand Adjectives: bold, clear"));
        assert!(prompt.contains("- Preferred Topics: payments"));
        assert!(prompt.contains(PROFILE_PRIORITY));
    }

    #[test]
    fn test_profile_uses_global_tone_and_platform_hashtags() {
        let prompt = build_system_prompt(Platform::Instagram, None, Some(&profile()));
        assert!(prompt.contains("- Writing Tone: professional (override platform default)"));
        assert!(prompt.contains("- Hashtag Preference: heavy"));
    }

    #[test]
    fn test_additional_context_comes_last() {
        let prompt = build_system_prompt(Platform::Facebook, Some("Black Friday"), Some(&profile()));
        let context_at = prompt.find("Additional Context: Black Friday").unwrap();
        let profile_at = prompt.find("USER PROFILE & BRAND VOICE").unwrap();
        let closing_at = prompt.find(CLOSING_INSTRUCTION).unwrap();
        assert!(profile_at < context_at);
        assert!(context_at < closing_at);
    }
}
