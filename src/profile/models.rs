//! Style profile data model

use crate::prompts::Platform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use uuid::Uuid;

/// Closed string enumeration with a wire label per variant
macro_rules! closed_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? } default $default:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            /// Lenient parse used for AI-produced values; unknown labels yield `None`
            pub fn parse(value: &str) -> Option<Self> {
                match value.trim().to_ascii_lowercase().as_str() {
                    $($label => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_enum!(
    /// Global writing tone
    Tone {
        Professional => "professional",
        Casual => "casual",
        Friendly => "friendly",
        Authoritative => "authoritative",
        Conversational => "conversational",
        Humorous => "humorous",
    } default Professional
);

closed_enum!(
    Personality {
        Enthusiastic => "enthusiastic",
        Calm => "calm",
        Witty => "witty",
        Inspiring => "inspiring",
        Analytical => "analytical",
        Storyteller => "storyteller",
    } default Calm
);

closed_enum!(
    /// Ordered from most formal to most casual
    FormalityLevel {
        VeryFormal => "very-formal",
        Formal => "formal",
        SemiFormal => "semi-formal",
        Casual => "casual",
        VeryCasual => "very-casual",
    } default SemiFormal
);

closed_enum!(
    HumorStyle {
        None => "none",
        Subtle => "subtle",
        Witty => "witty",
        Playful => "playful",
        Sarcastic => "sarcastic",
    } default Subtle
);

closed_enum!(
    BrandType {
        Personal => "personal",
        Business => "business",
        Nonprofit => "nonprofit",
        Agency => "agency",
    } default Personal
);

closed_enum!(
    /// Hashtag density preference
    HashtagStyle {
        Minimal => "minimal",
        Moderate => "moderate",
        Heavy => "heavy",
    } default Moderate
);

closed_enum!(
    VocabularyLevel {
        Simple => "simple",
        Intermediate => "intermediate",
        Advanced => "advanced",
        Expert => "expert",
    } default Intermediate
);

impl FormalityLevel {
    /// One notch toward casual. Edits only move the level inside the
    /// formal..casual band, so the extremes are never entered or left.
    pub fn more_casual(self) -> Self {
        match self {
            Self::Formal => Self::SemiFormal,
            Self::SemiFormal => Self::Casual,
            other => other,
        }
    }

    /// One notch toward formal, mirror of [`FormalityLevel::more_casual`]
    pub fn more_formal(self) -> Self {
        match self {
            Self::Casual => Self::SemiFormal,
            Self::SemiFormal => Self::Formal,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WritingStyle {
    pub tone: Tone,
    pub personality: Personality,
    pub formality_level: FormalityLevel,
    pub humor_style: HumorStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrandVoice {
    pub adjectives: Vec<String>,
    pub values: Vec<String>,
    pub target_audience: String,
    pub industry: String,
    pub brand_type: BrandType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentPreferences {
    pub topics: Vec<String>,
    pub content_pillars: Vec<String>,
    pub preferred_formats: Vec<String>,
    pub avoid_topics: Vec<String>,
}

/// Per-platform overrides of the global style
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlatformStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<Tone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashtag_style: Option<HashtagStyle>,
}

impl PlatformStyle {
    fn with_hashtags(hashtag_style: HashtagStyle) -> Self {
        Self {
            hashtag_style: Some(hashtag_style),
            ..Default::default()
        }
    }
}

/// Starting hashtag density for each platform
pub fn default_platform_styles() -> BTreeMap<Platform, PlatformStyle> {
    BTreeMap::from([
        (Platform::Facebook, PlatformStyle::with_hashtags(HashtagStyle::Minimal)),
        (Platform::Instagram, PlatformStyle::with_hashtags(HashtagStyle::Heavy)),
        (Platform::Twitter, PlatformStyle::with_hashtags(HashtagStyle::Moderate)),
    ])
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzedPatterns {
    pub average_length: u32,
    pub common_phrases: Vec<String>,
    pub sentence_structure: String,
    pub vocabulary_level: VocabularyLevel,
    pub style_notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SampleContent {
    pub original_posts: Vec<String>,
    pub analyzed_patterns: AnalyzedPatterns,
}

/// One rating of generated content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    pub id: Uuid,
    pub generated_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_edit: Option<String>,
    pub satisfaction: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    pub content_type: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LearningPreferences {
    /// Oldest first, bounded by the feedback capacity
    #[serde(rename = "feedbackData")]
    pub feedback: VecDeque<FeedbackEntry>,
    pub style_consistency_score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_analyzed: Option<DateTime<Utc>>,
}

/// Per-user writing style and brand profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleProfile {
    pub user_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub writing_style: WritingStyle,
    #[serde(default)]
    pub brand_voice: BrandVoice,
    #[serde(default)]
    pub content_preferences: ContentPreferences,
    #[serde(default = "default_platform_styles")]
    pub platform_styles: BTreeMap<Platform, PlatformStyle>,
    #[serde(default)]
    pub sample_content: SampleContent,
    #[serde(default)]
    pub preferences: LearningPreferences,
    #[serde(default)]
    pub profile_completion: u8,
    #[serde(default)]
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StyleProfile {
    /// Fresh profile with every section at its default
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            email: email.into(),
            name: name.filter(|n| !n.trim().is_empty()),
            writing_style: WritingStyle::default(),
            brand_voice: BrandVoice::default(),
            content_preferences: ContentPreferences::default(),
            platform_styles: default_platform_styles(),
            sample_content: SampleContent::default(),
            preferences: LearningPreferences::default(),
            profile_completion: 0,
            onboarding_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn platform_style(&self, platform: Platform) -> Option<&PlatformStyle> {
        self.platform_styles.get(&platform)
    }

    pub fn platform_style_mut(&mut self, platform: Platform) -> &mut PlatformStyle {
        self.platform_styles.entry(platform).or_default()
    }
}

// Field-level patches. Every field is optional; a present field replaces
// exactly that field and leaves its siblings alone.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WritingStyleUpdate {
    pub tone: Option<Tone>,
    pub personality: Option<Personality>,
    pub formality_level: Option<FormalityLevel>,
    pub humor_style: Option<HumorStyle>,
}

impl WritingStyleUpdate {
    pub fn apply_to(self, style: &mut WritingStyle) {
        if let Some(tone) = self.tone {
            style.tone = tone;
        }
        if let Some(personality) = self.personality {
            style.personality = personality;
        }
        if let Some(level) = self.formality_level {
            style.formality_level = level;
        }
        if let Some(humor) = self.humor_style {
            style.humor_style = humor;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrandVoiceUpdate {
    pub adjectives: Option<Vec<String>>,
    pub values: Option<Vec<String>>,
    pub target_audience: Option<String>,
    pub industry: Option<String>,
    pub brand_type: Option<BrandType>,
}

impl BrandVoiceUpdate {
    pub fn apply_to(self, voice: &mut BrandVoice) {
        if let Some(adjectives) = self.adjectives {
            voice.adjectives = adjectives;
        }
        if let Some(values) = self.values {
            voice.values = values;
        }
        if let Some(audience) = self.target_audience {
            voice.target_audience = audience;
        }
        if let Some(industry) = self.industry {
            voice.industry = industry;
        }
        if let Some(brand_type) = self.brand_type {
            voice.brand_type = brand_type;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentPreferencesUpdate {
    pub topics: Option<Vec<String>>,
    pub content_pillars: Option<Vec<String>>,
    pub preferred_formats: Option<Vec<String>>,
    pub avoid_topics: Option<Vec<String>>,
}

impl ContentPreferencesUpdate {
    pub fn apply_to(self, prefs: &mut ContentPreferences) {
        if let Some(topics) = self.topics {
            prefs.topics = topics;
        }
        if let Some(pillars) = self.content_pillars {
            prefs.content_pillars = pillars;
        }
        if let Some(formats) = self.preferred_formats {
            prefs.preferred_formats = formats;
        }
        if let Some(avoid) = self.avoid_topics {
            prefs.avoid_topics = avoid;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlatformStyleUpdate {
    pub tone: Option<Tone>,
    pub style: Option<String>,
    pub hashtag_style: Option<HashtagStyle>,
}

impl PlatformStyleUpdate {
    pub fn apply_to(self, style: &mut PlatformStyle) {
        if self.tone.is_some() {
            style.tone = self.tone;
        }
        if self.style.is_some() {
            style.style = self.style;
        }
        if self.hashtag_style.is_some() {
            style.hashtag_style = self.hashtag_style;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SampleContentUpdate {
    pub original_posts: Option<Vec<String>>,
}

/// Body of PUT /api/v1/profile
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub writing_style: Option<WritingStyleUpdate>,
    pub brand_voice: Option<BrandVoiceUpdate>,
    pub content_preferences: Option<ContentPreferencesUpdate>,
    pub platform_styles: Option<BTreeMap<Platform, PlatformStyleUpdate>>,
    pub sample_content: Option<SampleContentUpdate>,
}

impl ProfileUpdate {
    /// Apply every present field; returns whether anything was touched
    pub fn apply_to(self, profile: &mut StyleProfile) -> bool {
        let mut touched = false;

        if let Some(name) = self.name.filter(|n| !n.trim().is_empty()) {
            profile.name = Some(name);
            touched = true;
        }
        if let Some(update) = self.writing_style {
            update.apply_to(&mut profile.writing_style);
            touched = true;
        }
        if let Some(update) = self.brand_voice {
            update.apply_to(&mut profile.brand_voice);
            touched = true;
        }
        if let Some(update) = self.content_preferences {
            update.apply_to(&mut profile.content_preferences);
            touched = true;
        }
        if let Some(styles) = self.platform_styles {
            for (platform, update) in styles {
                update.apply_to(profile.platform_style_mut(platform));
            }
            touched = true;
        }
        if let Some(posts) = self.sample_content.and_then(|s| s.original_posts) {
            profile.sample_content.original_posts = posts;
            touched = true;
        }

        touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_defaults() {
        let profile = StyleProfile::new("u1", "a@b.c", None);
        assert_eq!(profile.writing_style.tone, Tone::Professional);
        assert_eq!(profile.writing_style.personality, Personality::Calm);
        assert_eq!(profile.writing_style.formality_level, FormalityLevel::SemiFormal);
        assert_eq!(profile.writing_style.humor_style, HumorStyle::Subtle);
        assert_eq!(profile.brand_voice.brand_type, BrandType::Personal);
        assert_eq!(
            profile.platform_style(Platform::Instagram).and_then(|s| s.hashtag_style),
            Some(HashtagStyle::Heavy)
        );
        assert_eq!(
            profile.platform_style(Platform::Facebook).and_then(|s| s.hashtag_style),
            Some(HashtagStyle::Minimal)
        );
    }

    #[test]
    fn test_formality_band() {
        assert_eq!(FormalityLevel::Formal.more_casual(), FormalityLevel::SemiFormal);
        assert_eq!(FormalityLevel::Casual.more_casual(), FormalityLevel::Casual);
        assert_eq!(FormalityLevel::VeryFormal.more_casual(), FormalityLevel::VeryFormal);
        assert_eq!(FormalityLevel::Casual.more_formal(), FormalityLevel::SemiFormal);
        assert_eq!(FormalityLevel::Formal.more_formal(), FormalityLevel::Formal);
    }

    #[test]
    fn test_enum_wire_labels() {
        assert_eq!(
            serde_json::to_string(&FormalityLevel::VeryCasual).unwrap(),
            "\"very-casual\""
        );
        assert_eq!(Tone::parse("Friendly"), Some(Tone::Friendly));
        assert_eq!(Tone::parse("grumpy"), None);
    }

    #[test]
    fn test_partial_update_keeps_siblings() {
        let mut profile = StyleProfile::new("u1", "a@b.c", Some("Ada".to_string()));
        profile.brand_voice.industry = "fintech".to_string();
        profile.brand_voice.adjectives = vec!["bold".to_string()];

        let update: ProfileUpdate = serde_json::from_value(serde_json::json!({
            "brandVoice": { "targetAudience": "founders" },
            "platformStyles": { "twitter": { "tone": "humorous" } }
        }))
        .unwrap();
        assert!(update.apply_to(&mut profile));

        assert_eq!(profile.brand_voice.target_audience, "founders");
        assert_eq!(profile.brand_voice.industry, "fintech");
        assert_eq!(profile.brand_voice.adjectives, vec!["bold"]);

        let twitter = profile.platform_style(Platform::Twitter).unwrap();
        assert_eq!(twitter.tone, Some(Tone::Humorous));
        assert_eq!(twitter.hashtag_style, Some(HashtagStyle::Moderate));
    }

    #[test]
    fn test_empty_update_touches_nothing() {
        let mut profile = StyleProfile::new("u1", "", None);
        let before = profile.clone();
        assert!(!ProfileUpdate::default().apply_to(&mut profile));
        assert_eq!(profile, before);
    }

    #[test]
    fn test_profile_serializes_camel_case() {
        let profile = StyleProfile::new("u1", "a@b.c", None);
        let value = serde_json::to_value(&profile).unwrap();
        assert!(value.get("writingStyle").is_some());
        assert!(value["preferences"].get("feedbackData").is_some());
        assert_eq!(value["platformStyles"]["instagram"]["hashtagStyle"], "heavy");
    }
}
