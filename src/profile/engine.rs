//! Adaptive style-preference engine
//!
//! Pure functions over [`StyleProfile`]: feedback logging, the edit-diff
//! heuristic and profile completion. Persistence lives in the store.

use super::models::{FeedbackEntry, HashtagStyle, StyleProfile, Tone};
use crate::error::{Error, Result};
use crate::prompts::Platform;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;
use uuid::Uuid;

/// Maximum feedback entries kept per profile
pub const FEEDBACK_CAPACITY: usize = 50;

/// Entries considered for the consistency score
pub const CONSISTENCY_WINDOW: usize = 10;

/// Completion at which a profile counts as onboarded
pub const ONBOARDING_THRESHOLD: u8 = 80;

const DEFAULT_CONTENT_TYPE: &str = "post";
const QUESTIONS_FORMAT: &str = "questions";

const CASUAL_WORDS: &[&str] = &["hey", "awesome", "cool", "super", "really", "totally", "wow"];
const FORMAL_WORDS: &[&str] = &["therefore", "furthermore", "however", "consequently", "accordingly"];

/// Direction of a formality change between two texts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormalityShift {
    MoreCasual,
    MoreFormal,
    NoChange,
}

/// Signals extracted from a user's edit of generated content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditAnalysis {
    pub hashtag_delta: i64,
    pub question_delta: i64,
    pub formality: FormalityShift,
}

/// Feedback submitted for one piece of generated content
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackInput {
    #[serde(default)]
    pub generated_content: String,
    #[serde(default)]
    pub user_edit: Option<String>,
    #[serde(default)]
    pub satisfaction: u8,
    #[serde(default)]
    pub platform: Option<Platform>,
    #[serde(default)]
    pub content_type: Option<String>,
}

fn count_char(text: &str, needle: char) -> i64 {
    text.chars().filter(|&c| c == needle).count() as i64
}

/// Number of listed words contained in the text (case-insensitive substring)
fn count_markers(text: &str, words: &[&str]) -> i64 {
    let lower = text.to_lowercase();
    words.iter().filter(|w| lower.contains(*w)).count() as i64
}

pub fn detect_formality_shift(original: &str, edited: &str) -> FormalityShift {
    let casual_delta = count_markers(edited, CASUAL_WORDS) - count_markers(original, CASUAL_WORDS);
    let formal_delta = count_markers(edited, FORMAL_WORDS) - count_markers(original, FORMAL_WORDS);

    if casual_delta > formal_delta {
        FormalityShift::MoreCasual
    } else if formal_delta > casual_delta {
        FormalityShift::MoreFormal
    } else {
        FormalityShift::NoChange
    }
}

/// Compare generated content with the user's edited version
pub fn analyze_edit(original: &str, edited: &str) -> EditAnalysis {
    EditAnalysis {
        hashtag_delta: count_char(edited, '#') - count_char(original, '#'),
        question_delta: count_char(edited, '?') - count_char(original, '?'),
        formality: detect_formality_shift(original, edited),
    }
}

/// Fold edit signals into the profile.
///
/// Hashtag density is adjusted only when the platform is known.
pub fn apply_edit_analysis(
    profile: &mut StyleProfile,
    analysis: &EditAnalysis,
    platform: Option<Platform>,
) {
    if let Some(platform) = platform {
        let hashtag_style = if analysis.hashtag_delta > 2 {
            Some(HashtagStyle::Heavy)
        } else if analysis.hashtag_delta < -1 {
            Some(HashtagStyle::Minimal)
        } else {
            None
        };
        if let Some(style) = hashtag_style {
            profile.platform_style_mut(platform).hashtag_style = Some(style);
        }
    }

    let style = &mut profile.writing_style;
    style.formality_level = match analysis.formality {
        FormalityShift::MoreCasual => style.formality_level.more_casual(),
        FormalityShift::MoreFormal => style.formality_level.more_formal(),
        FormalityShift::NoChange => style.formality_level,
    };

    if analysis.question_delta > 0 {
        let formats = &mut profile.content_preferences.preferred_formats;
        if !formats.iter().any(|f| f == QUESTIONS_FORMAT) {
            formats.push(QUESTIONS_FORMAT.to_string());
        }
    }
}

/// round(mean satisfaction of the most recent entries × 20)
pub fn consistency_score(feedback: &VecDeque<FeedbackEntry>) -> u8 {
    let recent: Vec<u8> = feedback
        .iter()
        .rev()
        .take(CONSISTENCY_WINDOW)
        .map(|entry| entry.satisfaction)
        .collect();

    if recent.is_empty() {
        return 0;
    }

    let mean = recent.iter().map(|&s| f64::from(s)).sum::<f64>() / recent.len() as f64;
    (mean * 20.0).round().clamp(0.0, 100.0) as u8
}

/// Append a feedback entry, evicting the oldest beyond capacity, and learn
/// from the edit when one was made
pub fn record_feedback(profile: &mut StyleProfile, input: FeedbackInput) -> Result<()> {
    if !(1..=5).contains(&input.satisfaction) {
        return Err(Error::Validation(
            "satisfaction must be between 1 and 5".to_string(),
        ));
    }
    if input.generated_content.trim().is_empty() {
        return Err(Error::Validation(
            "generated content cannot be empty".to_string(),
        ));
    }

    let user_edit = input.user_edit.filter(|edit| !edit.is_empty());
    if let Some(edit) = user_edit.as_deref() {
        if edit != input.generated_content {
            let analysis = analyze_edit(&input.generated_content, edit);
            debug!("Edit analysis for {}: {:?}", profile.user_id, analysis);
            apply_edit_analysis(profile, &analysis, input.platform);
        }
    }

    let log = &mut profile.preferences.feedback;
    log.push_back(FeedbackEntry {
        id: Uuid::new_v4(),
        generated_content: input.generated_content,
        user_edit,
        satisfaction: input.satisfaction,
        platform: input.platform,
        content_type: input
            .content_type
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        timestamp: Utc::now(),
    });
    while log.len() > FEEDBACK_CAPACITY {
        log.pop_front();
    }

    profile.preferences.style_consistency_score = consistency_score(log);
    Ok(())
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |v| !v.trim().is_empty())
}

/// Weighted completion score in 0..=100
pub fn calculate_completion(profile: &StyleProfile) -> u8 {
    let mut completion = 0;

    if present(&profile.name) {
        completion += 10;
    }
    if !profile.brand_voice.industry.trim().is_empty() {
        completion += 15;
    }
    if !profile.brand_voice.target_audience.trim().is_empty() {
        completion += 15;
    }
    if profile.writing_style.tone != Tone::default() {
        completion += 15;
    }
    if !profile.content_preferences.topics.is_empty() {
        completion += 15;
    }
    if !profile.brand_voice.adjectives.is_empty() {
        completion += 10;
    }
    if !profile.sample_content.original_posts.is_empty() {
        completion += 20;
    }

    completion
}

/// Store the completion score on the profile. Onboarding, once reached, is
/// never revoked.
pub fn update_completion(profile: &mut StyleProfile) -> u8 {
    let completion = calculate_completion(profile);
    profile.profile_completion = completion;
    if completion >= ONBOARDING_THRESHOLD {
        profile.onboarding_completed = true;
    }
    completion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::models::FormalityLevel;

    fn profile() -> StyleProfile {
        StyleProfile::new("user-1", "user@example.com", None)
    }

    fn feedback(satisfaction: u8) -> FeedbackInput {
        FeedbackInput {
            generated_content: "Generated".to_string(),
            satisfaction,
            ..Default::default()
        }
    }

    #[test]
    fn test_feedback_log_is_bounded_fifo() {
        let mut profile = profile();
        for i in 0..60 {
            let input = FeedbackInput {
                generated_content: format!("post {}", i),
                satisfaction: 3,
                ..Default::default()
            };
            record_feedback(&mut profile, input).unwrap();
            assert!(profile.preferences.feedback.len() <= FEEDBACK_CAPACITY);
        }

        let log = &profile.preferences.feedback;
        assert_eq!(log.len(), FEEDBACK_CAPACITY);
        assert_eq!(log.front().unwrap().generated_content, "post 10");
        assert_eq!(log.back().unwrap().generated_content, "post 59");
    }

    #[test]
    fn test_consistency_uses_last_ten() {
        let mut profile = profile();
        record_feedback(&mut profile, feedback(1)).unwrap();
        for _ in 0..10 {
            record_feedback(&mut profile, feedback(5)).unwrap();
        }
        assert_eq!(profile.preferences.style_consistency_score, 100);
    }

    #[test]
    fn test_consistency_rounds_mean() {
        let mut profile = profile();
        for s in [4, 5, 3] {
            record_feedback(&mut profile, feedback(s)).unwrap();
        }
        assert_eq!(profile.preferences.style_consistency_score, 80);

        record_feedback(&mut profile, feedback(2)).unwrap();
        // mean 3.5 -> 70
        assert_eq!(profile.preferences.style_consistency_score, 70);
    }

    #[test]
    fn test_feedback_validation() {
        let mut profile = profile();
        assert!(matches!(
            record_feedback(&mut profile, feedback(0)),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            record_feedback(&mut profile, feedback(6)),
            Err(Error::Validation(_))
        ));
        let empty = FeedbackInput {
            satisfaction: 4,
            ..Default::default()
        };
        assert!(record_feedback(&mut profile, empty).is_err());
        assert!(profile.preferences.feedback.is_empty());
    }

    #[test]
    fn test_content_type_defaults_to_post() {
        let mut profile = profile();
        record_feedback(&mut profile, feedback(4)).unwrap();
        assert_eq!(profile.preferences.feedback[0].content_type, "post");
    }

    #[test]
    fn test_added_hashtags_set_heavy() {
        let mut profile = profile();
        let input = FeedbackInput {
            generated_content: "Great news!".to_string(),
            user_edit: Some("Great news! #ai #tech #launch".to_string()),
            satisfaction: 4,
            platform: Some(Platform::Twitter),
            content_type: None,
        };
        record_feedback(&mut profile, input).unwrap();
        assert_eq!(
            profile.platform_style(Platform::Twitter).unwrap().hashtag_style,
            Some(HashtagStyle::Heavy)
        );
    }

    #[test]
    fn test_removed_hashtags_set_minimal() {
        let analysis = analyze_edit("Launch #a #b #c", "Launch #a");
        assert_eq!(analysis.hashtag_delta, -2);

        let mut profile = profile();
        apply_edit_analysis(&mut profile, &analysis, Some(Platform::Instagram));
        assert_eq!(
            profile.platform_style(Platform::Instagram).unwrap().hashtag_style,
            Some(HashtagStyle::Minimal)
        );
    }

    #[test]
    fn test_small_hashtag_delta_is_ignored() {
        let mut profile = profile();
        let analysis = analyze_edit("Launch", "Launch #a #b");
        apply_edit_analysis(&mut profile, &analysis, Some(Platform::Facebook));
        assert_eq!(
            profile.platform_style(Platform::Facebook).unwrap().hashtag_style,
            Some(HashtagStyle::Minimal)
        );
    }

    #[test]
    fn test_hashtags_need_platform() {
        let mut profile = profile();
        let before = profile.platform_styles.clone();
        let analysis = analyze_edit("Hi", "Hi #a #b #c #d");
        apply_edit_analysis(&mut profile, &analysis, None);
        assert_eq!(profile.platform_styles, before);
    }

    #[test]
    fn test_formality_steps_toward_casual() {
        let mut profile = profile();
        profile.writing_style.formality_level = FormalityLevel::Formal;
        let analysis = analyze_edit("We are pleased to announce.", "Hey, this is awesome!");
        assert_eq!(analysis.formality, FormalityShift::MoreCasual);

        apply_edit_analysis(&mut profile, &analysis, None);
        assert_eq!(profile.writing_style.formality_level, FormalityLevel::SemiFormal);
        apply_edit_analysis(&mut profile, &analysis, None);
        assert_eq!(profile.writing_style.formality_level, FormalityLevel::Casual);
        apply_edit_analysis(&mut profile, &analysis, None);
        assert_eq!(profile.writing_style.formality_level, FormalityLevel::Casual);
    }

    #[test]
    fn test_formality_steps_toward_formal() {
        let analysis = analyze_edit("Cool launch", "Cool launch. Furthermore, however");
        assert_eq!(analysis.formality, FormalityShift::MoreFormal);

        let mut profile = profile();
        profile.writing_style.formality_level = FormalityLevel::Casual;
        apply_edit_analysis(&mut profile, &analysis, None);
        assert_eq!(profile.writing_style.formality_level, FormalityLevel::SemiFormal);
    }

    #[test]
    fn test_formality_counts_distinct_words() {
        // repeated marker words count once
        assert_eq!(
            detect_formality_shift("wow", "wow wow wow"),
            FormalityShift::NoChange
        );
        assert_eq!(
            detect_formality_shift("plain", "SUPER plain"),
            FormalityShift::MoreCasual
        );
    }

    #[test]
    fn test_questions_added_once() {
        let mut profile = profile();
        let analysis = analyze_edit("Big launch.", "Big launch. Ready?");
        apply_edit_analysis(&mut profile, &analysis, None);
        apply_edit_analysis(&mut profile, &analysis, None);
        assert_eq!(profile.content_preferences.preferred_formats, vec!["questions"]);
    }

    #[test]
    fn test_identical_edit_is_not_analyzed() {
        let mut profile = profile();
        profile.writing_style.formality_level = FormalityLevel::Formal;
        let input = FeedbackInput {
            generated_content: "Hey wow".to_string(),
            user_edit: Some("Hey wow".to_string()),
            satisfaction: 5,
            ..Default::default()
        };
        record_feedback(&mut profile, input).unwrap();
        assert_eq!(profile.writing_style.formality_level, FormalityLevel::Formal);
    }

    #[test]
    fn test_completion_name_only() {
        let mut profile = profile();
        profile.name = Some("Ada".to_string());
        assert_eq!(calculate_completion(&profile), 10);
    }

    #[test]
    fn test_completion_full_profile_onboards() {
        let mut profile = profile();
        profile.name = Some("Ada".to_string());
        profile.brand_voice.industry = "fintech".to_string();
        profile.brand_voice.target_audience = "founders".to_string();
        profile.writing_style.tone = Tone::Friendly;
        profile.content_preferences.topics = vec!["payments".to_string()];
        profile.brand_voice.adjectives = vec!["bold".to_string()];
        profile.sample_content.original_posts = vec!["hello world".to_string()];

        assert_eq!(update_completion(&mut profile), 100);
        assert!(profile.onboarding_completed);
    }

    #[test]
    fn test_completion_at_threshold_onboards() {
        let mut profile = profile();
        profile.name = Some("Ada".to_string());
        profile.brand_voice.industry = "fintech".to_string();
        profile.brand_voice.target_audience = "founders".to_string();
        profile.writing_style.tone = Tone::Friendly;
        profile.brand_voice.adjectives = vec!["bold".to_string()];

        assert_eq!(update_completion(&mut profile), 65);
        assert!(!profile.onboarding_completed);

        profile.content_preferences.topics = vec!["payments".to_string()];
        assert_eq!(update_completion(&mut profile), ONBOARDING_THRESHOLD);
        assert!(profile.onboarding_completed);
    }

    #[test]
    fn test_onboarding_never_regresses() {
        let mut profile = profile();
        profile.onboarding_completed = true;
        assert_eq!(update_completion(&mut profile), 0);
        assert!(profile.onboarding_completed);
    }

    #[test]
    fn test_blank_name_does_not_count() {
        let mut profile = profile();
        profile.name = Some("  ".to_string());
        assert_eq!(calculate_completion(&profile), 0);
    }
}
