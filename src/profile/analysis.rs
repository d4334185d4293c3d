//! AI-assisted writing style analysis of sample posts

use super::engine::update_completion;
use super::models::{
    AnalyzedPatterns, FormalityLevel, HumorStyle, Personality, StyleProfile, Tone,
    VocabularyLevel,
};
use crate::error::{Error, Result};
use crate::inference::InferenceError;
use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const ANALYST_SYSTEM_PROMPT: &str = "You are an expert content strategist and writing style analyst. Analyze social media posts to identify unique writing patterns, voice, and style characteristics. You must respond with ONLY valid JSON, no markdown formatting, no code blocks, no other text.";

const RESPONSE_SCHEMA: &str = r#"{
  "tone": "professional|casual|friendly|authoritative|conversational|humorous",
  "personality": "enthusiastic|calm|witty|inspiring|analytical|storyteller",
  "formalityLevel": "very-formal|formal|semi-formal|casual|very-casual",
  "humorStyle": "none|subtle|witty|playful|sarcastic",
  "vocabularyLevel": "simple|intermediate|advanced|expert",
  "averageLength": 150,
  "commonPhrases": ["example phrase"],
  "sentenceStructure": "description of typical sentence patterns",
  "contentThemes": ["theme1", "theme2"],
  "styleNotes": "additional observations about writing style",
  "brandAdjectives": ["adjective1", "adjective2"],
  "recommendedImprovements": ["suggestion1", "suggestion2"]
}"#;

/// Model verdict on a set of sample posts. Every field is optional and enum
/// labels are kept as text until applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleAnalysis {
    pub tone: Option<String>,
    pub personality: Option<String>,
    pub formality_level: Option<String>,
    pub humor_style: Option<String>,
    pub vocabulary_level: Option<String>,
    pub average_length: Option<f64>,
    pub common_phrases: Option<Vec<String>>,
    pub sentence_structure: Option<String>,
    pub content_themes: Option<Vec<String>>,
    pub style_notes: Option<String>,
    pub brand_adjectives: Option<Vec<String>>,
    pub recommended_improvements: Option<Vec<String>>,
}

/// User prompt asking for a JSON analysis of the numbered posts
pub fn build_analysis_prompt(posts: &[String]) -> String {
    let numbered: String = posts
        .iter()
        .enumerate()
        .map(|(i, post)| format!("\n{}. {}", i + 1, post))
        .collect();

    format!(
        "Analyze the following social media posts to identify the author's writing style, tone, and patterns. \n\n\
         Return ONLY a valid JSON object with this exact structure (NO markdown, NO code blocks, NO backticks):\n\n\
         {}\n\n\
         Posts to analyze:\n{}\n\n\
         IMPORTANT: Return ONLY the JSON object starting with {{ and ending with }}. Do not use markdown formatting, code blocks, or backticks.",
        RESPONSE_SCHEMA, numbered
    )
}

/// Strip code fences and stray backticks around a JSON payload
fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        text = rest.strip_prefix("json").unwrap_or(rest);
        text = text.trim_end();
        text = text.strip_suffix("```").unwrap_or(text);
    }

    text.trim_matches('`').trim()
}

pub fn parse_analysis(raw: &str) -> Result<StyleAnalysis> {
    let cleaned = strip_fences(raw);
    if cleaned.is_empty() {
        return Err(InferenceError::InvalidResponse("empty style analysis".to_string()).into());
    }

    serde_json::from_str(cleaned).map_err(|e| {
        Error::from(InferenceError::InvalidResponse(format!(
            "Failed to parse AI analysis: {}",
            e
        )))
    })
}

/// Fold an analysis into the profile and refresh completion.
///
/// Unknown enum labels leave the current value in place.
pub fn apply_analysis(profile: &mut StyleProfile, posts: Vec<String>, analysis: &StyleAnalysis) -> u8 {
    profile.sample_content.original_posts = posts;
    profile.sample_content.analyzed_patterns = AnalyzedPatterns {
        average_length: analysis
            .average_length
            .map(|len| len.max(0.0).round() as u32)
            .unwrap_or(0),
        common_phrases: analysis.common_phrases.clone().unwrap_or_default(),
        sentence_structure: analysis.sentence_structure.clone().unwrap_or_default(),
        vocabulary_level: analysis
            .vocabulary_level
            .as_deref()
            .and_then(VocabularyLevel::parse)
            .unwrap_or_default(),
        style_notes: analysis.style_notes.clone().unwrap_or_default(),
    };

    let style = &mut profile.writing_style;
    if let Some(tone) = analysis.tone.as_deref().and_then(Tone::parse) {
        style.tone = tone;
    }
    if let Some(personality) = analysis.personality.as_deref().and_then(Personality::parse) {
        style.personality = personality;
    }
    if let Some(level) = analysis.formality_level.as_deref().and_then(FormalityLevel::parse) {
        style.formality_level = level;
    }
    if let Some(humor) = analysis.humor_style.as_deref().and_then(HumorStyle::parse) {
        style.humor_style = humor;
    }

    if let Some(adjectives) = &analysis.brand_adjectives {
        profile.brand_voice.adjectives = adjectives.clone();
    }
    if let Some(themes) = &analysis.content_themes {
        profile.content_preferences.topics = themes.clone();
    }

    profile.preferences.last_analyzed = Some(Utc::now());
    update_completion(profile)
}
