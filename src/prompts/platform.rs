//! Target platforms and their static content guidelines

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Social network a post is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Instagram,
    Twitter,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Facebook, Platform::Instagram, Platform::Twitter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Twitter => "twitter",
        }
    }

    pub fn instruction(&self) -> &'static PlatformInstruction {
        match self {
            Self::Facebook => &FACEBOOK,
            Self::Instagram => &INSTAGRAM,
            Self::Twitter => &TWITTER,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "facebook" => Ok(Self::Facebook),
            "instagram" => Ok(Self::Instagram),
            "twitter" => Ok(Self::Twitter),
            _ => Err(Error::UnknownPlatform(s.to_string())),
        }
    }
}

/// Hard limits and capabilities of a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConstraints {
    pub max_length: usize,
    pub supports_hashtags: bool,
    pub supports_images: bool,
    pub supports_video: bool,
    pub supports_links: bool,
    pub recommended_hashtag_count: u8,
}

/// Immutable prompt material for one platform
#[derive(Debug)]
pub struct PlatformInstruction {
    pub platform: Platform,
    pub base_prompt: &'static str,
    pub constraints: PlatformConstraints,
    pub tone_guidelines: &'static [&'static str],
    pub format_guidelines: &'static [&'static str],
    pub engagement_tips: &'static [&'static str],
}

static FACEBOOK: PlatformInstruction = PlatformInstruction {
    platform: Platform::Facebook,
    base_prompt: "You are an expert Facebook content creator. Transform the provided content into engaging Facebook posts that encourage meaningful conversations and community engagement. Focus on storytelling, personal connection, and providing value to the audience.",
    constraints: PlatformConstraints {
        max_length: 8000,
        supports_hashtags: true,
        supports_images: true,
        supports_video: true,
        supports_links: true,
        recommended_hashtag_count: 3,
    },
    tone_guidelines: &[
        "Use a conversational and friendly tone",
        "Write in first or second person to create connection",
        "Include personal anecdotes or relatable experiences when relevant",
        "Encourage discussion with open-ended questions",
        "Be authentic and genuine in your messaging",
    ],
    format_guidelines: &[
        "Start with a compelling hook in the first sentence",
        "Use paragraph breaks for easy reading (mobile-friendly)",
        "Include emojis sparingly for emphasis and emotion",
        "Add 1-3 relevant hashtags at the end",
        "Include a clear call-to-action when appropriate",
        "Keep most important information in the first 2-3 lines",
    ],
    engagement_tips: &[
        "Ask questions to encourage comments",
        "Share behind-the-scenes content or processes",
        "Use storytelling to make content memorable",
        "Reference current events or trending topics when relevant",
        "Include user-generated content opportunities",
        "Share valuable tips, insights, or educational content",
    ],
};

static INSTAGRAM: PlatformInstruction = PlatformInstruction {
    platform: Platform::Instagram,
    base_prompt: "You are a skilled Instagram content strategist. Adapt the provided content for Instagram's visual-first, discovery-focused platform. Create posts that are aesthetically appealing, highly discoverable, and optimized for engagement within Instagram's algorithm.",
    constraints: PlatformConstraints {
        max_length: 2200,
        supports_hashtags: true,
        supports_images: true,
        supports_video: true,
        supports_links: false,
        recommended_hashtag_count: 8,
    },
    tone_guidelines: &[
        "Use an inspiring and aspirational tone",
        "Write with energy and enthusiasm",
        "Be authentic and relatable to your target audience",
        "Use inclusive language that welcomes all followers",
        "Balance professional expertise with personal touch",
    ],
    format_guidelines: &[
        "Create scroll-stopping opening lines",
        "Use strategic line breaks and spacing for visual appeal",
        "Include relevant emojis throughout the text",
        "Add 5-8 strategic hashtags mixed within the caption",
        "End with a strong call-to-action",
        "Use bullet points or numbered lists for easy consumption",
        "Keep captions concise but informative",
    ],
    engagement_tips: &[
        "Include trending and niche hashtags for discoverability",
        "Ask followers to share in comments or stories",
        "Create shareable quotes or tips",
        "Reference Instagram features (Reels, Stories, IGTV)",
        "Encourage saves by providing valuable information",
        "Use location tags when relevant",
        "Tag relevant accounts and collaborators",
    ],
};

static TWITTER: PlatformInstruction = PlatformInstruction {
    platform: Platform::Twitter,
    base_prompt: "You are an expert Twitter content creator specializing in concise, impactful messaging. Transform the provided content into compelling tweets that spark conversation, provide quick value, and encourage engagement within Twitter's fast-paced environment.",
    constraints: PlatformConstraints {
        max_length: 280,
        supports_hashtags: true,
        supports_images: true,
        supports_video: true,
        supports_links: true,
        recommended_hashtag_count: 2,
    },
    tone_guidelines: &[
        "Be direct and to the point",
        "Use a confident and authoritative voice",
        "Inject personality and wit when appropriate",
        "Stay current with trends and cultural moments",
        "Balance professionalism with approachability",
    ],
    format_guidelines: &[
        "Lead with the most important information",
        "Use strategic capitalization for emphasis",
        "Include 1-2 relevant hashtags naturally within the text",
        "Use emojis sparingly for clarity and emotion",
        "Keep threads coherent if content requires multiple tweets",
        "End with clear next steps or calls-to-action",
    ],
    engagement_tips: &[
        "Ask thought-provoking questions",
        "Share quick tips or insights",
        "Comment on trending topics in your niche",
        "Use polls and Twitter features for interaction",
        "Retweet and engage with community content",
        "Share real-time updates and behind-the-scenes content",
        "Participate in relevant Twitter chats and conversations",
    ],
};
