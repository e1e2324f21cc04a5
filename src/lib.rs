pub mod cache;
pub mod config;
pub mod error;
pub mod generation;
pub mod kpi;
pub mod logging;
pub mod tasks;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum PostType {
    #[default]
    Feed,
    Reel,
    Story,
}

impl PostType {
    pub const ALL: [PostType; 3] = [PostType::Feed, PostType::Reel, PostType::Story];

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "feed" | "post" | "image" | "carousel" => Some(PostType::Feed),
            "reel" | "reels" | "video" => Some(PostType::Reel),
            "story" | "stories" => Some(PostType::Story),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PostType::Feed => "feed",
            PostType::Reel => "reel",
            PostType::Story => "story",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PostType::Feed => "feed post",
            PostType::Reel => "reel",
            PostType::Story => "story",
        }
    }

    pub fn plural_name(self) -> &'static str {
        match self {
            PostType::Feed => "feed posts",
            PostType::Reel => "reels",
            PostType::Story => "stories",
        }
    }
}

impl TryFrom<String> for PostType {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        PostType::from_str(&value).ok_or_else(|| format!("unknown post type: {}", value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum PostStatus {
    #[default]
    Draft,
    Scheduled,
    Published,
}

impl From<String> for PostStatus {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "scheduled" => PostStatus::Scheduled,
            "published" | "posted" => PostStatus::Published,
            _ => PostStatus::Draft,
        }
    }
}

/// Hashtags as stored upstream: either a list (whose entries may each hold
/// several `#tag` tokens) or one delimited string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawHashtags {
    List(Vec<String>),
    Text(String),
}

impl Default for RawHashtags {
    fn default() -> Self {
        RawHashtags::List(Vec::new())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub hashtags: Option<RawHashtags>,
    #[serde(default)]
    pub post_type: PostType,
    #[serde(default)]
    pub scheduled_date: Option<String>,
    #[serde(default)]
    pub scheduled_time: Option<String>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct GenderShares {
    #[serde(default)]
    pub male: f64,
    #[serde(default)]
    pub female: f64,
    #[serde(default)]
    pub other: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct AgeShares {
    #[serde(rename = "18-24", default)]
    pub age_18_24: f64,
    #[serde(rename = "25-34", default)]
    pub age_25_34: f64,
    #[serde(rename = "35-44", default)]
    pub age_35_44: f64,
    #[serde(rename = "45-54", default)]
    pub age_45_54: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct AudienceData {
    #[serde(default)]
    pub gender: GenderShares,
    #[serde(default)]
    pub age: AgeShares,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRecord {
    pub post_id: String,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub shares: u64,
    #[serde(default)]
    pub saves: u64,
    #[serde(default)]
    pub reach: u64,
    #[serde(default)]
    pub impressions: Option<u64>,
    #[serde(default)]
    pub follower_increase: i64,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Local posting time as "HH:MM".
    #[serde(default)]
    pub published_time: Option<String>,
    #[serde(default)]
    pub audience: Option<AudienceData>,
}

impl AnalyticsRecord {
    /// (likes + comments + shares) / reach as a percentage, reach floored at 1.
    pub fn engagement_rate(&self) -> f64 {
        let interactions = (self.likes + self.comments + self.shares) as f64;
        interactions / self.reach.max(1) as f64 * 100.0
    }
}

/// A post joined to its analytics, with hashtags already normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWithAnalytics {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub post_type: PostType,
    pub status: PostStatus,
    pub hashtags: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub analytics_summary: Option<AnalyticsRecord>,
}

impl PostWithAnalytics {
    pub fn from_parts(post: &PostRecord, analytics: Option<AnalyticsRecord>) -> Self {
        let hashtags = post
            .hashtags
            .as_ref()
            .map(kpi::hashtags::normalize_hashtags)
            .unwrap_or_default();
        Self {
            id: post.id.clone(),
            user_id: post.user_id.clone(),
            title: post.title.clone(),
            post_type: post.post_type,
            status: post.status,
            hashtags,
            published_at: post.published_at,
            analytics_summary: analytics,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AiPersona {
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub personality: String,
    #[serde(default)]
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostQuota {
    pub post_type: PostType,
    #[serde(default)]
    pub weekly_count: Option<f64>,
    #[serde(default)]
    pub follower_effect: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub day: String,
    pub post_type: PostType,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StrategyPlan {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub target_followers: Option<u64>,
    #[serde(default)]
    pub current_followers: Option<u64>,
    #[serde(default)]
    pub period_start: Option<NaiveDate>,
    #[serde(default)]
    pub period_end: Option<NaiveDate>,
    #[serde(default)]
    pub post_quotas: Vec<PostQuota>,
    #[serde(default)]
    pub posting_schedule: Vec<ScheduleEntry>,
    #[serde(default)]
    pub ai_persona: AiPersona,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub strategy: String,
    #[serde(default)]
    pub daily_comment_target: Option<u32>,
}

pub fn format_number(value: f64) -> String {
    let rounded = value.round() as i64;
    let negative = rounded < 0;
    let mut chars: Vec<char> = rounded.abs().to_string().chars().collect();
    let mut result = String::new();
    let mut count = 0usize;

    while let Some(ch) = chars.pop() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(ch);
        count += 1;
    }
    if negative {
        result.push('-');
    }

    result.chars().rev().collect()
}

/// Formats a value that is already a percentage.
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

pub fn format_float(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}
