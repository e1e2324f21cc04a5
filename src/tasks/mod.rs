//! Daily task derivation from a stored strategy plan.
//!
//! Everything in here is a pure function of its arguments: the current
//! instant is always passed in, never read from the clock.

pub mod days;
pub mod derive;
pub mod merge;
pub mod plan;
pub mod priority;
pub mod prompt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PostType;

pub use derive::{
    derive_today_tasks_from_plan, DeriveTodayTasksInput, DeriveTodayTasksOutput, DeriveWarning,
    GenerationRequest, RequestKind, TaskDeriver,
};
pub use merge::{merge_generated_tasks, GeneratedContent, GenerationOutcome, MergedTasks};
pub use plan::{PlanError, ValidPlan, WeeklyCadence};
pub use priority::rank_tasks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Story,
    Comment,
    Feed,
    Reel,
}

impl From<PostType> for TaskType {
    fn from(value: PostType) -> Self {
        match value {
            PostType::Feed => TaskType::Feed,
            PostType::Reel => TaskType::Reel,
            PostType::Story => TaskType::Story,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Sort key, lower comes first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodayTask {
    pub id: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashtags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub priority: Priority,
}

/// A post that already has content and a publish slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPostItem {
    pub id: String,
    #[serde(rename = "type")]
    pub post_type: PostType,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub title: String,
    pub scheduled_time: DateTime<Utc>,
}
