use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use content_ops::tasks::{DeriveTodayTasksOutput, ScheduledPostItem, TodayTask};
use content_ops::StrategyPlan;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayTasksRequest {
    pub user_id: Option<String>,
    pub plan: Option<StrategyPlan>,
    pub date: Option<String>,
    pub timezone: Option<String>,
    #[serde(default)]
    pub scheduled_posts: Vec<ScheduledPostItem>,
    /// Overrides the server clock, mostly for reproducible calls.
    pub now: Option<DateTime<Utc>>,
    pub resolve_ai: Option<bool>,
    pub refresh: Option<bool>,
}

impl TodayTasksRequest {
    pub fn user_id(&self) -> Result<String, String> {
        let user_id = self.user_id.as_deref().unwrap_or_default().trim();
        if user_id.is_empty() {
            return Err("userId is required".to_string());
        }
        Ok(user_id.to_string())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayTasksResponse {
    pub user_id: String,
    pub date: String,
    pub timezone: String,
    pub tasks: Vec<TodayTask>,
    pub tomorrow: Vec<TodayTask>,
    pub derivation: DeriveTodayTasksOutput,
    pub cached: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
