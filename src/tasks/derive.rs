use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::TasksConfig;
use crate::tasks::plan::{ValidPlan, WeeklyCadence};
use crate::tasks::priority::{base_priority, generated_post_priority, rank_tasks};
use crate::tasks::prompt::{build_generation_prompt, fallback_prompt};
use crate::tasks::{Priority, ScheduledPostItem, TaskType, TodayTask};
use crate::{PostType, StrategyPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Today,
    Tomorrow,
    Fallback,
}

impl RequestKind {
    pub fn label(self) -> &'static str {
        match self {
            RequestKind::Today => "today",
            RequestKind::Tomorrow => "tomorrow",
            RequestKind::Fallback => "fallback",
        }
    }
}

/// An outbound AI text-generation request. The deriver only shapes it; the
/// caller decides whether and how to resolve it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub id: String,
    pub kind: RequestKind,
    pub post_type: PostType,
    pub target_date: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub recommended_time: Option<String>,
    pub priority: Priority,
    #[serde(default)]
    pub reason: Option<String>,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DeriveWarning {
    #[serde(rename_all = "camelCase")]
    InvalidDate { value: String, used_date: NaiveDate },
    #[serde(rename_all = "camelCase")]
    InvalidTimezone { value: String, used_timezone: String },
}

impl DeriveWarning {
    pub fn message(&self) -> String {
        match self {
            DeriveWarning::InvalidDate { value, used_date } => {
                format!("invalid date {:?}; using host date {}", value, used_date)
            }
            DeriveWarning::InvalidTimezone {
                value,
                used_timezone,
            } => format!("invalid timezone {:?}; using {}", value, used_timezone),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeriveTodayTasksOutput {
    pub date: NaiveDate,
    pub timezone: String,
    pub base_tasks: Vec<TodayTask>,
    pub ai_requests: Vec<GenerationRequest>,
    pub tomorrow_requests: Vec<GenerationRequest>,
    pub fallback_request: Option<GenerationRequest>,
    #[serde(default)]
    pub warnings: Vec<DeriveWarning>,
}

impl DeriveTodayTasksOutput {
    /// Whether anything besides the fallback is actionable. The fallback
    /// request is present exactly when this is false.
    pub fn has_plan_driven_items(&self) -> bool {
        !self.base_tasks.is_empty()
            || !self.ai_requests.is_empty()
            || !self.tomorrow_requests.is_empty()
    }

    /// Every request the caller may want to resolve, fallback last.
    pub fn all_requests(&self) -> Vec<&GenerationRequest> {
        self.ai_requests
            .iter()
            .chain(self.tomorrow_requests.iter())
            .chain(self.fallback_request.iter())
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeriveTodayTasksInput<'a> {
    pub plan: Option<&'a StrategyPlan>,
    /// Local date as "YYYY-MM-DD".
    pub date: &'a str,
    /// IANA zone name; empty means the configured default.
    pub timezone: &'a str,
    pub scheduled_posts: &'a [ScheduledPostItem],
    pub now: DateTime<Utc>,
}

enum LocalClock {
    Zone(Tz),
    Host,
}

impl LocalClock {
    fn date_of(&self, instant: &DateTime<Utc>) -> NaiveDate {
        match self {
            LocalClock::Zone(tz) => instant.with_timezone(tz).date_naive(),
            LocalClock::Host => instant.with_timezone(&Local).date_naive(),
        }
    }

    fn time_of(&self, instant: &DateTime<Utc>) -> String {
        match self {
            LocalClock::Zone(tz) => instant.with_timezone(tz).format("%H:%M").to_string(),
            LocalClock::Host => instant.with_timezone(&Local).format("%H:%M").to_string(),
        }
    }

    fn name(&self) -> String {
        match self {
            LocalClock::Zone(tz) => tz.name().to_string(),
            LocalClock::Host => "local".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskDeriver {
    config: TasksConfig,
}

impl TaskDeriver {
    pub fn new(config: TasksConfig) -> Self {
        Self { config }
    }

    pub fn derive(&self, input: &DeriveTodayTasksInput<'_>) -> DeriveTodayTasksOutput {
        let mut warnings = Vec::new();

        let zone_name = match input.timezone.trim() {
            "" => self.config.default_timezone.trim(),
            name => name,
        };
        let clock = match zone_name.parse::<Tz>() {
            Ok(tz) => LocalClock::Zone(tz),
            Err(_) => {
                tracing::warn!(timezone = zone_name, "unknown timezone, using host zone");
                warnings.push(DeriveWarning::InvalidTimezone {
                    value: zone_name.to_string(),
                    used_timezone: LocalClock::Host.name(),
                });
                LocalClock::Host
            }
        };

        let today = match NaiveDate::parse_from_str(input.date.trim(), "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => {
                let host_date = input.now.with_timezone(&Local).date_naive();
                tracing::warn!(date = input.date, %host_date, "unparsable date, using host date");
                warnings.push(DeriveWarning::InvalidDate {
                    value: input.date.to_string(),
                    used_date: host_date,
                });
                host_date
            }
        };
        let tomorrow = today.succ_opt().unwrap_or(today);

        let plan = input.plan.and_then(|plan| match plan.validate() {
            Ok(valid) => Some(valid),
            Err(err) => {
                tracing::debug!(error = %err, "plan unusable for task derivation");
                None
            }
        });

        let scheduled_today = scheduled_on(input.scheduled_posts, &clock, today);
        let scheduled_tomorrow = scheduled_on(input.scheduled_posts, &clock, tomorrow);

        let mut base_tasks: Vec<TodayTask> = scheduled_today
            .iter()
            .map(|post| scheduled_task(post, &clock))
            .collect();

        let mut ai_requests = Vec::new();
        let mut tomorrow_requests = Vec::new();

        if let Some(plan) = plan.as_ref() {
            if let Some(target) = plan.plan.daily_comment_target.filter(|target| *target > 0) {
                base_tasks.push(comment_task(today, target));
            }

            let cadence = WeeklyCadence::from_plan(plan);
            let strongest = plan.strongest_types();
            if plan.is_active_on(today) {
                ai_requests = self.plan_requests(
                    plan,
                    &cadence,
                    &strongest,
                    today,
                    &scheduled_today,
                    RequestKind::Today,
                );
            }
            if plan.is_active_on(tomorrow) {
                tomorrow_requests = self.plan_requests(
                    plan,
                    &cadence,
                    &strongest,
                    tomorrow,
                    &scheduled_tomorrow,
                    RequestKind::Tomorrow,
                );
                tomorrow_requests.truncate(self.config.tomorrow_limit);
            }
        }

        let mut output = DeriveTodayTasksOutput {
            date: today,
            timezone: clock.name(),
            base_tasks: rank_tasks(base_tasks),
            ai_requests,
            tomorrow_requests,
            fallback_request: None,
            warnings,
        };
        if !output.has_plan_driven_items() {
            output.fallback_request = Some(self.fallback_request(today));
        }
        output
    }

    fn plan_requests(
        &self,
        plan: &ValidPlan<'_>,
        cadence: &WeeklyCadence,
        strongest: &[PostType],
        date: NaiveDate,
        scheduled: &[&ScheduledPostItem],
        kind: RequestKind,
    ) -> Vec<GenerationRequest> {
        let mut requests = Vec::new();

        for entry in cadence.due_on(date.weekday()) {
            let already_scheduled = scheduled
                .iter()
                .filter(|post| post.post_type == entry.post_type)
                .count() as u32;
            let missing = entry.count.saturating_sub(already_scheduled);
            let time = entry
                .time
                .clone()
                .unwrap_or_else(|| self.config.default_time(entry.post_type).to_string());

            for ordinal in 0..missing {
                requests.push(GenerationRequest {
                    id: request_id(kind, date, entry.post_type, ordinal),
                    kind,
                    post_type: entry.post_type,
                    target_date: date,
                    title: request_title(kind, entry.post_type),
                    recommended_time: Some(time.clone()),
                    priority: generated_post_priority(entry.post_type, strongest),
                    reason: Some(entry.reason.clone()),
                    prompt: build_generation_prompt(plan.plan, entry.post_type, date, Some(&time)),
                });
            }
        }

        requests.sort_by_key(|request| request.priority.rank());
        requests
    }

    fn fallback_request(&self, date: NaiveDate) -> GenerationRequest {
        GenerationRequest {
            id: request_id(RequestKind::Fallback, date, PostType::Feed, 0),
            kind: RequestKind::Fallback,
            post_type: PostType::Feed,
            target_date: date,
            title: request_title(RequestKind::Fallback, PostType::Feed),
            recommended_time: Some(self.config.default_time(PostType::Feed).to_string()),
            priority: Priority::Medium,
            reason: Some("Nothing else is planned for today".to_string()),
            prompt: fallback_prompt(date),
        }
    }
}

/// Derives today's tasks with the default configuration.
pub fn derive_today_tasks_from_plan(
    plan: Option<&StrategyPlan>,
    date: &str,
    timezone: &str,
    scheduled_posts: &[ScheduledPostItem],
    now: DateTime<Utc>,
) -> DeriveTodayTasksOutput {
    TaskDeriver::default().derive(&DeriveTodayTasksInput {
        plan,
        date,
        timezone,
        scheduled_posts,
        now,
    })
}

fn scheduled_on<'a>(
    posts: &'a [ScheduledPostItem],
    clock: &LocalClock,
    date: NaiveDate,
) -> Vec<&'a ScheduledPostItem> {
    let mut matching: Vec<&ScheduledPostItem> = posts
        .iter()
        .filter(|post| clock.date_of(&post.scheduled_time) == date)
        .collect();
    matching.sort_by_key(|post| post.scheduled_time);
    matching
}

fn scheduled_task(post: &ScheduledPostItem, clock: &LocalClock) -> TodayTask {
    let task_type = TaskType::from(post.post_type);
    let time = clock.time_of(&post.scheduled_time);
    let title = if post.title.trim().is_empty() {
        format!("Publish scheduled {}", post.post_type.display_name())
    } else {
        post.title.trim().to_string()
    };
    let content = Some(post.content.trim())
        .filter(|content| !content.is_empty())
        .map(str::to_string);

    TodayTask {
        id: format!("scheduled-{}", post.id),
        task_type,
        title,
        description: format!("Goes live at {}; review the caption before it publishes.", time),
        recommended_time: Some(time),
        content,
        hashtags: None,
        count: None,
        reason: Some("Already scheduled".to_string()),
        priority: base_priority(task_type),
    }
}

fn comment_task(date: NaiveDate, target: u32) -> TodayTask {
    TodayTask {
        id: format!("comment-{}", date.format("%Y-%m-%d")),
        task_type: TaskType::Comment,
        title: "Reply and engage".to_string(),
        description: format!(
            "Answer new comments and leave {} thoughtful comments on accounts in your niche.",
            target
        ),
        recommended_time: None,
        content: None,
        hashtags: None,
        count: Some(target),
        reason: Some("Daily engagement target from the plan".to_string()),
        priority: base_priority(TaskType::Comment),
    }
}

fn request_title(kind: RequestKind, post_type: PostType) -> String {
    match kind {
        RequestKind::Today => format!("Create today's {}", post_type.display_name()),
        RequestKind::Tomorrow => format!("Prepare tomorrow's {}", post_type.display_name()),
        RequestKind::Fallback => "Draft a feed post for today".to_string(),
    }
}

fn request_id(kind: RequestKind, date: NaiveDate, post_type: PostType, ordinal: u32) -> String {
    let payload = format!(
        "{}:{}:{}:{}",
        kind.label(),
        date.format("%Y-%m-%d"),
        post_type.label(),
        ordinal
    );
    format!(
        "{}-{}-{:012x}",
        kind.label(),
        post_type.label(),
        stable_hash64(&payload) >> 16
    )
}

fn stable_hash64(value: &str) -> u64 {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}
