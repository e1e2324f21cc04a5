use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;

use content_ops::config::TasksConfig;
use content_ops::tasks::{
    derive_today_tasks_from_plan, merge_generated_tasks, rank_tasks, DeriveTodayTasksInput,
    DeriveWarning, GeneratedContent, GenerationOutcome, Priority, RequestKind,
    ScheduledPostItem, TaskDeriver, TaskType, TodayTask,
};
use content_ops::{PostQuota, PostType, ScheduleEntry, StrategyPlan};

// 2024-05-06 is a Monday.
const MONDAY: &str = "2024-05-06";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap()
}

fn quota(post_type: PostType, weekly: f64, effect: f64) -> PostQuota {
    PostQuota {
        post_type,
        weekly_count: Some(weekly),
        follower_effect: Some(effect),
    }
}

fn plan(quotas: Vec<PostQuota>) -> StrategyPlan {
    StrategyPlan {
        id: Some("plan-1".to_string()),
        target_followers: Some(5_000),
        current_followers: Some(1_200),
        post_quotas: quotas,
        category: "coffee".to_string(),
        target_audience: "home baristas".to_string(),
        ..StrategyPlan::default()
    }
}

fn scheduled(id: &str, post_type: PostType, hour: u32) -> ScheduledPostItem {
    ScheduledPostItem {
        id: id.to_string(),
        post_type,
        content: "Latte art basics".to_string(),
        title: String::new(),
        scheduled_time: Utc.with_ymd_and_hms(2024, 5, 6, hour, 0, 0).unwrap(),
    }
}

fn task(id: &str, priority: Priority) -> TodayTask {
    TodayTask {
        id: id.to_string(),
        task_type: TaskType::Feed,
        title: id.to_string(),
        description: String::new(),
        recommended_time: None,
        content: None,
        hashtags: None,
        count: None,
        reason: None,
        priority,
    }
}

#[test]
fn no_plan_yields_only_the_fallback() {
    content_ops::logging::init_test();
    let output = derive_today_tasks_from_plan(None, MONDAY, "Asia/Tokyo", &[], now());

    assert!(output.base_tasks.is_empty());
    assert!(output.ai_requests.is_empty());
    assert!(output.tomorrow_requests.is_empty());
    let fallback = output.fallback_request.as_ref().unwrap();
    assert_eq!(fallback.kind, RequestKind::Fallback);
    assert_eq!(fallback.post_type, PostType::Feed);
    assert_eq!(output.timezone, "Asia/Tokyo");
    assert!(output.warnings.is_empty());
}

#[test]
fn malformed_plan_is_treated_as_missing() {
    let mut broken = plan(vec![quota(PostType::Feed, 7.0, 1.0)]);
    broken.target_followers = None;

    let output = derive_today_tasks_from_plan(Some(&broken), MONDAY, "UTC", &[], now());
    assert!(output.ai_requests.is_empty());
    assert!(output.fallback_request.is_some());
    assert!(output.warnings.is_empty());
}

#[test]
fn derivation_is_never_empty() {
    let inputs = [
        (None, MONDAY),
        (Some(plan(Vec::new())), MONDAY),
        (Some(plan(vec![quota(PostType::Feed, 1.0, 1.0)])), "2024-05-12"),
    ];
    for (plan, date) in inputs.iter() {
        let output = derive_today_tasks_from_plan(plan.as_ref(), date, "UTC", &[], now());
        assert!(
            output.has_plan_driven_items() || output.fallback_request.is_some(),
            "empty derivation for {}",
            date
        );
        assert_eq!(
            output.fallback_request.is_some(),
            !output.has_plan_driven_items()
        );
    }
}

#[test]
fn derivation_is_deterministic() {
    let plan = plan(vec![
        quota(PostType::Feed, 3.0, 2.0),
        quota(PostType::Reel, 4.0, 5.0),
        quota(PostType::Story, 7.0, 0.5),
    ]);
    let posts = vec![scheduled("s1", PostType::Story, 3)];

    let first = derive_today_tasks_from_plan(Some(&plan), MONDAY, "Asia/Tokyo", &posts, now());
    let second = derive_today_tasks_from_plan(Some(&plan), MONDAY, "Asia/Tokyo", &posts, now());
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn quotas_are_spread_from_monday() {
    let plan = plan(vec![quota(PostType::Feed, 3.0, 1.0)]);

    let monday = derive_today_tasks_from_plan(Some(&plan), MONDAY, "UTC", &[], now());
    assert_eq!(monday.ai_requests.len(), 1);
    assert_eq!(monday.ai_requests[0].post_type, PostType::Feed);
    assert_eq!(monday.ai_requests[0].recommended_time.as_deref(), Some("19:00"));
    // Tuesday has nothing due.
    assert!(monday.tomorrow_requests.is_empty());
    assert!(monday.fallback_request.is_none());

    let tuesday = derive_today_tasks_from_plan(Some(&plan), "2024-05-07", "UTC", &[], now());
    assert!(tuesday.ai_requests.is_empty());
    assert_eq!(tuesday.tomorrow_requests.len(), 1);
    assert_eq!(tuesday.tomorrow_requests[0].kind, RequestKind::Tomorrow);
}

#[test]
fn strongest_post_type_gets_high_priority() {
    let plan = plan(vec![
        quota(PostType::Feed, 7.0, 1.0),
        quota(PostType::Reel, 7.0, 4.0),
        quota(PostType::Story, 7.0, 9.0),
    ]);
    let output = derive_today_tasks_from_plan(Some(&plan), MONDAY, "UTC", &[], now());

    let priority_of = |post_type: PostType| {
        output
            .ai_requests
            .iter()
            .find(|request| request.post_type == post_type)
            .map(|request| request.priority)
    };
    // Story stays medium even with the largest effect.
    assert_eq!(priority_of(PostType::Story), Some(Priority::Medium));
    assert_eq!(priority_of(PostType::Feed), Some(Priority::Medium));
}

#[test]
fn scheduled_posts_become_tasks_and_fill_quota() {
    let plan = plan(vec![quota(PostType::Feed, 7.0, 3.0)]);
    // 10:00 UTC is 19:00 in Tokyo.
    let posts = vec![scheduled("42", PostType::Feed, 10)];

    let output = derive_today_tasks_from_plan(Some(&plan), MONDAY, "Asia/Tokyo", &posts, now());
    assert_eq!(output.base_tasks.len(), 1);
    let base = &output.base_tasks[0];
    assert_eq!(base.id, "scheduled-42");
    assert_eq!(base.task_type, TaskType::Feed);
    assert_eq!(base.priority, Priority::High);
    assert_eq!(base.recommended_time.as_deref(), Some("19:00"));
    assert_eq!(base.content.as_deref(), Some("Latte art basics"));
    assert!(output.ai_requests.is_empty());
    assert_eq!(output.tomorrow_requests.len(), 1);
}

#[test]
fn scheduled_posts_without_plan_still_show_up() {
    let posts = vec![scheduled("7", PostType::Reel, 12)];
    let output = derive_today_tasks_from_plan(None, MONDAY, "UTC", &posts, now());
    assert_eq!(output.base_tasks.len(), 1);
    assert_eq!(output.base_tasks[0].task_type, TaskType::Reel);
    assert!(output.fallback_request.is_none());
}

#[test]
fn daily_comment_target_adds_low_priority_task() {
    let mut plan = plan(Vec::new());
    plan.daily_comment_target = Some(15);

    let output = derive_today_tasks_from_plan(Some(&plan), MONDAY, "UTC", &[], now());
    assert_eq!(output.base_tasks.len(), 1);
    let comment = &output.base_tasks[0];
    assert_eq!(comment.task_type, TaskType::Comment);
    assert_eq!(comment.priority, Priority::Low);
    assert_eq!(comment.count, Some(15));
    assert!(output.fallback_request.is_none());
}

#[test]
fn explicit_schedule_accepts_japanese_day_labels() {
    let mut plan = plan(vec![quota(PostType::Reel, 7.0, 1.0)]);
    plan.posting_schedule = vec![
        ScheduleEntry {
            day: "月曜日".to_string(),
            post_type: PostType::Reel,
            time: Some("21:30".to_string()),
        },
        ScheduleEntry {
            day: "水".to_string(),
            post_type: PostType::Reel,
            time: None,
        },
    ];

    let monday = derive_today_tasks_from_plan(Some(&plan), MONDAY, "UTC", &[], now());
    assert_eq!(monday.ai_requests.len(), 1);
    assert_eq!(monday.ai_requests[0].recommended_time.as_deref(), Some("21:30"));
    // The schedule replaces the daily quota spread.
    assert!(monday.tomorrow_requests.is_empty());

    let tuesday = derive_today_tasks_from_plan(Some(&plan), "2024-05-07", "UTC", &[], now());
    assert_eq!(tuesday.tomorrow_requests.len(), 1);
    assert_eq!(tuesday.tomorrow_requests[0].recommended_time.as_deref(), Some("20:00"));
}

#[test]
fn tomorrow_requests_are_limited() {
    let plan = plan(vec![
        quota(PostType::Feed, 14.0, 1.0),
        quota(PostType::Reel, 14.0, 1.0),
        quota(PostType::Story, 14.0, 1.0),
    ]);
    let output = derive_today_tasks_from_plan(Some(&plan), MONDAY, "UTC", &[], now());
    assert_eq!(output.ai_requests.len(), 6);
    assert_eq!(output.tomorrow_requests.len(), 3);

    let deriver = TaskDeriver::new(TasksConfig {
        tomorrow_limit: 1,
        ..TasksConfig::default()
    });
    let limited = deriver.derive(&DeriveTodayTasksInput {
        plan: Some(&plan),
        date: MONDAY,
        timezone: "UTC",
        scheduled_posts: &[],
        now: now(),
    });
    assert_eq!(limited.tomorrow_requests.len(), 1);
}

#[test]
fn plan_period_gates_requests() {
    let mut plan = plan(vec![quota(PostType::Feed, 7.0, 1.0)]);
    plan.period_end = chrono::NaiveDate::from_ymd_opt(2024, 5, 6);

    let output = derive_today_tasks_from_plan(Some(&plan), MONDAY, "UTC", &[], now());
    assert_eq!(output.ai_requests.len(), 1);
    assert!(output.tomorrow_requests.is_empty());
}

#[test]
fn request_ids_are_stable_and_distinct() {
    let plan = plan(vec![quota(PostType::Feed, 14.0, 1.0)]);
    let output = derive_today_tasks_from_plan(Some(&plan), MONDAY, "UTC", &[], now());
    let ids: Vec<&str> = output.all_requests().iter().map(|r| r.id.as_str()).collect();

    assert_eq!(ids.len(), 4);
    for (i, id) in ids.iter().enumerate() {
        assert!(id.starts_with("today-feed-") || id.starts_with("tomorrow-feed-"));
        assert!(!ids[i + 1..].contains(id), "duplicate id {}", id);
    }
}

#[test]
fn invalid_timezone_and_date_produce_warnings() {
    content_ops::logging::init_test();
    let output = derive_today_tasks_from_plan(None, "not-a-date", "Mars/Olympus", &[], now());

    assert_eq!(output.timezone, "local");
    assert_eq!(output.warnings.len(), 2);
    assert!(matches!(
        &output.warnings[0],
        DeriveWarning::InvalidTimezone { value, .. } if value == "Mars/Olympus"
    ));
    assert!(matches!(
        &output.warnings[1],
        DeriveWarning::InvalidDate { value, .. } if value == "not-a-date"
    ));
    assert!(output.fallback_request.is_some());
}

#[test]
fn empty_timezone_uses_configured_default() {
    let deriver = TaskDeriver::new(TasksConfig {
        default_timezone: "Europe/Paris".to_string(),
        ..TasksConfig::default()
    });
    let output = deriver.derive(&DeriveTodayTasksInput {
        plan: None,
        date: MONDAY,
        timezone: "",
        scheduled_posts: &[],
        now: now(),
    });
    assert_eq!(output.timezone, "Europe/Paris");
    assert!(output.warnings.is_empty());
}

#[test]
fn ranking_is_stable_within_a_tier() {
    let ranked = rank_tasks(vec![
        task("low-1", Priority::Low),
        task("high-1", Priority::High),
        task("medium-1", Priority::Medium),
        task("high-2", Priority::High),
        task("low-2", Priority::Low),
    ]);
    let ids: Vec<&str> = ranked.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["high-1", "high-2", "medium-1", "low-1", "low-2"]);
}

#[test]
fn merge_attaches_generated_content() {
    let mut plan = plan(vec![quota(PostType::Reel, 7.0, 2.0)]);
    plan.daily_comment_target = Some(5);
    let output = derive_today_tasks_from_plan(Some(&plan), MONDAY, "UTC", &[], now());

    let today_id = output.ai_requests[0].id.clone();
    let tomorrow_id = output.tomorrow_requests[0].id.clone();
    let mut outcomes = HashMap::new();
    outcomes.insert(
        today_id.clone(),
        GenerationOutcome::Generated(GeneratedContent {
            title: Some("Pour-over in 60 seconds".to_string()),
            content: "Step one: rinse the filter.".to_string(),
            hashtags: vec!["coffee".to_string()],
        }),
    );
    outcomes.insert(
        tomorrow_id.clone(),
        GenerationOutcome::Failed {
            reason: "timed out".to_string(),
        },
    );

    let merged = merge_generated_tasks(&output, &outcomes);
    let ids: Vec<&str> = merged.today.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec![today_id.as_str(), "comment-2024-05-06"]);

    let reel = &merged.today[0];
    assert_eq!(reel.priority, Priority::High);
    assert_eq!(reel.content.as_deref(), Some("Step one: rinse the filter."));
    assert_eq!(reel.hashtags.as_ref().map(Vec::len), Some(1));

    assert_eq!(merged.tomorrow.len(), 1);
    assert_eq!(merged.tomorrow[0].id, tomorrow_id);
    assert!(merged.tomorrow[0].content.is_none());
}

#[test]
fn today_task_serializes_type_field() {
    let json = serde_json::to_value(task("t1", Priority::High)).unwrap();
    assert_eq!(json["type"], "feed");
    assert_eq!(json["priority"], "high");
    assert!(json.get("content").is_none());
}

#[test]
fn satisfied_quota_with_nothing_else_falls_back() {
    let plan = plan(vec![quota(PostType::Feed, 1.0, 1.0)]);
    // Wednesday: nothing due today or tomorrow under a 1/week spread.
    let output = derive_today_tasks_from_plan(Some(&plan), "2024-05-08", "UTC", &[], now());
    assert!(!output.has_plan_driven_items());
    let fallback = output.fallback_request.as_ref().unwrap();
    assert_eq!(fallback.kind, RequestKind::Fallback);
    assert_eq!(output.all_requests().len(), 1);
}
