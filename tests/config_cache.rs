use chrono::{Duration, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;

use content_ops::cache::{CachedTasks, TaskCache};
use content_ops::config::AppConfig;
use content_ops::tasks::{derive_today_tasks_from_plan, merge_generated_tasks};
use content_ops::{Error, PostType};

fn entry(user_id: &str, hour: u32) -> CachedTasks {
    let now = Utc.with_ymd_and_hms(2024, 5, 6, hour, 0, 0).unwrap();
    let derivation = derive_today_tasks_from_plan(None, "2024-05-06", "UTC", &[], now);
    CachedTasks {
        user_id: user_id.to_string(),
        date: derivation.date,
        created_at: now,
        tasks: merge_generated_tasks(&derivation, &HashMap::new()),
        derivation,
    }
}

#[test]
fn config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("content-ops.toml");
    std::fs::write(
        &path,
        r#"
[scoring]
engagement_cap = 40.0

[hashtags]
top_limit = 5

[tasks]
reel_time = "21:15"
"#,
    )
    .unwrap();

    let (config, used) = AppConfig::load(Some(path.clone())).unwrap();
    assert_eq!(used.as_deref(), Some(path.as_path()));
    assert_eq!(config.scoring.engagement_cap, 40.0);
    assert_eq!(config.scoring.growth_cap, 25.0);
    assert_eq!(config.hashtags.top_limit, 5);
    assert_eq!(config.tasks.default_time(PostType::Reel), "21:15");
    assert_eq!(config.tasks.default_time(PostType::Feed), "19:00");
}

#[test]
fn missing_config_file_means_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let (config, _) = AppConfig::load(Some(dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config.hashtags.top_limit, 10);
    assert_eq!(config.tasks.tomorrow_limit, 3);
}

#[test]
fn written_config_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("content-ops.toml");
    let mut config = AppConfig::default();
    config.hashtags.top_limit = 7;
    config.generation.api_key = Some("secret".to_string());
    config.write(&path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(!written.contains("secret"));

    let (loaded, _) = AppConfig::load(Some(path)).unwrap();
    assert_eq!(loaded.hashtags.top_limit, 7);
}

#[test]
fn broken_config_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("content-ops.toml");
    std::fs::write(&path, "[hashtags\ntop_limit = ").unwrap();
    assert!(matches!(AppConfig::load(Some(path)), Err(Error::ConfigParse(_))));
}

#[tokio::test]
async fn cache_serves_fresh_entries_only() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TaskCache::load(dir.path().join("cache.json"), 3_600).await.unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
    let stored = entry("u1", 8);
    let created = stored.created_at;
    cache.put(stored.clone()).await.unwrap();

    let hit = cache.get("u1", date, created + Duration::minutes(30)).await;
    assert_eq!(hit, Some(stored));
    assert!(cache.get("u2", date, created).await.is_none());
    assert!(cache.get("u1", date, created + Duration::hours(2)).await.is_none());
}

#[tokio::test]
async fn cache_persists_and_replaces_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("cache.json");
    let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();

    let cache = TaskCache::load(path.clone(), 21_600).await.unwrap();
    cache.put(entry("u1", 8)).await.unwrap();
    cache.put(entry("u1", 9)).await.unwrap();

    let reloaded = TaskCache::load(path.clone(), 21_600).await.unwrap();
    let check_at = Utc.with_ymd_and_hms(2024, 5, 6, 10, 0, 0).unwrap();
    let hit = reloaded.get("u1", date, check_at).await.unwrap();
    assert_eq!(hit.created_at.format("%H").to_string(), "09");

    let persisted: Vec<CachedTasks> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(persisted.len(), 1);

    assert!(reloaded.invalidate("u1", date).await.unwrap());
    assert!(!reloaded.invalidate("u1", date).await.unwrap());
    assert!(reloaded.get("u1", date, check_at).await.is_none());
}
