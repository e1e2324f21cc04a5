use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::tasks::{DeriveTodayTasksOutput, MergedTasks};

const MAX_ENTRIES: usize = 200;
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CachedTasks {
    pub user_id: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub tasks: MergedTasks,
    pub derivation: DeriveTodayTasksOutput,
}

/// File-backed cache of combined task lists, one entry per user and day.
pub struct TaskCache {
    path: PathBuf,
    ttl: Duration,
    entries: Mutex<Vec<CachedTasks>>,
}

impl TaskCache {
    pub async fn load(path: PathBuf, ttl_secs: u64) -> Result<Self> {
        let entries = if path.exists() {
            let data = tokio::fs::read_to_string(&path).await?;
            if data.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&data)?
            }
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            ttl: Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64),
            entries: Mutex::new(entries),
        })
    }

    fn is_fresh(&self, entry: &CachedTasks, now: DateTime<Utc>) -> bool {
        now - entry.created_at < self.ttl
    }

    /// Returns the cached tasks unless they are older than the TTL.
    pub async fn get(&self, user_id: &str, date: NaiveDate, now: DateTime<Utc>) -> Option<CachedTasks> {
        let guard = self.entries.lock().await;
        guard
            .iter()
            .find(|entry| entry.user_id == user_id && entry.date == date)
            .filter(|entry| self.is_fresh(entry, now))
            .cloned()
    }

    /// Stores an entry, replacing any previous one for the same user and day,
    /// and drops expired entries.
    pub async fn put(&self, entry: CachedTasks) -> Result<()> {
        let mut guard = self.entries.lock().await;
        let now = entry.created_at;
        guard.retain(|existing| {
            !(existing.user_id == entry.user_id && existing.date == entry.date)
                && self.is_fresh(existing, now)
        });
        guard.insert(0, entry);
        if guard.len() > MAX_ENTRIES {
            guard.truncate(MAX_ENTRIES);
        }
        self.persist(&guard).await
    }

    pub async fn invalidate(&self, user_id: &str, date: NaiveDate) -> Result<bool> {
        let mut guard = self.entries.lock().await;
        let before = guard.len();
        guard.retain(|entry| !(entry.user_id == user_id && entry.date == date));
        let removed = guard.len() != before;
        if removed {
            self.persist(&guard).await?;
        }
        Ok(removed)
    }

    async fn persist(&self, entries: &[CachedTasks]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent).await?;
        }
        let payload = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, payload).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

async fn ensure_dir(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() || path.exists() {
        return Ok(());
    }
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}
