use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::kpi::hashtags::DEFAULT_TOP_HASHTAGS;
use crate::kpi::ScoreWeights;
use crate::PostType;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HashtagConfig {
    pub top_limit: usize,
}

impl Default for HashtagConfig {
    fn default() -> Self {
        Self {
            top_limit: DEFAULT_TOP_HASHTAGS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TasksConfig {
    /// IANA zone used when a request does not name one.
    pub default_timezone: String,
    pub tomorrow_limit: usize,
    pub feed_time: String,
    pub reel_time: String,
    pub story_time: String,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_timezone: "UTC".to_string(),
            tomorrow_limit: 3,
            feed_time: "19:00".to_string(),
            reel_time: "20:00".to_string(),
            story_time: "12:00".to_string(),
        }
    }
}

impl TasksConfig {
    pub fn default_time(&self, post_type: PostType) -> &str {
        match post_type {
            PostType::Feed => &self.feed_time,
            PostType::Reel => &self.reel_time,
            PostType::Story => &self.story_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub api_base: String,
    pub model: String,
    pub timeout_ms: u64,
    pub temperature: f64,
    /// Only ever read from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_ms: 20_000,
            temperature: 0.7,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub path: PathBuf,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/task-cache.json"),
            ttl_secs: 6 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub scoring: ScoreWeights,
    pub hashtags: HashtagConfig,
    pub tasks: TasksConfig,
    pub generation: GenerationConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Reads the TOML file (a missing file means defaults), then applies
    /// environment overrides. Returns the path that was consulted.
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>)> {
        let config_path = path.or_else(default_config_path);
        let mut config = match config_path.as_ref() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(path)?;
                toml::from_str(&contents)?
            }
            _ => AppConfig::default(),
        };

        config.apply_env_overrides();
        Ok((config, config_path))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let payload = toml::to_string_pretty(self)?;
        std::fs::write(path, payload)?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(timezone) = env::var("CONTENT_OPS_TIMEZONE") {
            if !timezone.trim().is_empty() {
                self.tasks.default_timezone = timezone.trim().to_string();
            }
        }
        if let Ok(level) = env::var("CONTENT_OPS_LOG") {
            if !level.trim().is_empty() {
                self.logging.level = level;
            }
        }
        if let Ok(key) = env::var("AI_API_KEY") {
            if !key.trim().is_empty() {
                self.generation.api_key = Some(key.trim().to_string());
            }
        }
        if let Ok(base) = env::var("AI_API_BASE") {
            if !base.trim().is_empty() {
                self.generation.api_base = base;
            }
        }
        if let Ok(model) = env::var("AI_MODEL") {
            if !model.trim().is_empty() {
                self.generation.model = model;
            }
        }
        if let Ok(timeout) = env::var("AI_TIMEOUT_MS") {
            if let Ok(value) = timeout.parse::<u64>() {
                self.generation.timeout_ms = value;
            }
        }
        if let Ok(path) = env::var("TASK_CACHE_PATH") {
            if !path.trim().is_empty() {
                self.cache.path = PathBuf::from(path);
            }
        }
        if let Ok(ttl) = env::var("TASK_CACHE_TTL_SECS") {
            if let Ok(value) = ttl.parse::<u64>() {
                self.cache.ttl_secs = value;
            }
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    env::var("CONTENT_OPS_CONFIG")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/content-ops.toml")))
}
