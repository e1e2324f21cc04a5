//! Error types for the I/O-facing layers.
//!
//! The KPI and task engines never fail; everything that reads files, talks
//! to the generation API or serves HTTP reports through this enum.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("configuration error: {0}")]
    Config(String),

    /// AI generation request failed or returned an unusable body
    #[error("generation error: {0}")]
    Generation(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
