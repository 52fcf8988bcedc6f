//! Arena-Harvest: a patient phone-spec catalog scraper
//!
//! This crate walks a phone catalog site (vendor list, paginated model lists,
//! model detail pages) through a Tor SOCKS proxy, rotating the Tor circuit
//! whenever the site pushes back, and stores one durable record per model in
//! SQLite. A separate offline step pivots the long-format spec rows into wide
//! tables for analysis.

pub mod config;
pub mod crawler;
pub mod output;
pub mod storage;
pub mod tor;

use thiserror::Error;

/// Main error type for harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch exhausted for {url} after {attempts} attempts")]
    FetchExhausted { url: String, attempts: u32 },

    #[error("Tor control error: {0}")]
    Tor(#[from] tor::TorError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl From<crawler::FetchError> for HarvestError {
    fn from(err: crawler::FetchError) -> Self {
        match err {
            crawler::FetchError::Exhausted { url, attempts } => {
                HarvestError::FetchExhausted { url, attempts }
            }
            crawler::FetchError::Rotation(e) => HarvestError::Tor(e),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Fetcher, Walker};
pub use storage::{ModelRecord, RecordSink, SqliteStore};
pub use tor::{Rotate, TorController};
