/// Configuration management for Engagement Service
///
/// Loads configuration from environment variables.
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::{PageRequest, MAX_PAGE_SIZE};
use crate::error::{ServiceError, ServiceResult};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Storage backend selection and limits
    pub storage: StorageConfig,
    /// Database configuration (required for the postgres backend)
    pub database: Option<DatabaseConfig>,
    /// Feed pagination limits
    pub feed: FeedConfig,
    /// Toggle rules
    pub toggle: ToggleConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP port
    pub http_port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Default bound on a single storage round-trip
    pub timeout_ms: u64,
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Database configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl FeedConfig {
    /// Apply defaults and the configured maximum to caller-supplied paging. Nothing is
    /// clamped.
    pub fn page_request(
        &self,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> ServiceResult<PageRequest> {
        let limit = limit.unwrap_or(self.default_page_size as i64);
        if limit > self.max_page_size as i64 {
            return Err(ServiceError::Validation(format!(
                "Invalid 'limit' value. It must be between 1 and {}.",
                self.max_page_size
            )));
        }
        PageRequest::new(page.unwrap_or(1), limit)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleConfig {
    pub reject_self_subscription: bool,
}

// Default values
fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env_parse("PORT").unwrap_or(8010),
        };

        let backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StorageBackend::Postgres,
            "memory" => StorageBackend::Memory,
            other => bail!("unsupported STORAGE_BACKEND: {}", other),
        };
        let storage = StorageConfig {
            backend,
            timeout_ms: env_parse("STORAGE_TIMEOUT_MS").unwrap_or(5000),
        };
        if storage.timeout_ms == 0 {
            bail!("STORAGE_TIMEOUT_MS must be positive");
        }

        let database = match backend {
            StorageBackend::Postgres => Some(DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .context("DATABASE_URL environment variable not set")?,
                max_connections: env_parse("DB_MAX_CONNECTIONS")
                    .unwrap_or_else(default_max_connections),
                min_connections: env_parse("DB_MIN_CONNECTIONS")
                    .unwrap_or_else(default_min_connections),
            }),
            StorageBackend::Memory => None,
        };

        let defaults = FeedConfig::default();
        let feed = FeedConfig {
            default_page_size: env_parse("FEED_DEFAULT_PAGE_SIZE")
                .unwrap_or(defaults.default_page_size),
            max_page_size: env_parse("FEED_MAX_PAGE_SIZE").unwrap_or(defaults.max_page_size),
        };
        if feed.max_page_size == 0 || feed.max_page_size > MAX_PAGE_SIZE {
            bail!("FEED_MAX_PAGE_SIZE must be between 1 and {}", MAX_PAGE_SIZE);
        }
        if feed.default_page_size == 0 || feed.default_page_size > feed.max_page_size {
            bail!("FEED_DEFAULT_PAGE_SIZE must be between 1 and FEED_MAX_PAGE_SIZE");
        }

        let toggle = ToggleConfig {
            reject_self_subscription: env_flag("TOGGLE_REJECT_SELF_SUBSCRIPTION", true),
        };

        Ok(Config {
            app,
            storage,
            database,
            feed,
            toggle,
        })
    }
}
