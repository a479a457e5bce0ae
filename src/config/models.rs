//! Configuration data structures for citewatch.
//!
//! This module defines the schema for the application settings: where the
//! profile page lives, how it is fetched, how long cached metrics stay
//! usable, and how often the scheduler ticks.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Profile page location settings.
    #[serde(default)]
    pub scholar: ScholarConfig,

    /// Direct and proxied fetch settings.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Cache staleness thresholds.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Background update cadence.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Where settings and cached metrics are persisted.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings used to build a profile URL from a bare profile id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScholarConfig {
    /// Base URL of the citations page.
    /// Default: `https://scholar.google.com/citations`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Interface language requested through the `hl` query parameter.
    /// The label-based extraction strategies expect English labels.
    /// Default: `en`
    #[serde(default = "default_language")]
    pub language: String,
}

/// Settings for the transport resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Per-attempt timeout in seconds, applied to the direct fetch and to
    /// every proxy attempt.
    /// Default: `5`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// TCP connect timeout in seconds.
    /// Default: `5`
    #[serde(default = "default_timeout")]
    pub connect_timeout_seconds: u64,

    /// `User-Agent` header sent with every attempt.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// `Accept` header sent with every attempt.
    #[serde(default = "default_accept")]
    pub accept: String,

    /// `Accept-Language` header sent with every attempt.
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Proxy endpoints tried in declaration order after the direct fetch
    /// fails. The URL-encoded target is appended to each endpoint.
    #[serde(default = "default_proxies")]
    pub proxies: Vec<String>,

    /// Largest response body accepted from any route, in bytes. Larger
    /// bodies fail the attempt and the next route is tried.
    /// Default: `2097152` (2 MiB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Staleness thresholds for cached metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cached metrics older than this are not shown without a fetch.
    /// Default: `86400` (24 hours)
    #[serde(default = "default_max_cache_age")]
    pub max_cache_age_seconds: u64,

    /// Cached metrics older than this are shown but refreshed in the
    /// background.
    /// Default: `3600` (1 hour)
    #[serde(default = "default_update_interval")]
    pub update_interval_seconds: u64,
}

/// Settings for the periodic update trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Minutes between scheduled ticks.
    /// Default: `360` (6 hours)
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
}

/// Settings for the on-disk key-value store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `sync.json` (settings) and `local.json` (cache).
    /// Default: `~/.citewatch/data`
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`, `compact`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

impl CacheConfig {
    pub fn max_cache_age(&self) -> Duration {
        Duration::from_secs(self.max_cache_age_seconds)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_seconds)
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

// Default trait implementations linking to custom logic

impl Default for ScholarConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            language: default_language(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
            accept: default_accept(),
            accept_language: default_accept_language(),
            proxies: default_proxies(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cache_age_seconds: default_max_cache_age(),
            update_interval_seconds: default_update_interval(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Helper functions for serde defaults and shared constants
fn default_base_url() -> String {
    "https://scholar.google.com/citations".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_timeout() -> u64 {
    5
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_accept() -> String {
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.5".to_string()
}

fn default_proxies() -> Vec<String> {
    vec![
        "https://cors-anywhere.herokuapp.com/".to_string(),
        "https://api.allorigins.win/raw?url=".to_string(),
        "https://corsproxy.io/?".to_string(),
    ]
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_max_cache_age() -> u64 {
    86_400 // 24 hours
}

fn default_update_interval() -> u64 {
    3_600 // 1 hour
}

fn default_interval_minutes() -> u64 {
    360
}

fn default_data_dir() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".citewatch")
        .join("data")
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
