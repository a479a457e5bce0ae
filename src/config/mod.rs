// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{CiteError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from the default config file location.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest, prefix `CITEWATCH__`)
    /// 2. Config file (`path`, or `~/.citewatch/config.toml`)
    /// 3. Defaults (lowest)
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(&Self::default_config_path()).required(false),
        };

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            .add_source(file)
            // Nested keys use a double underscore, e.g. CITEWATCH__CACHE__MAX_CACHE_AGE_SECONDS
            .add_source(
                Environment::with_prefix("CITEWATCH")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .map_err(|e| CiteError::Config(e.to_string()))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| CiteError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject threshold combinations the freshness policy cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.cache.update_interval_seconds > self.cache.max_cache_age_seconds {
            return Err(CiteError::Config(format!(
                "cache.update_interval_seconds ({}) must not exceed cache.max_cache_age_seconds ({})",
                self.cache.update_interval_seconds, self.cache.max_cache_age_seconds
            )));
        }
        if self.transport.timeout_seconds == 0 {
            return Err(CiteError::Config(
                "transport.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.transport.max_body_bytes == 0 {
            return Err(CiteError::Config(
                "transport.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.schedule.interval_minutes == 0 {
            return Err(CiteError::Config(
                "schedule.interval_minutes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CiteError::Internal(e.to_string()))
    }

    fn default_config_path() -> String {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".citewatch")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    }
}
