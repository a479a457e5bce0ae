//! Profile settings management.
//!
//! Validates and stores user settings, clears the cache of the previous profile
//! when the tracked profile changes, and runs one-off connection tests.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::ScholarConfig;
use crate::error::{CiteError, Result};
use crate::extract;
use crate::models::{MetricsSnapshot, ProfileSettings};
use crate::storage::{CacheRepository, KeyValueStore, SettingsRepository};
use crate::transport::TransportResolver;
use reqwest::Url;
use tracing::{debug, info, warn};

/// Outcome of [`test_connection`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionReport {
    /// Page fetched and metrics found.
    Parsed(MetricsSnapshot),
    /// Page fetched but no strategy found metrics.
    Unparsed,
    Failed(String),
}

/// Pull the `user=` query parameter out of a profile URL.
pub fn extract_profile_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "user")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Validate and normalize settings before they are written.
pub fn validate(settings: &ProfileSettings) -> Result<ProfileSettings> {
    if !settings.is_configured() {
        return Err(CiteError::InvalidSettings(
            "a profile URL or profile id is required".to_string(),
        ));
    }

    let mut normalized = ProfileSettings {
        profile_id: settings.profile_id().map(str::to_string),
        profile_url: settings.profile_url().map(str::to_string),
        ..settings.clone()
    };

    if let Some(url) = normalized.profile_url.as_deref() {
        let parsed = Url::parse(url)
            .map_err(|e| CiteError::InvalidSettings(format!("invalid profile URL: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CiteError::InvalidSettings(format!(
                "profile URL must use http or https, got {}",
                parsed.scheme()
            )));
        }
        if normalized.profile_id.is_none() {
            normalized.profile_id = extract_profile_id(url);
        }
    }

    Ok(normalized)
}

/// Store new settings and drop the cached snapshot of the previous profile.
pub async fn save(store: &dyn KeyValueStore, settings: &ProfileSettings) -> Result<ProfileSettings> {
    let normalized = validate(settings)?;
    SettingsRepository::save(store, &normalized).await?;
    CacheRepository::clear(store).await?;
    info!(
        "Saved settings for {}",
        normalized
            .profile_url()
            .or(normalized.profile_id())
            .unwrap_or_default()
    );
    Ok(normalized)
}

pub async fn clear_cache(store: &dyn KeyValueStore) -> Result<()> {
    CacheRepository::clear(store).await?;
    info!("Cache cleared");
    Ok(())
}

/// Fetch the configured profile once, directly, without touching the cache.
pub async fn test_connection(
    resolver: &TransportResolver,
    settings: &ProfileSettings,
    scholar: &ScholarConfig,
) -> ConnectionReport {
    let Some(target) = settings.target_url(scholar) else {
        return ConnectionReport::Failed("no profile configured".to_string());
    };
    debug!("Testing connection to {}", target);

    match resolver.fetch_direct(&target).await {
        Ok(html) => {
            let snapshot = extract::extract(&html);
            if snapshot.degraded {
                warn!("Connection succeeded but the page could not be parsed");
                ConnectionReport::Unparsed
            } else {
                ConnectionReport::Parsed(snapshot)
            }
        }
        Err(e) => ConnectionReport::Failed(e.to_string()),
    }
}
