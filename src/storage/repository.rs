// Typed access to the settings and cache partitions
// Author: kelexine (https://github.com/kelexine)

use super::{local_keys, sync_keys, KeyValueStore, Partition};
use crate::error::Result;
use crate::models::{CacheRecord, MetricsSnapshot, ProfileSettings};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub struct SettingsRepository;

impl SettingsRepository {
    /// Read the user settings. Absent keys fall back to their defaults.
    pub async fn load(store: &dyn KeyValueStore) -> Result<ProfileSettings> {
        let raw = store.get(Partition::Sync, sync_keys::ALL).await?;
        let defaults = ProfileSettings::default();

        Ok(ProfileSettings {
            profile_id: string_value(&raw, sync_keys::PROFILE_ID),
            profile_url: string_value(&raw, sync_keys::PROFILE_URL),
            notifications_enabled: raw
                .get(sync_keys::NOTIFICATIONS_ENABLED)
                .and_then(Value::as_bool)
                .unwrap_or(defaults.notifications_enabled),
            auto_update_enabled: raw
                .get(sync_keys::AUTO_UPDATE_ENABLED)
                .and_then(Value::as_bool)
                .unwrap_or(defaults.auto_update_enabled),
        })
    }

    pub async fn save(store: &dyn KeyValueStore, settings: &ProfileSettings) -> Result<()> {
        let mut entries = Map::new();
        entries.insert(
            sync_keys::PROFILE_ID.to_string(),
            Value::String(settings.profile_id().unwrap_or_default().to_string()),
        );
        entries.insert(
            sync_keys::PROFILE_URL.to_string(),
            Value::String(settings.profile_url().unwrap_or_default().to_string()),
        );
        entries.insert(
            sync_keys::NOTIFICATIONS_ENABLED.to_string(),
            Value::Bool(settings.notifications_enabled),
        );
        entries.insert(
            sync_keys::AUTO_UPDATE_ENABLED.to_string(),
            Value::Bool(settings.auto_update_enabled),
        );
        store.set(Partition::Sync, entries).await
    }
}

pub struct CacheRepository;

impl CacheRepository {
    /// Read the cache record. Missing or malformed fields are treated as a first run.
    pub async fn load(store: &dyn KeyValueStore) -> Result<CacheRecord> {
        let raw = store.get(Partition::Local, local_keys::ALL).await?;

        let last_snapshot = match raw.get(local_keys::CITATION_DATA) {
            Some(value) => match serde_json::from_value::<MetricsSnapshot>(value.clone()) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!("Discarding unreadable cached snapshot: {}", e);
                    None
                }
            },
            None => None,
        };

        let last_update = raw
            .get(local_keys::LAST_UPDATE)
            .and_then(Value::as_i64)
            .and_then(DateTime::from_timestamp_millis);

        let previous_citations = raw
            .get(local_keys::PREVIOUS_CITATIONS)
            .and_then(Value::as_u64);

        Ok(CacheRecord {
            last_snapshot,
            last_update,
            previous_citations,
        })
    }

    /// Replace the cached snapshot wholesale in a single write.
    pub async fn persist(
        store: &dyn KeyValueStore,
        snapshot: &MetricsSnapshot,
        updated_at: DateTime<Utc>,
        previous_citations: Option<u64>,
    ) -> Result<()> {
        let mut entries = Map::new();
        entries.insert(
            local_keys::CITATION_DATA.to_string(),
            serde_json::to_value(snapshot)?,
        );
        entries.insert(
            local_keys::LAST_UPDATE.to_string(),
            Value::from(updated_at.timestamp_millis()),
        );
        // Null, not absent: a total left by an earlier profile must not survive.
        entries.insert(
            local_keys::PREVIOUS_CITATIONS.to_string(),
            previous_citations.map_or(Value::Null, Value::from),
        );
        store.set(Partition::Local, entries).await?;
        debug!("Persisted snapshot with {} citations", snapshot.citations);
        Ok(())
    }

    /// Remove every cached key. Also used when the tracked profile changes,
    /// since none of them describe the new profile.
    pub async fn clear(store: &dyn KeyValueStore) -> Result<()> {
        store.remove(Partition::Local, local_keys::ALL).await
    }
}

fn string_value(raw: &Map<String, Value>, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
