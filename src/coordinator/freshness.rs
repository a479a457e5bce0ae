// Cache staleness policy
// Author: kelexine (https://github.com/kelexine)

use crate::config::CacheConfig;
use crate::models::CacheRecord;
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// How a cache record relates to the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// No usable snapshot stored.
    Missing,
    /// Younger than `update_interval`.
    Fresh,
    /// Older than `update_interval` but within `max_cache_age`: show it and refresh in the background.
    Stale,
    /// Older than `max_cache_age`: a fetch is required before showing anything.
    Expired,
}

impl CacheState {
    /// Can be displayed without a network call.
    pub fn is_usable(&self) -> bool {
        matches!(self, CacheState::Fresh | CacheState::Stale)
    }

    pub fn needs_refresh(&self) -> bool {
        !matches!(self, CacheState::Fresh)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub max_cache_age: Duration,
    pub update_interval: Duration,
}

impl From<&CacheConfig> for FreshnessPolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            max_cache_age: config.max_cache_age(),
            update_interval: config.update_interval(),
        }
    }
}

impl FreshnessPolicy {
    /// Classify a record at `now`.
    ///
    /// A snapshot with zero citations is treated as missing, since zero is
    /// what a failed extraction looks like.
    pub fn assess(&self, record: &CacheRecord, now: DateTime<Utc>) -> CacheState {
        let has_data = record
            .last_snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.citations > 0);
        match record.last_update {
            Some(last_update) if has_data => self.assess_age(now - last_update),
            _ => CacheState::Missing,
        }
    }

    pub fn assess_age(&self, age: TimeDelta) -> CacheState {
        if age > to_delta(self.max_cache_age) {
            CacheState::Expired
        } else if age > to_delta(self.update_interval) {
            CacheState::Stale
        } else {
            CacheState::Fresh
        }
    }
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

/// Human-readable "last updated" text.
pub fn describe_age(last_update: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(last_update) = last_update else {
        return "never updated".to_string();
    };
    let age = now - last_update;

    if age < TimeDelta::minutes(1) {
        "updated just now".to_string()
    } else if age < TimeDelta::hours(1) {
        format!("updated {} min ago", age.num_minutes())
    } else if age < TimeDelta::days(1) {
        format!("updated {} h ago", age.num_hours())
    } else {
        format!("updated on {}", last_update.format("%Y-%m-%d"))
    }
}
