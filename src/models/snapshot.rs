// Metrics snapshot and cache record types
// Author: kelexine (https://github.com/kelexine)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The three headline metrics of a profile page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub citations: u64,
    pub h_index: u64,
    pub i10_index: u64,
}

impl Metrics {
    /// A strategy result only counts when it found a citation total.
    pub fn is_usable(&self) -> bool {
        self.citations > 0
    }
}

/// One point-in-time structured read of a profile page.
///
/// Snapshots are never mutated after extraction; every fetch produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub citations: u64,
    pub h_index: u64,
    pub i10_index: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,

    #[serde(default, rename = "recentCitations")]
    pub recent_citations_by_year: BTreeMap<i32, u64>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Set when no extraction strategy found a citation count.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl MetricsSnapshot {
    pub fn new(metrics: Metrics, timestamp: DateTime<Utc>) -> Self {
        Self {
            citations: metrics.citations,
            h_index: metrics.h_index,
            i10_index: metrics.i10_index,
            author_name: None,
            affiliation: None,
            recent_citations_by_year: BTreeMap::new(),
            timestamp,
            degraded: false,
        }
    }

    /// Zeroed snapshot carrying the defect marker.
    pub fn degraded(timestamp: DateTime<Utc>) -> Self {
        Self {
            degraded: true,
            ..Self::new(Metrics::default(), timestamp)
        }
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            citations: self.citations,
            h_index: self.h_index,
            i10_index: self.i10_index,
        }
    }
}

/// Cached state owned by the refresh coordinator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheRecord {
    pub last_snapshot: Option<MetricsSnapshot>,
    pub last_update: Option<DateTime<Utc>>,
    /// Citation total of the snapshot replaced by the latest persist.
    pub previous_citations: Option<u64>,
}

impl CacheRecord {
    /// Change against the previously persisted total, if it grew.
    pub fn citation_change(&self) -> Option<u64> {
        let current = self.last_snapshot.as_ref()?.citations;
        let previous = self.previous_citations?;
        current.checked_sub(previous).filter(|delta| *delta > 0)
    }
}
