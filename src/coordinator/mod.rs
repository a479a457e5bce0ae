//! Freshness and cache coordination.
//!
//! The [`Coordinator`] owns the refresh lifecycle: it reads the cache, decides
//! whether a fetch is warranted, drives the page source and extractor, persists
//! the new snapshot and dispatches badge and notification side effects.
//!
//! # Submodules
//!
//! - `freshness`: cache age classification.
//! - `state`: the refresh state machine and trigger kinds.
//! - `inflight`: per-profile guard against overlapping refreshes.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod freshness;
pub mod inflight;
pub mod state;

pub use freshness::{describe_age, CacheState, FreshnessPolicy};
pub use inflight::{InFlight, InFlightGuard};
pub use state::{RefreshCycle, RefreshState, Trigger};

use crate::config::{CacheConfig, ScholarConfig};
use crate::error::{CiteError, Result};
use crate::extract;
use crate::models::{CacheRecord, MetricsSnapshot, ProfileSettings};
use crate::notify::{evaluate, Badge, Notification, Sinks, StatusUpdate};
use crate::storage::{CacheRepository, KeyValueStore, SettingsRepository};
use crate::transport::PageSource;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Result of one call to [`Coordinator::refresh`].
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Scheduled refresh with auto-update turned off.
    Disabled,
    NotConfigured,
    /// Another refresh for the same profile is running.
    AlreadyInFlight,
    /// Cache was fresh; no network call was made.
    ServedCached,
    /// The page was fetched but no strategy found metrics. Nothing was written.
    Degraded,
    Updated {
        snapshot: MetricsSnapshot,
        notifications: Vec<Notification>,
    },
    /// A silent refresh failed. The cache is untouched.
    Failed { reason: String },
}

/// Cached data as shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedView {
    pub snapshot: MetricsSnapshot,
    pub last_update: Option<DateTime<Utc>>,
    pub age_text: String,
    pub state: CacheState,
    /// Growth against the total replaced by the last persist.
    pub change: Option<u64>,
}

impl CachedView {
    pub fn change_text(&self) -> Option<String> {
        self.change.map(|delta| format!("+{}", delta))
    }
}

/// What opening the view produced.
#[derive(Debug)]
pub enum Presentation {
    NotConfigured,
    /// Usable cache. `background` is set when a stale cache triggered a silent refresh.
    Cached {
        view: CachedView,
        background: Option<JoinHandle<Result<RefreshOutcome>>>,
    },
    /// Cache was missing or expired and a blocking fetch ran.
    Fetched(RefreshOutcome),
}

/// Reply to an explicit user-requested update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub success: bool,
    pub error: Option<String>,
}

pub struct Coordinator {
    store: Arc<dyn KeyValueStore>,
    source: Arc<dyn PageSource>,
    sinks: Sinks,
    scholar: ScholarConfig,
    policy: FreshnessPolicy,
    in_flight: InFlight,
    cancel: CancellationToken,
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        source: Arc<dyn PageSource>,
        sinks: Sinks,
        scholar: ScholarConfig,
        cache: &CacheConfig,
    ) -> Self {
        Self {
            store,
            source,
            sinks,
            scholar,
            policy: FreshnessPolicy::from(cache),
            in_flight: InFlight::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Token cancelled by [`Coordinator::shutdown`].
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Abort in-flight fetches. Cancelled cycles write nothing.
    pub fn shutdown(&self) {
        info!("Shutting down refresh coordinator");
        self.cancel.cancel();
    }

    /// Run one refresh cycle.
    ///
    /// Silent refreshes swallow failures into [`RefreshOutcome::Failed`];
    /// otherwise the status sink is told and the error is returned.
    pub async fn refresh(&self, trigger: Trigger, silent: bool) -> Result<RefreshOutcome> {
        let mut cycle = RefreshCycle::start(trigger);

        let settings = match SettingsRepository::load(self.store.as_ref()).await {
            Ok(settings) => settings,
            Err(e) => return self.fail(&mut cycle, silent, e),
        };

        if trigger == Trigger::Scheduled && !settings.auto_update_enabled {
            debug!("Auto-update disabled, skipping scheduled refresh");
            cycle.finish();
            return Ok(RefreshOutcome::Disabled);
        }

        let Some(target) = settings.target_url(&self.scholar) else {
            self.sinks.status.status(&StatusUpdate::NotConfigured);
            cycle.finish();
            return Ok(RefreshOutcome::NotConfigured);
        };

        let Some(_guard) = self.in_flight.try_acquire(&target) else {
            cycle.finish();
            return Ok(RefreshOutcome::AlreadyInFlight);
        };

        cycle.advance(RefreshState::CheckCache);
        let record = match CacheRepository::load(self.store.as_ref()).await {
            Ok(record) => record,
            Err(e) => return self.fail(&mut cycle, silent, e),
        };

        let cache_state = self.policy.assess(&record, Utc::now());
        if !trigger.forces_fetch() && cache_state == CacheState::Fresh {
            cycle.advance(RefreshState::ServeCached);
            debug!("Cache is fresh, no fetch needed");
            cycle.finish();
            return Ok(RefreshOutcome::ServedCached);
        }

        cycle.advance(RefreshState::Fetch);
        info!("Refreshing {} ({})", target, trigger.as_str());
        let html = match self.source.fetch_page(&target, &self.cancel).await {
            Ok(html) => html,
            Err(e) => return self.fail(&mut cycle, silent, e),
        };

        let snapshot = extract::extract(&html);
        if snapshot.degraded {
            warn!("Profile page fetched but no metrics found, keeping cached data");
            if !silent {
                self.sinks.status.status(&StatusUpdate::Error(
                    "Could not read metrics from the profile page".to_string(),
                ));
            }
            cycle.finish();
            return Ok(RefreshOutcome::Degraded);
        }

        if self.cancel.is_cancelled() {
            return self.fail(&mut cycle, silent, CiteError::Cancelled);
        }

        cycle.advance(RefreshState::Persist);
        let previous = record.last_snapshot.as_ref().map(|old| old.citations);
        if let Err(e) =
            CacheRepository::persist(self.store.as_ref(), &snapshot, Utc::now(), previous).await
        {
            return self.fail(&mut cycle, silent, e);
        }
        self.sinks
            .badge
            .set_badge(&Badge::for_citations(Some(snapshot.citations)));

        cycle.advance(RefreshState::Notify);
        let notifications = self.dispatch(&settings, &record, &snapshot);

        if !silent {
            self.sinks.status.status(&StatusUpdate::Updated {
                citations: snapshot.citations,
            });
        }
        info!(
            "Updated: {} citations, h-index {}, i10-index {}",
            snapshot.citations, snapshot.h_index, snapshot.i10_index
        );
        cycle.finish();

        Ok(RefreshOutcome::Updated {
            snapshot,
            notifications,
        })
    }

    /// Show cached data if usable, otherwise fetch before returning.
    pub async fn present(self: &Arc<Self>) -> Result<Presentation> {
        let settings = SettingsRepository::load(self.store.as_ref()).await?;
        if !settings.is_configured() {
            self.sinks.status.status(&StatusUpdate::NotConfigured);
            return Ok(Presentation::NotConfigured);
        }

        let record = CacheRepository::load(self.store.as_ref()).await?;
        let now = Utc::now();
        let state = self.policy.assess(&record, now);

        match (state.is_usable(), record.last_snapshot.clone()) {
            (true, Some(snapshot)) => {
                self.sinks
                    .badge
                    .set_badge(&Badge::for_citations(Some(snapshot.citations)));

                let background = state.needs_refresh().then(|| {
                    debug!("Cache is stale, refreshing in the background");
                    let coordinator = Arc::clone(self);
                    tokio::spawn(async move { coordinator.refresh(Trigger::Manual, true).await })
                });

                Ok(Presentation::Cached {
                    view: CachedView {
                        age_text: describe_age(record.last_update, now),
                        change: record.citation_change(),
                        last_update: record.last_update,
                        snapshot,
                        state,
                    },
                    background,
                })
            }
            _ => {
                let outcome = self.refresh(Trigger::Manual, false).await?;
                Ok(Presentation::Fetched(outcome))
            }
        }
    }

    /// User-requested update. Success only when new data was stored.
    pub async fn force_update(&self) -> UpdateReport {
        match self.refresh(Trigger::Manual, false).await {
            Ok(RefreshOutcome::Updated { .. }) => UpdateReport {
                success: true,
                error: None,
            },
            Ok(other) => UpdateReport {
                success: false,
                error: Some(describe_outcome(&other).to_string()),
            },
            Err(e) => UpdateReport {
                success: false,
                error: Some(e.to_string()),
            },
        }
    }

    pub async fn on_scheduled_tick(&self) -> Result<RefreshOutcome> {
        self.refresh(Trigger::Scheduled, true).await
    }

    pub async fn on_manual_refresh(&self) -> Result<RefreshOutcome> {
        self.refresh(Trigger::Manual, false).await
    }

    /// The tracked profile changed: the old badge no longer applies.
    pub async fn on_settings_changed(&self) -> Result<RefreshOutcome> {
        self.sinks.badge.set_badge(&Badge::cleared());
        self.refresh(Trigger::SettingsChanged, true).await
    }

    fn dispatch(
        &self,
        settings: &ProfileSettings,
        record: &CacheRecord,
        snapshot: &MetricsSnapshot,
    ) -> Vec<Notification> {
        let Some(old) = record.last_snapshot.as_ref() else {
            return Vec::new();
        };
        let notifications = evaluate(old, snapshot);
        if settings.notifications_enabled {
            for notification in &notifications {
                self.sinks.notifications.notify(notification);
            }
        } else if !notifications.is_empty() {
            debug!("Notifications disabled, dropping {}", notifications.len());
        }
        notifications
    }

    fn fail(
        &self,
        cycle: &mut RefreshCycle,
        silent: bool,
        e: CiteError,
    ) -> Result<RefreshOutcome> {
        cycle.finish();
        if silent {
            warn!("Background refresh failed: {}", e);
            return Ok(RefreshOutcome::Failed {
                reason: e.to_string(),
            });
        }
        error!("Refresh failed: {}", e);
        self.sinks.status.status(&StatusUpdate::Error(e.to_string()));
        Err(e)
    }
}

fn describe_outcome(outcome: &RefreshOutcome) -> &'static str {
    match outcome {
        RefreshOutcome::Disabled => "auto-update is disabled",
        RefreshOutcome::NotConfigured => "no profile configured",
        RefreshOutcome::AlreadyInFlight => "an update is already running",
        RefreshOutcome::ServedCached => "cached data is still fresh",
        RefreshOutcome::Degraded => "could not read metrics from the profile page",
        RefreshOutcome::Updated { .. } => "updated",
        RefreshOutcome::Failed { .. } => "update failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_text() {
        let view = CachedView {
            snapshot: MetricsSnapshot::degraded(Utc::now()),
            last_update: None,
            age_text: String::new(),
            state: CacheState::Fresh,
            change: Some(12),
        };
        assert_eq!(view.change_text().as_deref(), Some("+12"));
    }

    #[test]
    fn test_describe_outcome() {
        assert_eq!(
            describe_outcome(&RefreshOutcome::NotConfigured),
            "no profile configured"
        );
    }
}
