// Refresh coordinator tests: in-memory store, scripted page source, recording sinks
// Author: kelexine (https://github.com/kelexine)

use chrono::{DateTime, TimeDelta, Utc};
use citewatch::config::{CacheConfig, ScholarConfig, TransportConfig};
use citewatch::coordinator::{Coordinator, Presentation, RefreshOutcome, Trigger};
use citewatch::error::{CiteError, Result};
use citewatch::models::{CacheRecord, Metrics, MetricsSnapshot, ProfileSettings};
use citewatch::notify::{
    Badge, BadgeSink, ChangeKind, Notification, NotificationSink, Sinks, StatusSink, StatusUpdate,
};
use citewatch::storage::{
    CacheRepository, KeyValueStore, MemoryStore, Partition, SettingsRepository,
};
use citewatch::transport::{PageSource, TransportResolver};
use futures::future::{BoxFuture, FutureExt};
use mockito::{Matcher, Server};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

const PROFILE_PAGE: &str = include_str!("fixtures/scholar_profile.html");
const UNRELATED_PAGE: &str = "<html><body><p>Please show you're not a robot</p></body></html>";

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Recorder {
    notifications: Mutex<Vec<Notification>>,
    badges: Mutex<Vec<Badge>>,
    statuses: Mutex<Vec<StatusUpdate>>,
}

impl NotificationSink for Recorder {
    fn notify(&self, notification: &Notification) {
        self.notifications.lock().push(notification.clone());
    }
}

impl BadgeSink for Recorder {
    fn set_badge(&self, badge: &Badge) {
        self.badges.lock().push(badge.clone());
    }
}

impl StatusSink for Recorder {
    fn status(&self, update: &StatusUpdate) {
        self.statuses.lock().push(update.clone());
    }
}

enum Script {
    Page(&'static str),
    Unreachable,
}

#[derive(Default)]
struct ScriptedSource {
    script: Mutex<VecDeque<Script>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn with(script: Vec<Script>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PageSource for ScriptedSource {
    fn fetch_page<'a>(
        &'a self,
        _url: &'a str,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<String>> {
        async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().pop_front();
            match next {
                Some(Script::Page(html)) => Ok(html.to_string()),
                Some(Script::Unreachable) => Err(CiteError::TransportFailure {
                    attempts: 4,
                    last_error: "Upstream returned HTTP 503".to_string(),
                }),
                None => panic!("unexpected fetch"),
            }
        }
        .boxed()
    }
}

/// Blocks inside the fetch until released.
#[derive(Default)]
struct GatedSource {
    entered: Notify,
    release: Notify,
}

impl PageSource for GatedSource {
    fn fetch_page<'a>(
        &'a self,
        _url: &'a str,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<String>> {
        async move {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(PROFILE_PAGE.to_string())
        }
        .boxed()
    }
}

/// Reads and settings writes work; cache writes fail.
#[derive(Default)]
struct ReadOnlyCache(MemoryStore);

impl KeyValueStore for ReadOnlyCache {
    fn get<'a>(
        &'a self,
        partition: Partition,
        keys: &'a [&'a str],
    ) -> BoxFuture<'a, Result<Map<String, Value>>> {
        self.0.get(partition, keys)
    }

    fn set(&self, partition: Partition, entries: Map<String, Value>) -> BoxFuture<'_, Result<()>> {
        match partition {
            Partition::Local => {
                async { Err(CiteError::Storage("disk full".to_string())) }.boxed()
            }
            Partition::Sync => self.0.set(partition, entries),
        }
    }

    fn remove<'a>(&'a self, partition: Partition, keys: &'a [&'a str]) -> BoxFuture<'a, Result<()>> {
        self.0.remove(partition, keys)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    coordinator: Arc<Coordinator>,
    store: Arc<MemoryStore>,
    source: Arc<ScriptedSource>,
    recorder: Arc<Recorder>,
}

fn sinks(recorder: &Arc<Recorder>) -> Sinks {
    Sinks {
        notifications: recorder.clone(),
        badge: recorder.clone(),
        status: recorder.clone(),
    }
}

fn harness(script: Vec<Script>) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(ScriptedSource::with(script));
    let recorder = Arc::new(Recorder::default());
    let coordinator = Arc::new(Coordinator::new(
        store.clone(),
        source.clone(),
        sinks(&recorder),
        ScholarConfig::default(),
        &CacheConfig::default(),
    ));
    Harness {
        coordinator,
        store,
        source,
        recorder,
    }
}

fn profile(id: &str) -> ProfileSettings {
    ProfileSettings {
        profile_id: Some(id.to_string()),
        ..Default::default()
    }
}

async fn configure(store: &dyn KeyValueStore, settings: ProfileSettings) {
    SettingsRepository::save(store, &settings).await.unwrap();
}

async fn seed_cache(store: &dyn KeyValueStore, metrics: Metrics, updated_at: DateTime<Utc>) {
    let snapshot = MetricsSnapshot::new(metrics, updated_at);
    CacheRepository::persist(store, &snapshot, updated_at, None)
        .await
        .unwrap();
}

fn older_metrics() -> Metrics {
    Metrics {
        citations: 1000,
        h_index: 60,
        i10_index: 12,
    }
}

async fn cache(store: &dyn KeyValueStore) -> CacheRecord {
    CacheRepository::load(store).await.unwrap()
}

// ---------------------------------------------------------------------------
// refresh()
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_not_configured_skips_network() {
    let h = harness(vec![]);

    let outcome = h.coordinator.refresh(Trigger::Manual, false).await.unwrap();

    assert_eq!(outcome, RefreshOutcome::NotConfigured);
    assert_eq!(h.source.calls(), 0);
    assert_eq!(*h.recorder.statuses.lock(), vec![StatusUpdate::NotConfigured]);
}

#[tokio::test]
async fn test_first_run_persists_and_sets_badge_without_notifying() {
    let h = harness(vec![Script::Page(PROFILE_PAGE)]);
    configure(h.store.as_ref(), profile("abc")).await;

    let outcome = h.coordinator.on_manual_refresh().await.unwrap();

    let RefreshOutcome::Updated {
        snapshot,
        notifications,
    } = outcome
    else {
        panic!("expected Updated, got {:?}", outcome);
    };
    assert_eq!(snapshot.metrics(), Metrics { citations: 1234, h_index: 67, i10_index: 9 });
    assert_eq!(snapshot.author_name.as_deref(), Some("Ada Example"));
    assert!(notifications.is_empty());

    let record = cache(h.store.as_ref()).await;
    assert_eq!(record.last_snapshot.unwrap().citations, 1234);
    assert!(record.last_update.is_some());
    assert_eq!(record.previous_citations, None);

    assert_eq!(h.recorder.badges.lock().last().unwrap().text, "1234");
    assert!(h.recorder.notifications.lock().is_empty());
    assert_eq!(
        *h.recorder.statuses.lock(),
        vec![StatusUpdate::Updated { citations: 1234 }]
    );
}

#[tokio::test]
async fn test_growth_is_notified_against_the_old_snapshot() {
    let h = harness(vec![Script::Page(PROFILE_PAGE)]);
    configure(h.store.as_ref(), profile("abc")).await;
    seed_cache(h.store.as_ref(), older_metrics(), Utc::now() - TimeDelta::hours(2)).await;

    h.coordinator.refresh(Trigger::Manual, false).await.unwrap();

    let sent = h.recorder.notifications.lock().clone();
    assert_eq!(sent.len(), 2);
    assert_eq!(
        sent[0].kind,
        ChangeKind::CitationsIncreased { delta: 234, total: 1234 }
    );
    assert_eq!(sent[1].kind, ChangeKind::HIndexIncreased { from: 60, to: 67 });

    let record = cache(h.store.as_ref()).await;
    assert_eq!(record.previous_citations, Some(1000));
    assert_eq!(record.citation_change(), Some(234));
}

#[tokio::test]
async fn test_decreases_and_i10_changes_are_silent() {
    let h = harness(vec![Script::Page(PROFILE_PAGE)]);
    configure(h.store.as_ref(), profile("abc")).await;
    let higher = Metrics {
        citations: 2000,
        h_index: 70,
        i10_index: 1,
    };
    seed_cache(h.store.as_ref(), higher, Utc::now() - TimeDelta::hours(2)).await;

    h.coordinator.refresh(Trigger::Manual, false).await.unwrap();

    assert!(h.recorder.notifications.lock().is_empty());
    assert_eq!(cache(h.store.as_ref()).await.citation_change(), None);
}

#[tokio::test]
async fn test_disabled_notifications_are_computed_but_not_sent() {
    let h = harness(vec![Script::Page(PROFILE_PAGE)]);
    configure(
        h.store.as_ref(),
        ProfileSettings {
            notifications_enabled: false,
            ..profile("abc")
        },
    )
    .await;
    seed_cache(h.store.as_ref(), older_metrics(), Utc::now() - TimeDelta::hours(2)).await;

    let outcome = h.coordinator.refresh(Trigger::Manual, true).await.unwrap();

    let RefreshOutcome::Updated { notifications, .. } = outcome else {
        panic!("expected Updated");
    };
    assert_eq!(notifications.len(), 2);
    assert!(h.recorder.notifications.lock().is_empty());
}

#[tokio::test]
async fn test_scheduled_tick_serves_fresh_cache() {
    let h = harness(vec![]);
    configure(h.store.as_ref(), profile("abc")).await;
    seed_cache(h.store.as_ref(), older_metrics(), Utc::now() - TimeDelta::minutes(5)).await;

    let outcome = h.coordinator.on_scheduled_tick().await.unwrap();

    assert_eq!(outcome, RefreshOutcome::ServedCached);
    assert_eq!(h.source.calls(), 0);
}

#[tokio::test]
async fn test_scheduled_tick_refreshes_stale_cache() {
    let h = harness(vec![Script::Page(PROFILE_PAGE)]);
    configure(h.store.as_ref(), profile("abc")).await;
    seed_cache(h.store.as_ref(), older_metrics(), Utc::now() - TimeDelta::hours(2)).await;

    let outcome = h.coordinator.on_scheduled_tick().await.unwrap();

    assert!(matches!(outcome, RefreshOutcome::Updated { .. }));
    assert_eq!(h.source.calls(), 1);
    // Silent refreshes never talk to the status sink on success.
    assert!(h.recorder.statuses.lock().is_empty());
}

#[tokio::test]
async fn test_manual_refresh_ignores_fresh_cache() {
    let h = harness(vec![Script::Page(PROFILE_PAGE)]);
    configure(h.store.as_ref(), profile("abc")).await;
    seed_cache(h.store.as_ref(), older_metrics(), Utc::now()).await;

    let outcome = h.coordinator.on_manual_refresh().await.unwrap();

    assert!(matches!(outcome, RefreshOutcome::Updated { .. }));
    assert_eq!(h.source.calls(), 1);
}

#[tokio::test]
async fn test_scheduled_tick_respects_auto_update_setting() {
    let h = harness(vec![]);
    configure(
        h.store.as_ref(),
        ProfileSettings {
            auto_update_enabled: false,
            ..profile("abc")
        },
    )
    .await;

    assert_eq!(
        h.coordinator.on_scheduled_tick().await.unwrap(),
        RefreshOutcome::Disabled
    );
    assert_eq!(h.source.calls(), 0);
}

#[tokio::test]
async fn test_degraded_page_leaves_cache_and_badge_alone() {
    let h = harness(vec![Script::Page(UNRELATED_PAGE)]);
    configure(h.store.as_ref(), profile("abc")).await;
    let seeded_at = Utc::now() - TimeDelta::hours(2);
    seed_cache(h.store.as_ref(), older_metrics(), seeded_at).await;
    let before = cache(h.store.as_ref()).await;

    let outcome = h.coordinator.refresh(Trigger::Manual, true).await.unwrap();

    assert_eq!(outcome, RefreshOutcome::Degraded);
    assert_eq!(cache(h.store.as_ref()).await, before);
    assert!(h.recorder.badges.lock().is_empty());
}

#[tokio::test]
async fn test_transport_failure_surfaces_when_not_silent() {
    let h = harness(vec![Script::Unreachable]);
    configure(h.store.as_ref(), profile("abc")).await;
    seed_cache(h.store.as_ref(), older_metrics(), Utc::now() - TimeDelta::hours(2)).await;
    let before = cache(h.store.as_ref()).await;

    let err = h.coordinator.refresh(Trigger::Manual, false).await.unwrap_err();

    assert!(matches!(err, CiteError::TransportFailure { attempts: 4, .. }));
    assert_eq!(cache(h.store.as_ref()).await, before);
    let statuses = h.recorder.statuses.lock().clone();
    assert!(matches!(statuses.as_slice(), [StatusUpdate::Error(message)] if message.contains("4 fetch attempts")));
}

#[tokio::test]
async fn test_transport_failure_is_swallowed_when_silent() {
    let h = harness(vec![Script::Unreachable]);
    configure(h.store.as_ref(), profile("abc")).await;

    let outcome = h.coordinator.on_scheduled_tick().await.unwrap();

    assert!(matches!(outcome, RefreshOutcome::Failed { .. }));
    assert!(h.recorder.statuses.lock().is_empty());
    assert_eq!(cache(h.store.as_ref()).await, CacheRecord::default());
}

#[tokio::test]
async fn test_storage_failure_aborts_before_side_effects() {
    let store = Arc::new(ReadOnlyCache::default());
    let source = Arc::new(ScriptedSource::with(vec![Script::Page(PROFILE_PAGE)]));
    let recorder = Arc::new(Recorder::default());
    let coordinator = Coordinator::new(
        store.clone(),
        source,
        sinks(&recorder),
        ScholarConfig::default(),
        &CacheConfig::default(),
    );
    configure(store.as_ref(), profile("abc")).await;

    let err = coordinator.refresh(Trigger::Manual, false).await.unwrap_err();

    assert!(err.is_storage());
    assert!(recorder.badges.lock().is_empty());
    assert!(recorder.notifications.lock().is_empty());
}

#[tokio::test]
async fn test_cancelled_cycle_writes_nothing() {
    let h = harness(vec![Script::Page(PROFILE_PAGE)]);
    configure(h.store.as_ref(), profile("abc")).await;

    h.coordinator.shutdown();
    let err = h.coordinator.refresh(Trigger::Manual, false).await.unwrap_err();

    assert!(matches!(err, CiteError::Cancelled));
    assert!(h.store.snapshot(Partition::Local).is_empty());
    assert!(h.recorder.badges.lock().is_empty());
}

#[tokio::test]
async fn test_overlapping_refresh_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(GatedSource::default());
    let recorder = Arc::new(Recorder::default());
    let coordinator = Arc::new(Coordinator::new(
        store.clone(),
        source.clone(),
        sinks(&recorder),
        ScholarConfig::default(),
        &CacheConfig::default(),
    ));
    configure(store.as_ref(), profile("abc")).await;

    let first = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.refresh(Trigger::Manual, true).await }
    });
    source.entered.notified().await;

    let second = coordinator.refresh(Trigger::Manual, true).await.unwrap();
    assert_eq!(second, RefreshOutcome::AlreadyInFlight);

    source.release.notify_one();
    let first = first.await.unwrap().unwrap();
    assert!(matches!(first, RefreshOutcome::Updated { .. }));
}

#[tokio::test]
async fn test_settings_change_clears_badge_then_refreshes() {
    let h = harness(vec![Script::Page(PROFILE_PAGE)]);
    configure(h.store.as_ref(), profile("abc")).await;

    let outcome = h.coordinator.on_settings_changed().await.unwrap();

    assert!(matches!(outcome, RefreshOutcome::Updated { .. }));
    let badges = h.recorder.badges.lock().clone();
    assert_eq!(badges.len(), 2);
    assert!(badges[0].is_cleared());
    assert_eq!(badges[1].text, "1234");
}

#[tokio::test]
async fn test_profile_change_does_not_carry_old_totals() {
    let h = harness(vec![Script::Page(PROFILE_PAGE)]);
    configure(h.store.as_ref(), profile("old")).await;
    let updated_at = Utc::now() - TimeDelta::hours(2);
    let snapshot = MetricsSnapshot::new(older_metrics(), updated_at);
    CacheRepository::persist(h.store.as_ref(), &snapshot, updated_at, Some(10))
        .await
        .unwrap();

    citewatch::settings::save(h.store.as_ref(), &profile("new"))
        .await
        .unwrap();
    let outcome = h.coordinator.on_settings_changed().await.unwrap();

    assert!(matches!(outcome, RefreshOutcome::Updated { ref notifications, .. } if notifications.is_empty()));
    let record = cache(h.store.as_ref()).await;
    assert_eq!(record.last_snapshot.as_ref().map(|s| s.citations), Some(1234));
    assert_eq!(record.previous_citations, None);
    assert_eq!(record.citation_change(), None);
}

// ---------------------------------------------------------------------------
// present() and force_update()
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_present_without_profile() {
    let h = harness(vec![]);
    assert!(matches!(
        h.coordinator.present().await.unwrap(),
        Presentation::NotConfigured
    ));
    assert_eq!(h.source.calls(), 0);
}

#[tokio::test]
async fn test_present_fresh_cache_has_no_background_refresh() {
    let h = harness(vec![]);
    configure(h.store.as_ref(), profile("abc")).await;
    seed_cache(h.store.as_ref(), older_metrics(), Utc::now() - TimeDelta::minutes(10)).await;

    match h.coordinator.present().await.unwrap() {
        Presentation::Cached { view, background } => {
            assert_eq!(view.snapshot.citations, 1000);
            assert_eq!(view.age_text, "updated 10 min ago");
            assert!(background.is_none());
        }
        other => panic!("expected Cached, got {:?}", other),
    }
    assert_eq!(h.recorder.badges.lock().last().unwrap().text, "1000");
}

#[tokio::test]
async fn test_present_stale_cache_refreshes_in_background() {
    let h = harness(vec![Script::Page(PROFILE_PAGE)]);
    configure(h.store.as_ref(), profile("abc")).await;
    seed_cache(h.store.as_ref(), older_metrics(), Utc::now() - TimeDelta::hours(3)).await;

    let Presentation::Cached { view, background } = h.coordinator.present().await.unwrap() else {
        panic!("expected Cached");
    };
    assert_eq!(view.snapshot.citations, 1000);

    let outcome = background.expect("stale cache spawns a refresh").await.unwrap().unwrap();
    assert!(matches!(outcome, RefreshOutcome::Updated { .. }));
    assert_eq!(cache(h.store.as_ref()).await.last_snapshot.unwrap().citations, 1234);
}

#[tokio::test]
async fn test_present_expired_cache_fetches_first() {
    let h = harness(vec![Script::Page(PROFILE_PAGE)]);
    configure(h.store.as_ref(), profile("abc")).await;
    seed_cache(h.store.as_ref(), older_metrics(), Utc::now() - TimeDelta::hours(30)).await;

    match h.coordinator.present().await.unwrap() {
        Presentation::Fetched(RefreshOutcome::Updated { snapshot, .. }) => {
            assert_eq!(snapshot.citations, 1234)
        }
        other => panic!("expected Fetched, got {:?}", other),
    }
}

#[tokio::test]
async fn test_force_update_reports() {
    let h = harness(vec![Script::Page(PROFILE_PAGE), Script::Page(UNRELATED_PAGE)]);
    configure(h.store.as_ref(), profile("abc")).await;

    let ok = h.coordinator.force_update().await;
    assert!(ok.success);
    assert!(ok.error.is_none());

    let degraded = h.coordinator.force_update().await;
    assert!(!degraded.success);
    assert!(degraded.error.is_some());
}

// ---------------------------------------------------------------------------
// End to end through the real transport
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_unreachable_profile_keeps_cache_end_to_end() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let transport = TransportConfig {
        proxies: vec![
            format!("{}/a?url=", server.url()),
            format!("{}/b?url=", server.url()),
        ],
        ..Default::default()
    };
    let scholar = ScholarConfig {
        base_url: format!("{}/citations", server.url()),
        ..Default::default()
    };

    let store = Arc::new(MemoryStore::new());
    let recorder = Arc::new(Recorder::default());
    let coordinator = Coordinator::new(
        store.clone(),
        Arc::new(TransportResolver::new(&transport).unwrap()),
        sinks(&recorder),
        scholar,
        &CacheConfig::default(),
    );
    configure(store.as_ref(), profile("abc")).await;
    seed_cache(store.as_ref(), older_metrics(), Utc::now() - TimeDelta::hours(2)).await;
    let before = cache(store.as_ref()).await;

    let err = coordinator.refresh(Trigger::Manual, false).await.unwrap_err();

    assert!(matches!(err, CiteError::TransportFailure { attempts: 3, .. }));
    assert_eq!(cache(store.as_ref()).await, before);
    assert!(recorder.badges.lock().is_empty());
    mock.assert_async().await;
}
