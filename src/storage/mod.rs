//! Persistent key-value storage.
//!
//! The store is an opaque get/set/remove service split into two partitions:
//! `Sync` holds the user settings, `Local` holds the cached metrics. The
//! typed repositories in `repository` translate between the raw JSON values
//! and the `ProfileSettings` / `CacheRecord` models.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod file;
mod memory;
pub mod repository;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use repository::{CacheRepository, SettingsRepository};

use crate::error::Result;
use futures::future::BoxFuture;
use serde_json::{Map, Value};

/// Keys of the settings partition.
pub mod sync_keys {
    pub const PROFILE_ID: &str = "profileId";
    pub const PROFILE_URL: &str = "profileUrl";
    pub const NOTIFICATIONS_ENABLED: &str = "notificationsEnabled";
    pub const AUTO_UPDATE_ENABLED: &str = "autoUpdateEnabled";

    pub const ALL: &[&str] = &[PROFILE_ID, PROFILE_URL, NOTIFICATIONS_ENABLED, AUTO_UPDATE_ENABLED];
}

/// Keys of the cache partition.
pub mod local_keys {
    pub const CITATION_DATA: &str = "citationData";
    pub const LAST_UPDATE: &str = "lastUpdate";
    pub const PREVIOUS_CITATIONS: &str = "previousCitations";

    pub const ALL: &[&str] = &[CITATION_DATA, LAST_UPDATE, PREVIOUS_CITATIONS];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// User settings.
    Sync,
    /// Cached metrics.
    Local,
}

impl Partition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Sync => "sync",
            Partition::Local => "local",
        }
    }
}

/// Asynchronous key-value store shared by the coordinator and the settings service.
pub trait KeyValueStore: Send + Sync {
    /// Fetch the given keys. Missing keys are simply absent from the result.
    fn get<'a>(
        &'a self,
        partition: Partition,
        keys: &'a [&'a str],
    ) -> BoxFuture<'a, Result<Map<String, Value>>>;

    /// Write all entries in one operation.
    fn set(&self, partition: Partition, entries: Map<String, Value>) -> BoxFuture<'_, Result<()>>;

    fn remove<'a>(&'a self, partition: Partition, keys: &'a [&'a str]) -> BoxFuture<'a, Result<()>>;
}
