// In-memory key-value store
// Author: kelexine (https://github.com/kelexine)

use super::{KeyValueStore, Partition};
use crate::error::Result;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Process-local store, used by tests and one-shot runs without a data dir.
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: RwLock<HashMap<Partition, Map<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of one partition's current contents.
    pub fn snapshot(&self, partition: Partition) -> Map<String, Value> {
        self.partitions
            .read()
            .get(&partition)
            .cloned()
            .unwrap_or_default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get<'a>(
        &'a self,
        partition: Partition,
        keys: &'a [&'a str],
    ) -> BoxFuture<'a, Result<Map<String, Value>>> {
        let result = {
            let partitions = self.partitions.read();
            let mut found = Map::new();
            if let Some(entries) = partitions.get(&partition) {
                for key in keys {
                    if let Some(value) = entries.get(*key) {
                        found.insert((*key).to_string(), value.clone());
                    }
                }
            }
            found
        };
        async move { Ok(result) }.boxed()
    }

    fn set(&self, partition: Partition, entries: Map<String, Value>) -> BoxFuture<'_, Result<()>> {
        self.partitions
            .write()
            .entry(partition)
            .or_default()
            .extend(entries);
        async { Ok(()) }.boxed()
    }

    fn remove<'a>(&'a self, partition: Partition, keys: &'a [&'a str]) -> BoxFuture<'a, Result<()>> {
        if let Some(entries) = self.partitions.write().get_mut(&partition) {
            for key in keys {
                entries.remove(*key);
            }
        }
        async { Ok(()) }.boxed()
    }
}
