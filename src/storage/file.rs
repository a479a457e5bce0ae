// JSON file backed key-value store
// Author: kelexine (https://github.com/kelexine)

use super::{KeyValueStore, Partition};
use crate::error::{CiteError, Result};
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Stores each partition as one JSON object on disk (`sync.json`, `local.json`).
///
/// Writes go through a temp file and a rename so a crash mid-write never
/// leaves a truncated partition behind. A process-wide mutex serializes
/// read-modify-write cycles.
pub struct FileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn partition_path(&self, partition: Partition) -> PathBuf {
        self.dir.join(format!("{}.json", partition.as_str()))
    }

    async fn read_partition(&self, partition: Partition) -> Result<Map<String, Value>> {
        let path = self.partition_path(partition);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(CiteError::Storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                let aside = self.move_aside(&path).await;
                match partition {
                    // The cache can be fetched again; settings cannot.
                    Partition::Local => Ok(Map::new()),
                    Partition::Sync => Err(CiteError::Storage(format!(
                        "Malformed settings file {}, moved to {}",
                        path.display(),
                        aside.display()
                    ))),
                }
            }
        }
    }

    /// Rename a corrupt partition to `<name>.json.corrupt` so later writes
    /// start from an empty file without destroying the original bytes.
    async fn move_aside(&self, path: &Path) -> PathBuf {
        let aside = path.with_extension("json.corrupt");
        match tokio::fs::rename(path, &aside).await {
            Ok(()) => warn!(
                "Malformed storage file {}, moved to {}",
                path.display(),
                aside.display()
            ),
            Err(e) => warn!("Malformed storage file {} could not be moved: {}", path.display(), e),
        }
        aside
    }

    async fn write_partition(&self, partition: Partition, map: &Map<String, Value>) -> Result<()> {
        let path = self.partition_path(partition);
        let tmp = path.with_extension("json.tmp");

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CiteError::Storage(format!("Failed to create {}: {}", self.dir.display(), e)))?;

        let body = serde_json::to_vec_pretty(map)?;
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| CiteError::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| CiteError::Storage(format!("Failed to replace {}: {}", path.display(), e)))?;

        debug!("Wrote {} keys to {}", map.len(), path.display());
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get<'a>(
        &'a self,
        partition: Partition,
        keys: &'a [&'a str],
    ) -> BoxFuture<'a, Result<Map<String, Value>>> {
        async move {
            let mut all = self.read_partition(partition).await?;
            let mut found = Map::new();
            for key in keys {
                if let Some(value) = all.remove(*key) {
                    found.insert((*key).to_string(), value);
                }
            }
            Ok(found)
        }
        .boxed()
    }

    fn set(&self, partition: Partition, entries: Map<String, Value>) -> BoxFuture<'_, Result<()>> {
        async move {
            let _guard = self.write_lock.lock().await;
            let mut all = self.read_partition(partition).await?;
            all.extend(entries);
            self.write_partition(partition, &all).await
        }
        .boxed()
    }

    fn remove<'a>(&'a self, partition: Partition, keys: &'a [&'a str]) -> BoxFuture<'a, Result<()>> {
        async move {
            let _guard = self.write_lock.lock().await;
            let mut all = self.read_partition(partition).await?;
            let before = all.len();
            for key in keys {
                all.remove(*key);
            }
            if all.len() == before {
                return Ok(());
            }
            self.write_partition(partition, &all).await
        }
        .boxed()
    }
}
