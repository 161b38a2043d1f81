//! Prometheus file-SD target collections kept in sync with the ledger.
//!
//! Each collection is one JSON file holding the full list of scrape
//! targets; every write persists the whole collection. Entries are keyed
//! by their `alias` label, and entries for other aliases, including
//! foreign ones written by other tooling, pass through untouched.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::debug;

/// File name of the storage-service scrape collection.
const STORAGE_FILE: &str = "targets_minio.json";

/// File name of the host-metrics scrape collection.
const HOST_METRICS_FILE: &str = "targets_node.json";

/// The two scrape configurations maintained for every node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TargetKind {
    /// MinIO service instances, one target per instance API port.
    Storage,

    /// Host-level metrics exporter.
    HostMetrics,
}

impl TargetKind {
    const fn file_name(self) -> &'static str {
        match self {
            Self::Storage => STORAGE_FILE,
            Self::HostMetrics => HOST_METRICS_FILE,
        }
    }
}

/// Synchronizes per-alias entries in the monitoring target collections.
///
/// All mutations go through one internal lock, so concurrent API
/// operations cannot interleave their read-modify-write cycles on the
/// same files.
#[derive(Clone)]
pub struct TargetFeed {
    dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl TargetFeed {
    /// Creates a feed rooted at the given directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Adds or replaces the entry for `alias` in one collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection file cannot be written.
    pub async fn upsert(
        &self,
        kind: TargetKind,
        alias: &str,
        targets: &[String],
    ) -> Result<(), Error> {
        let entry = json!({
            "targets": targets,
            "labels": { "alias": alias },
        });

        self.rewrite(kind, alias, Some(entry)).await
    }

    /// Removes the entry for `alias` from one collection, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection file cannot be written.
    pub async fn remove(&self, kind: TargetKind, alias: &str) -> Result<(), Error> {
        self.rewrite(kind, alias, None).await
    }

    /// Reads one collection; a missing, empty, or malformed file reads as
    /// an empty collection.
    pub async fn read(&self, kind: TargetKind) -> Vec<Value> {
        Self::load(&self.path(kind)).await
    }

    fn path(&self, kind: TargetKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    async fn load(path: &Path) -> Vec<Value> {
        let Ok(raw) = tokio::fs::read(path).await else {
            return Vec::new();
        };

        match serde_json::from_slice::<Value>(&raw) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) | Err(_) => {
                debug!("treating malformed target file {} as empty", path.display());
                Vec::new()
            }
        }
    }

    async fn rewrite(
        &self,
        kind: TargetKind,
        alias: &str,
        new_entry: Option<Value>,
    ) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;

        let path = self.path(kind);
        let mut entries = Self::load(&path).await;

        entries.retain(|entry| entry["labels"]["alias"].as_str() != Some(alias));
        if let Some(entry) = new_entry {
            entries.push(entry);
        }

        let rendered = serde_json::to_vec_pretty(&Value::Array(entries))?;
        tokio::fs::write(&path, rendered)
            .await
            .map_err(|e| Error::Io("failed to write target file", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets_of(entry: &Value) -> Vec<&str> {
        entry["targets"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t.as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn upsert_replaces_only_the_matching_alias() {
        let dir = tempfile::tempdir().unwrap();
        let feed = TargetFeed::new(dir.path());

        feed.upsert(TargetKind::Storage, "alpha", &["10.0.0.1:9001".to_owned()])
            .await
            .unwrap();
        feed.upsert(TargetKind::Storage, "beta", &["10.0.0.2:9001".to_owned()])
            .await
            .unwrap();
        feed.upsert(TargetKind::Storage, "alpha", &["10.0.0.1:9003".to_owned()])
            .await
            .unwrap();

        let entries = feed.read(TargetKind::Storage).await;
        assert_eq!(entries.len(), 2);

        let beta = entries
            .iter()
            .find(|e| e["labels"]["alias"] == "beta")
            .unwrap();
        assert_eq!(targets_of(beta), vec!["10.0.0.2:9001"]);

        let alpha = entries
            .iter()
            .find(|e| e["labels"]["alias"] == "alpha")
            .unwrap();
        assert_eq!(targets_of(alpha), vec!["10.0.0.1:9003"]);
    }

    #[tokio::test]
    async fn remove_leaves_other_aliases_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let feed = TargetFeed::new(dir.path());

        feed.upsert(TargetKind::HostMetrics, "alpha", &["10.0.0.1:9100".to_owned()])
            .await
            .unwrap();
        feed.upsert(TargetKind::HostMetrics, "beta", &["10.0.0.2:9100".to_owned()])
            .await
            .unwrap();

        feed.remove(TargetKind::HostMetrics, "alpha").await.unwrap();

        let entries = feed.read(TargetKind::HostMetrics).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["labels"]["alias"], "beta");
    }

    #[tokio::test]
    async fn foreign_entries_pass_through_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORAGE_FILE);

        // An entry written by other tooling, with labels we know nothing
        // about.
        std::fs::write(
            &path,
            r#"[{"targets":["10.9.9.9:9001"],"labels":{"alias":"foreign","rack":"b12"}}]"#,
        )
        .unwrap();

        let feed = TargetFeed::new(dir.path());
        feed.upsert(TargetKind::Storage, "alpha", &["10.0.0.1:9001".to_owned()])
            .await
            .unwrap();

        let entries = feed.read(TargetKind::Storage).await;
        assert_eq!(entries.len(), 2);

        let foreign = entries
            .iter()
            .find(|e| e["labels"]["alias"] == "foreign")
            .unwrap();
        assert_eq!(foreign["labels"]["rack"], "b12");
    }

    #[tokio::test]
    async fn malformed_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORAGE_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        let feed = TargetFeed::new(dir.path());
        assert!(feed.read(TargetKind::Storage).await.is_empty());

        // And a write through the feed repairs the file.
        feed.upsert(TargetKind::Storage, "alpha", &["10.0.0.1:9001".to_owned()])
            .await
            .unwrap();
        assert_eq!(feed.read(TargetKind::Storage).await.len(), 1);
    }

    #[tokio::test]
    async fn remove_from_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let feed = TargetFeed::new(dir.path());

        feed.remove(TargetKind::Storage, "ghost").await.unwrap();
        assert!(feed.read(TargetKind::Storage).await.is_empty());
    }

    #[tokio::test]
    async fn collections_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let feed = TargetFeed::new(dir.path());

        feed.upsert(TargetKind::Storage, "alpha", &["10.0.0.1:9001".to_owned()])
            .await
            .unwrap();
        feed.upsert(TargetKind::HostMetrics, "alpha", &["10.0.0.1:9100".to_owned()])
            .await
            .unwrap();

        feed.remove(TargetKind::Storage, "alpha").await.unwrap();

        assert!(feed.read(TargetKind::Storage).await.is_empty());
        assert_eq!(feed.read(TargetKind::HostMetrics).await.len(), 1);
    }
}
