//! Output snapshot store: last-known actuator outputs across restarts

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use dom_core::RememberedOutput;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{StorageError, StorageFile, StorageResult, VersionedFile};

pub const SNAPSHOT_KEY: &str = "domotic.output_states";
const VERSION: u32 = 1;
const MINOR_VERSION: u32 = 1;

/// Snapshot payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSnapshot {
    pub saved_at: DateTime<Utc>,
    pub outputs: Vec<RememberedOutput>,
}

/// Reads and writes the output snapshot file
#[derive(Debug, Clone)]
pub struct OutputSnapshotStore {
    file: VersionedFile,
}

impl OutputSnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            file: VersionedFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Remembered outputs keyed by block name; empty if no snapshot exists
    pub async fn load(&self) -> StorageResult<HashMap<String, RememberedOutput>> {
        let Some(file) = self.file.load::<OutputSnapshot>().await? else {
            info!(path = %self.path().display(), "No output snapshot, actuators start from defaults");
            return Ok(HashMap::new());
        };
        if file.version != VERSION {
            return Err(StorageError::VersionMismatch {
                key: file.key,
                expected: VERSION,
                found: file.version,
            });
        }

        let outputs: HashMap<_, _> = file
            .data
            .outputs
            .into_iter()
            .map(|o| (o.block_name.clone(), o))
            .collect();
        info!(
            entries = outputs.len(),
            saved_at = %file.data.saved_at,
            "Read previous output states"
        );
        Ok(outputs)
    }

    /// Like [`load`](Self::load), but a broken snapshot only costs the
    /// remembered state, never the startup
    pub async fn load_or_default(&self) -> HashMap<String, RememberedOutput> {
        match self.load().await {
            Ok(outputs) => outputs,
            Err(e) => {
                error!(error = %e, "Cannot use remembered outputs, starting from defaults");
                HashMap::new()
            }
        }
    }

    pub async fn save(&self, outputs: Vec<RememberedOutput>) -> StorageResult<()> {
        let count = outputs.len();
        let snapshot = OutputSnapshot {
            saved_at: Utc::now(),
            outputs,
        };
        self.file
            .save(&StorageFile::new(
                SNAPSHOT_KEY,
                snapshot,
                VERSION,
                MINOR_VERSION,
            ))
            .await?;
        debug!(entries = count, path = %self.path().display(), "Wrote output snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_round_trip_by_block_name() {
        let dir = TempDir::new().unwrap();
        let store = OutputSnapshotStore::new(dir.path().join("DomoticOutputStates.json"));

        store
            .save(vec![
                RememberedOutput::new("hall", vec![1]),
                RememberedOutput::new("dl1", vec![0, 800]),
            ])
            .await
            .unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded["dl1"].values, vec![0, 800]);
        assert_eq!(loaded["hall"].flag(0), Some(true));
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = OutputSnapshotStore::new(dir.path().join("none.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_future_version_rejected_but_startup_survives() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("states.json");
        let future = StorageFile::new(
            SNAPSHOT_KEY,
            OutputSnapshot {
                saved_at: Utc::now(),
                outputs: vec![RememberedOutput::new("hall", vec![1])],
            },
            VERSION + 1,
            0,
        );
        VersionedFile::new(&path).save(&future).await.unwrap();

        let store = OutputSnapshotStore::new(&path);
        assert!(matches!(
            store.load().await,
            Err(StorageError::VersionMismatch { found: 2, .. })
        ));
        assert!(store.load_or_default().await.is_empty());
    }
}
