//! Persistence of last-known actuator outputs
//!
//! Snapshots are stored as a single versioned JSON document, written
//! atomically so a crash mid-write never leaves a truncated file behind.

mod snapshot;
mod storage;

pub use snapshot::{OutputSnapshot, OutputSnapshotStore, SNAPSHOT_KEY};
pub use storage::{StorageFile, VersionedFile};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported version {found} for {key}, expected {expected}")]
    VersionMismatch {
        key: String,
        expected: u32,
        found: u32,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
