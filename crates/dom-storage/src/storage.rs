//! Versioned JSON file envelope with atomic writes

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::{StorageError, StorageResult};

/// Storage file wrapper with version tracking
///
/// JSON format:
/// ```json
/// {
///   "version": 1,
///   "minor_version": 1,
///   "key": "domotic.output_states",
///   "data": { ... }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageFile<T> {
    /// Major version - breaking changes
    pub version: u32,
    /// Minor version - additive changes
    pub minor_version: u32,
    pub key: String,
    pub data: T,
}

impl<T> StorageFile<T> {
    pub fn new(key: impl Into<String>, data: T, version: u32, minor_version: u32) -> Self {
        Self {
            version,
            minor_version,
            key: key.into(),
            data,
        }
    }
}

/// One versioned JSON document at a fixed path
#[derive(Debug, Clone)]
pub struct VersionedFile {
    path: PathBuf,
}

impl VersionedFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Load the document; `None` if the file does not exist
    pub async fn load<T>(&self) -> StorageResult<Option<StorageFile<T>>>
    where
        T: DeserializeOwned,
    {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Storage file not found");
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let file: StorageFile<T> =
            serde_json::from_str(&content).map_err(|source| StorageError::Json {
                path: self.path.display().to_string(),
                source,
            })?;
        debug!(
            path = %self.path.display(),
            version = file.version,
            minor_version = file.minor_version,
            "Loaded storage file"
        );
        Ok(Some(file))
    }

    /// Save the document
    ///
    /// Writes atomically by first writing to a temp file, then renaming.
    pub async fn save<T>(&self, file: &StorageFile<T>) -> StorageResult<()>
    where
        T: Serialize,
    {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let content =
            serde_json::to_string_pretty(file).map_err(|source| StorageError::Json {
                path: self.path.display().to_string(),
                source,
            })?;

        let temp_path = self.temp_path();
        fs::write(&temp_path, &content)
            .await
            .map_err(|e| self.io_error(e))?;
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), key = %file.key, "Saved storage file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        value: i32,
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let file = VersionedFile::new(dir.path().join("nested").join("sample.json"));
        let sample = Sample {
            name: "x".to_string(),
            value: 42,
        };

        file.save(&StorageFile::new("sample", sample.clone(), 1, 2))
            .await
            .unwrap();
        let loaded: StorageFile<Sample> = file.load().await.unwrap().unwrap();
        assert_eq!(loaded.data, sample);
        assert_eq!(loaded.minor_version, 2);
        assert!(!file.temp_path().exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let file = VersionedFile::new(dir.path().join("absent.json"));
        let loaded: Option<StorageFile<Sample>> = file.load().await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_json_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result: StorageResult<Option<StorageFile<Sample>>> =
            VersionedFile::new(&path).load().await;
        assert!(matches!(result, Err(StorageError::Json { .. })));
    }
}
