//! Local filesystem storage implementation.
//!
//! Exports and drawings go to the export directory; the session's cache
//! snapshot goes to the cache directory under a name stamped when the
//! storage is created, so a session writes at most one snapshot file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Section, StorageConfig};
use crate::services::CacheSnapshot;
use crate::storage::RecordStorage;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    export_dir: PathBuf,
    cache_dir: PathBuf,
    session_stamp: String,
}

impl LocalStorage {
    /// Create a LocalStorage from the storage settings.
    pub fn new(config: &StorageConfig) -> Self {
        Self::with_dirs(&config.export_dir, &config.cache_dir)
    }

    /// Create a LocalStorage with explicit directories.
    pub fn with_dirs(export_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
            cache_dir: cache_dir.into(),
            session_stamp: Local::now().format("%Y%m%d-%H%M%S").to_string(),
        }
    }

    /// Path of this session's cache snapshot.
    pub fn snapshot_path(&self) -> PathBuf {
        self.cache_dir.join(format!("{}.cache.json", self.session_stamp))
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(path, &bytes).await
    }

    /// Read JSON data, with a clear error for missing files.
    async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::config(format!(
                "File not found: {}",
                path.display()
            ))),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl RecordStorage for LocalStorage {
    async fn export_sections(&self, stem: &str, sections: &[Section]) -> Result<PathBuf> {
        let path = self.export_dir.join(format!("{stem}.json"));
        self.write_json(&path, sections).await?;
        log::info!("Exported {} sections to {}", sections.len(), path.display());
        Ok(path)
    }

    async fn load_export(&self, path: &Path) -> Result<Vec<Section>> {
        self.read_json(path).await
    }

    async fn write_drawing(&self, stem: &str, kml: &str) -> Result<PathBuf> {
        let path = self.export_dir.join(format!("{stem}.kml"));
        self.write_bytes(&path, kml.as_bytes()).await?;
        Ok(path)
    }

    async fn write_cache_snapshot(&self, snapshot: &CacheSnapshot) -> Result<PathBuf> {
        let path = self.snapshot_path();
        self.write_json(&path, snapshot).await?;
        log::info!(
            "Cache snapshot with {} entries written to {}",
            snapshot.entries.len(),
            path.display()
        );
        Ok(path)
    }

    async fn load_cache_snapshot(&self, path: &Path) -> Result<CacheSnapshot> {
        self.read_json(path).await
    }
}
