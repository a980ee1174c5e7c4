//! Storage abstractions for exports, drawings and cache snapshots.
//!
//! ## Directory Structure
//!
//! ```text
//! {export_dir}/
//! ├── 23F_JO_1-102.json           # Exported record set
//! └── JO_1-102.kml                # Room drawing
//! {cache_dir}/
//! └── 20261016-142501.cache.json  # Cache snapshot, one per session
//! ```

pub mod local;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Section;
use crate::services::CacheSnapshot;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for record storage backends.
#[async_trait]
pub trait RecordStorage: Send + Sync {
    /// Write a record set as pretty JSON named after `stem`.
    async fn export_sections(&self, stem: &str, sections: &[Section]) -> Result<PathBuf>;

    /// Read an exported record set back.
    async fn load_export(&self, path: &Path) -> Result<Vec<Section>>;

    /// Write a KML drawing named after `stem`.
    async fn write_drawing(&self, stem: &str, kml: &str) -> Result<PathBuf>;

    /// Write this session's cache snapshot.
    async fn write_cache_snapshot(&self, snapshot: &CacheSnapshot) -> Result<PathBuf>;

    /// Read a cache snapshot written by an earlier session.
    async fn load_cache_snapshot(&self, path: &Path) -> Result<CacheSnapshot>;
}
