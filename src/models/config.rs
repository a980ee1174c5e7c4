//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Course catalog API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Campus map API settings
    #[serde(default)]
    pub map: MapConfig,

    /// Export and cache file locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Console output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::validation("api.base_url is empty"));
        }
        url::Url::parse(&self.api.base_url)?;
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        if self.api.max_pages == Some(0) {
            return Err(AppError::validation("api.max_pages must be > 0"));
        }
        url::Url::parse(&self.map.base_url)?;
        Ok(())
    }
}

/// Course catalog API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Root URL of the catalog API
    #[serde(default = "defaults::api_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key
    #[serde(default = "defaults::api_key_env")]
    pub api_key_env: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay before each network request in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Optional upper bound on pages in one fetch-all; unlimited when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<usize>,
}

impl ApiConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::api_base_url(),
            api_key_env: defaults::api_key_env(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_pages: None,
        }
    }
}

/// Campus map (Concept3D) API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "defaults::map_base_url")]
    pub base_url: String,

    #[serde(default = "defaults::map_key_env")]
    pub api_key_env: String,

    /// Concept3D map number for the campus
    #[serde(default = "defaults::map_number")]
    pub map_number: u32,

    /// Category whose children are the building interiors
    #[serde(default = "defaults::interior_category")]
    pub interior_category: u64,
}

impl MapConfig {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::map_base_url(),
            api_key_env: defaults::map_key_env(),
            map_number: defaults::map_number(),
            interior_category: defaults::interior_category(),
        }
    }
}

/// Export and cache file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for exports and drawings
    #[serde(default = "defaults::export_dir")]
    pub export_dir: PathBuf,

    /// Directory for cache snapshots
    #[serde(default = "defaults::cache_dir")]
    pub cache_dir: PathBuf,

    /// Write a cache snapshot when the shell exits
    #[serde(default = "defaults::persist_on_exit")]
    pub persist_on_exit: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            export_dir: defaults::export_dir(),
            cache_dir: defaults::cache_dir(),
            persist_on_exit: defaults::persist_on_exit(),
        }
    }
}

/// Console output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,

    /// Report records fetched while paging
    #[serde(default = "defaults::show_progress")]
    pub show_progress: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            show_progress: defaults::show_progress(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Catalog defaults
    pub fn api_base_url() -> String {
        "https://api.utdnebula.com".into()
    }
    pub fn api_key_env() -> String {
        "NEBULA_API_KEY".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; coursemap/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        0
    }

    // Map defaults
    pub fn map_base_url() -> String {
        "https://api.concept3d.com".into()
    }
    pub fn map_key_env() -> String {
        "MAP_API_KEY".into()
    }
    pub fn map_number() -> u32 {
        1772
    }
    pub fn interior_category() -> u64 {
        52264
    }

    // Storage defaults
    pub fn export_dir() -> PathBuf {
        PathBuf::from(".")
    }
    pub fn cache_dir() -> PathBuf {
        PathBuf::from(".")
    }
    pub fn persist_on_exit() -> bool {
        true
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }
    pub fn show_progress() -> bool {
        true
    }
}
