// src/models/mod.rs

//! Domain models for the query shell.
//!
//! Catalog records, filters, time normalization and configuration.

mod config;
mod filter;
mod section;
pub mod time;

// Re-export all public types
pub use config::{ApiConfig, Config, LoggingConfig, MapConfig, StorageConfig};
pub use filter::{
    FilterKey, FilterSpec, FilterSpecBuilder, FilterValue, QueryParams, canonical_params,
};
pub use section::{Course, Location, Meeting, Section, WEEKDAYS};
