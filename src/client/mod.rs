//! Remote API clients.
//!
//! - [`CatalogClient`]: the course catalog, consumed by the fetcher and resolver
//! - [`MapClient`]: campus map interiors used for drawing rooms

#[cfg(feature = "map")]
mod map;
mod nebula;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::QueryParams;

#[cfg(feature = "map")]
pub use map::{Category, CategoryRef, Children, MapClient, Room, Shape};
pub use nebula::{NO_DOCUMENTS, NebulaClient};

/// Outcome of a successful catalog request.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Decoded response body
    Documents(Value),
    /// The catalog's explicit "nothing matched" answer
    NoDocuments,
}

/// Read-only access to the course catalog.
///
/// Implementations distinguish a normal payload, the "no documents"
/// sentinel, and transport/decode failure (`Err`).
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn get(&self, path: &str, params: &QueryParams) -> Result<Payload>;
}
