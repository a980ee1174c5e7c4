//! Cache-fronted access to the catalog.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::client::CatalogClient;
use crate::error::{AppError, Result};
use crate::models::QueryParams;
use crate::services::cache::{CacheKey, CachedResponse, ResponseCache};

/// A decoded catalog answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Documents(T),
    NoDocuments,
}

/// Catalog client paired with the session cache.
///
/// Every request is answered from the cache when possible. On a miss the
/// response is decoded first and only cached once decoding succeeds, so the
/// cache never holds a body the record schemas reject.
pub struct Catalog {
    client: Arc<dyn CatalogClient>,
    cache: Arc<ResponseCache>,
    request_delay: Duration,
    network_requests: AtomicUsize,
}

impl Catalog {
    pub fn new(client: Arc<dyn CatalogClient>, cache: Arc<ResponseCache>) -> Self {
        Self {
            client,
            cache,
            request_delay: Duration::ZERO,
            network_requests: AtomicUsize::new(0),
        }
    }

    /// Wait this long before each network request.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Requests that actually went to the network this session.
    pub fn network_requests(&self) -> usize {
        self.network_requests.load(Ordering::Relaxed)
    }

    /// Fetch and decode `endpoint` with the given parameters.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &QueryParams,
    ) -> Result<Fetched<T>> {
        let key = CacheKey::new(endpoint, params.clone());

        if let Some(cached) = self.cache.get(&key) {
            log::debug!("Cache hit: {}", key);
            return decode(&key, &cached);
        }

        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        log::debug!("Cache miss: {}", key);
        self.network_requests.fetch_add(1, Ordering::Relaxed);
        let response = CachedResponse::from(self.client.get(endpoint, params).await?);
        let decoded = decode(&key, &response)?;
        self.cache.put(key, response);

        Ok(decoded)
    }
}

/// Decode a cached body into a record type. Shape mismatches are transport
/// failures.
fn decode<T: DeserializeOwned>(key: &CacheKey, response: &CachedResponse) -> Result<Fetched<T>> {
    match response {
        CachedResponse::NoDocuments => Ok(Fetched::NoDocuments),
        CachedResponse::Documents(body) => T::deserialize(body)
            .map(Fetched::Documents)
            .map_err(|e| AppError::transport(key.to_string(), format!("unexpected shape: {e}"))),
    }
}
