//! In-memory response cache.
//!
//! Responses are keyed by endpoint plus the sorted set of query parameters.
//! Entries are write-once and live for the whole session; a snapshot can be
//! written at shutdown and loaded back explicitly.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::Payload;
use crate::models::{FilterSpec, QueryParams, canonical_params};

/// Cache key: endpoint plus canonical query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub endpoint: String,
    pub params: QueryParams,
}

impl CacheKey {
    pub fn new(endpoint: impl Into<String>, params: QueryParams) -> Self {
        Self {
            endpoint: endpoint.into(),
            params,
        }
    }

    /// Key for an unpaged request against a filter set.
    pub fn for_filter(endpoint: impl Into<String>, filter: &FilterSpec) -> Self {
        Self::new(endpoint, filter.to_params())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            f.write_str(&self.endpoint)
        } else {
            write!(f, "{}?{}", self.endpoint, canonical_params(&self.params))
        }
    }
}

/// A cached catalog answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum CachedResponse {
    Documents(Value),
    NoDocuments,
}

impl From<Payload> for CachedResponse {
    fn from(payload: Payload) -> Self {
        match payload {
            Payload::Documents(body) => CachedResponse::Documents(body),
            Payload::NoDocuments => CachedResponse::NoDocuments,
        }
    }
}

/// One persisted cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub key: CacheKey,
    pub response: CachedResponse,
}

/// Serialized form of the whole cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub created_at: DateTime<Utc>,
    pub entries: Vec<CacheRecord>,
}

/// Session-wide response cache, safe to share across tasks.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<CacheKey, CachedResponse>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a previously completed request.
    pub fn get(&self, key: &CacheKey) -> Option<CachedResponse> {
        self.entries.read().get(key).cloned()
    }

    /// Convenience lookup by endpoint and filter set.
    pub fn get_filtered(&self, endpoint: &str, filter: &FilterSpec) -> Option<CachedResponse> {
        self.get(&CacheKey::for_filter(endpoint, filter))
    }

    /// Store a response. Returns `false` if the key was already present, in
    /// which case the existing entry is kept.
    pub fn put(&self, key: CacheKey, response: CachedResponse) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            return false;
        }
        entries.insert(key, response);
        true
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy every entry out, sorted by key.
    pub fn snapshot(&self) -> CacheSnapshot {
        let mut entries: Vec<CacheRecord> = self
            .entries
            .read()
            .iter()
            .map(|(key, response)| CacheRecord {
                key: key.clone(),
                response: response.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        CacheSnapshot {
            created_at: Utc::now(),
            entries,
        }
    }

    /// Load entries from a snapshot without overwriting live ones.
    /// Returns the number of entries added.
    pub fn restore(&self, snapshot: CacheSnapshot) -> usize {
        let mut entries = self.entries.write();
        let mut added = 0;
        for record in snapshot.entries {
            if !entries.contains_key(&record.key) {
                entries.insert(record.key, record.response);
                added += 1;
            }
        }
        added
    }
}
