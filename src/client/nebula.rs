//! HTTP client for the Nebula course catalog.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::client::{CatalogClient, Payload};
use crate::error::{AppError, Result};
use crate::models::{ApiConfig, QueryParams};
use crate::utils::http::{api_key_header, create_client};

/// Body the catalog sends in `data` when a query matched nothing.
pub const NO_DOCUMENTS: &str = "mongo: no documents in result";

/// Response envelope wrapping every catalog answer.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Value,
}

impl Envelope {
    /// Interpret the envelope given the HTTP status it arrived with.
    fn into_payload(self, path: &str, status: reqwest::StatusCode) -> Result<Payload> {
        if self.data.as_str() == Some(NO_DOCUMENTS) {
            return Ok(Payload::NoDocuments);
        }
        if !status.is_success() {
            let detail = self
                .message
                .or_else(|| self.data.as_str().map(str::to_string))
                .unwrap_or_default();
            return Err(AppError::transport(path, format!("HTTP {status}: {detail}")));
        }
        Ok(Payload::Documents(self.data))
    }
}

/// Catalog client speaking the Nebula REST API.
pub struct NebulaClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl NebulaClient {
    /// Create a client from the API settings, reading the key from the environment.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let api_key = config.api_key();
        if api_key.is_none() {
            log::warn!(
                "{} is not set; catalog requests will be unauthenticated",
                config.api_key_env
            );
        }
        Self::with_key(config, api_key)
    }

    /// Create a client with an explicit key.
    pub fn with_key(config: &ApiConfig, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
            base_url: Self::normalize_base(&config.base_url)?,
            api_key,
        })
    }

    /// Parse the base URL so relative joins keep its path.
    fn normalize_base(base: &str) -> Result<Url> {
        let with_slash = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        Ok(Url::parse(&with_slash)?)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}

#[async_trait]
impl CatalogClient for NebulaClient {
    async fn get(&self, path: &str, params: &QueryParams) -> Result<Payload> {
        let url = self.endpoint(path)?;
        log::debug!("GET {} {:?}", url, params);

        let mut request = self.client.get(url).query(params);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", api_key_header(key)?);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::transport(path, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::transport(path, e))?;
        let envelope: Envelope = serde_json::from_str(&body)
            .map_err(|e| AppError::transport(path, format!("undecodable response: {e}")))?;

        envelope.into_payload(path, status)
    }
}
