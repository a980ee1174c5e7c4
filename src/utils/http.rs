// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::ApiConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &ApiConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .default_headers(headers)
        .build()?;
    Ok(client)
}

/// Build an API key header value, rejecting keys with invalid characters.
pub fn api_key_header(key: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(key)
        .map_err(|e| AppError::config(format!("API key is not a valid header value: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_with_defaults() {
        assert!(create_client(&ApiConfig::default()).is_ok());
    }

    #[test]
    fn test_api_key_header() {
        assert!(api_key_header("abc123").unwrap().is_sensitive());
        assert!(api_key_header("bad\nkey").is_err());
    }
}
