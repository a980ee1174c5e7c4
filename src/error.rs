// src/error.rs

//! Unified error handling for the query shell.

use std::fmt;

use thiserror::Error;

/// Result type alias for shell operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Unrecognized or malformed filter key, rejected before any request
    #[error("Invalid filter '{key}': {message}")]
    InvalidFilter { key: String, message: String },

    /// Network or decode failure while talking to the catalog
    #[error("Transport failure for {context}: {message}")]
    Transport { context: String, message: String },

    /// REPL input that could not be parsed into a command
    #[error("Malformed command: {0}")]
    MalformedCommand(String),

    /// Wall-clock value in neither supported encoding
    #[error("Unrecognized time '{0}'")]
    TimeFormat(String),

    /// Campus map lookup failed
    #[error("Map error: {0}")]
    Map(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create an invalid filter error.
    pub fn invalid_filter(key: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::InvalidFilter {
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Create a transport error with context.
    pub fn transport(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Transport {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a malformed command error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedCommand(message.into())
    }

    /// Create a map error.
    pub fn map(message: impl Into<String>) -> Self {
        Self::Map(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the error came from the network or from decoding a response.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Http(_) | Self::Json(_) | Self::TimeFormat(_)
        )
    }
}
