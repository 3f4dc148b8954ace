//! Core error types for glimpse-core.
//!
//! Store failures are deliberately non-fatal to the viewing-session state
//! machine: the local guards stay authoritative for presentation and the
//! engine retries the store write opportunistically.

use std::path::PathBuf;
use thiserror::Error;

use crate::message::MessageKey;

/// Core error type for glimpse-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Message-store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Message-store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No record exists for the requested message
    #[error("No protected message at {key}")]
    NotFound { key: MessageKey },

    /// The backing store could not service the call
    #[error("Store unavailable during {op}: {message}")]
    Unavailable { op: &'static str, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
