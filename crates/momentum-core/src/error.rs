//! Core error types for momentum-core.
//!
//! This module defines the error hierarchy using thiserror. Remote store
//! failures, local storage failures and configuration failures each get
//! their own enum and convert into [`CoreError`].

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for momentum-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Remote habit store errors
    #[error("Remote store error: {0}")]
    Store(#[from] StoreError),

    /// Local key-value storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The coordinator task has stopped
    #[error("Habit coordinator is no longer running")]
    CoordinatorClosed,
}

/// Errors reported by a [`RemoteHabitStore`](crate::remote::RemoteHabitStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No active user scope for a remote call
    #[error("Authentication required")]
    AuthRequired,

    /// The record could not be serialized for a write
    #[error("Failed to encode habit '{name}': {message}")]
    Encode { name: String, message: String },

    /// A single remote document is malformed
    #[error("Failed to decode habit document {document_id}: {message}")]
    Decode {
        document_id: String,
        message: String,
    },

    /// Network or server failure
    #[error("Remote IO error: {0}")]
    RemoteIo(String),

    /// The on-disk store backing offline mode failed
    #[error("Local habit store error: {0}")]
    Local(String),

    /// Delete requested for a record that was never persisted
    #[error("Habit '{0}' has no remote id to delete")]
    MissingRemoteId(String),
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        StoreError::Local(err.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::RemoteIo(err.to_string())
    }
}

/// Local key-value storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to read a stored value
    #[error("Failed to read '{key}' from {path}: {source}")]
    ReadFailed {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a stored value
    #[error("Failed to write '{key}' to {path}: {source}")]
    WriteFailed {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored value is not valid for the requested type
    #[error("Stored value for '{key}' is malformed: {message}")]
    Malformed { key: String, message: String },

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDirUnavailable(String),
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

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
