//! Error handling for the staging client
//!
//! This module defines the error types used throughout the library: the
//! structural errors raised by the staging tree, the terminal transport
//! signals (timeout and abort) and the failures of the add endpoint.

use std::fmt;
use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, StorageError>;

/// Kind of a staging tree entry, carried by structural errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "directory"),
        }
    }
}

/// Error types that can occur when staging or uploading content
#[derive(Error, Debug)]
pub enum StorageError {
    /// The path is empty or consists only of separators
    #[error("Path \"{path}\" is not valid")]
    InvalidPath { path: String },

    /// A non-creating lookup found nothing under the requested name
    #[error("Directory {parent} does not contain {kind} named \"{name}\"")]
    NotFound {
        parent: String,
        name: String,
        kind: EntryKind,
    },

    /// A creation collided with an entry of either kind
    #[error("Directory {parent} already contains entry named \"{name}\"")]
    ExistingEntry { parent: String, name: String },

    /// The entry under the requested name has the other kind
    #[error("Directory {parent} does not contain {expected} named \"{name}\", it contains {actual} instead")]
    InvalidEntry {
        parent: String,
        name: String,
        expected: EntryKind,
        actual: EntryKind,
    },

    /// A write started past the end of the current content
    #[error("Provided offset {offset} is out of bounds for content of {size} bytes")]
    OutOfBounds { offset: u64, size: u64 },

    /// Operation timed out
    #[error("Operation timed out: {operation}")]
    Timeout { operation: String },

    /// Operation was aborted through its cancellation token
    #[error("Operation aborted: {operation}")]
    Aborted { operation: String },

    /// The add endpoint answered with a non-success status
    #[error("Upload failed: {message}")]
    UploadError { message: String },

    /// Invalid parameter
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// The daemon answered with something that is not an add entry
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL resolution error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl StorageError {
    /// Create a new invalid path error
    pub fn invalid_path(path: impl Into<String>) -> Self {
        StorageError::InvalidPath { path: path.into() }
    }

    /// Create a new not found error
    pub fn not_found(parent: impl Into<String>, name: impl Into<String>, kind: EntryKind) -> Self {
        StorageError::NotFound {
            parent: parent.into(),
            name: name.into(),
            kind,
        }
    }

    /// Create a new existing entry error
    pub fn existing_entry(parent: impl Into<String>, name: impl Into<String>) -> Self {
        StorageError::ExistingEntry {
            parent: parent.into(),
            name: name.into(),
        }
    }

    /// Create a new invalid entry error
    pub fn invalid_entry(
        parent: impl Into<String>,
        name: impl Into<String>,
        expected: EntryKind,
        actual: EntryKind,
    ) -> Self {
        StorageError::InvalidEntry {
            parent: parent.into(),
            name: name.into(),
            expected,
            actual,
        }
    }

    /// Create a new out of bounds error
    pub fn out_of_bounds(offset: u64, size: u64) -> Self {
        StorageError::OutOfBounds { offset, size }
    }

    /// Create a new timeout error
    pub fn timeout(operation: impl Into<String>) -> Self {
        StorageError::Timeout {
            operation: operation.into(),
        }
    }

    /// Create a new aborted error
    pub fn aborted(operation: impl Into<String>) -> Self {
        StorageError::Aborted {
            operation: operation.into(),
        }
    }

    /// Create a new upload error
    pub fn upload_error(message: impl Into<String>) -> Self {
        StorageError::UploadError {
            message: message.into(),
        }
    }

    /// Create a new invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        StorageError::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new invalid response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        StorageError::InvalidResponse {
            message: message.into(),
        }
    }

    /// Whether this is one of the structural errors raised by the staging tree
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            StorageError::InvalidPath { .. }
                | StorageError::NotFound { .. }
                | StorageError::ExistingEntry { .. }
                | StorageError::InvalidEntry { .. }
                | StorageError::OutOfBounds { .. }
        )
    }
}

impl Clone for StorageError {
    fn clone(&self) -> Self {
        match self {
            StorageError::InvalidPath { path } => StorageError::InvalidPath { path: path.clone() },
            StorageError::NotFound { parent, name, kind } => StorageError::NotFound {
                parent: parent.clone(),
                name: name.clone(),
                kind: *kind,
            },
            StorageError::ExistingEntry { parent, name } => StorageError::ExistingEntry {
                parent: parent.clone(),
                name: name.clone(),
            },
            StorageError::InvalidEntry {
                parent,
                name,
                expected,
                actual,
            } => StorageError::InvalidEntry {
                parent: parent.clone(),
                name: name.clone(),
                expected: *expected,
                actual: *actual,
            },
            StorageError::OutOfBounds { offset, size } => StorageError::OutOfBounds {
                offset: *offset,
                size: *size,
            },
            StorageError::Timeout { operation } => StorageError::Timeout {
                operation: operation.clone(),
            },
            StorageError::Aborted { operation } => StorageError::Aborted {
                operation: operation.clone(),
            },
            StorageError::UploadError { message } => StorageError::UploadError {
                message: message.clone(),
            },
            StorageError::InvalidParameter { parameter, message } => {
                StorageError::InvalidParameter {
                    parameter: parameter.clone(),
                    message: message.clone(),
                }
            }
            StorageError::ConfigError { message } => StorageError::ConfigError {
                message: message.clone(),
            },
            StorageError::InvalidResponse { message } => StorageError::InvalidResponse {
                message: message.clone(),
            },
            StorageError::Io(e) => StorageError::Io(std::io::Error::new(e.kind(), e.to_string())),
            StorageError::Json(e) => StorageError::invalid_response(e.to_string()),
            StorageError::Url(e) => StorageError::Url(*e),
        }
    }
}
