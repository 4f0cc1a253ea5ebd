//! Storage error types.

use std::fmt::Display;
use std::time::Duration;

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failures of the object store, tagged with the object key involved.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage is not configured: {0}")]
    Config(String),

    #[error("Object {key} does not exist")]
    NotFound { key: String },

    #[error("Upload of {key} failed: {message}")]
    Upload { key: String, message: String },

    #[error("Download of {key} failed: {message}")]
    Download { key: String, message: String },

    /// Presigned URLs live between one second and seven days.
    #[error("Presigned URL lifetime of {}s is out of range: {message}", .ttl.as_secs())]
    InvalidTtl { ttl: Duration, message: String },

    #[error("Presigning {key} failed: {message}")]
    Presign { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn upload(key: impl Into<String>, err: impl Display) -> Self {
        Self::Upload {
            key: key.into(),
            message: err.to_string(),
        }
    }

    pub fn download(key: impl Into<String>, err: impl Display) -> Self {
        Self::Download {
            key: key.into(),
            message: err.to_string(),
        }
    }

    pub fn presign(key: impl Into<String>, err: impl Display) -> Self {
        Self::Presign {
            key: key.into(),
            message: err.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
