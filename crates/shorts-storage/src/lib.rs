//! S3-compatible object storage client.
//!
//! This crate provides:
//! - Presigned upload and download URLs
//! - Streaming download to local files and file upload
//! - The object key layout for uploads and clips
//! - The [`ObjectStore`] trait the pipeline stores through

pub mod client;
pub mod error;
pub mod keys;
pub mod store;

pub use client::{S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use keys::{clip_key, sanitize_filename, upload_key, DEFAULT_VIDEO_CONTENT_TYPE};
pub use store::ObjectStore;
