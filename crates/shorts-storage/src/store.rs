//! Object store seam used by the pipeline and the HTTP layer.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::client::S3Client;
use crate::error::StorageResult;

/// Storage operations the clip pipeline depends on.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Presigned URL the caller can PUT `content_type` bytes to.
    async fn presign_upload(&self, key: &str, content_type: &str, ttl: Duration) -> StorageResult<String>;

    /// Presigned URL to read an object.
    async fn presign_download(&self, key: &str, ttl: Duration) -> StorageResult<String>;

    /// Fetch an object into a local file.
    async fn download(&self, key: &str, path: &Path) -> StorageResult<()>;

    /// Store a local file under `key`.
    async fn upload(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()>;

    /// Store a local file and return a presigned read URL for it.
    async fn publish(
        &self,
        path: &Path,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> StorageResult<String> {
        self.upload(path, key, content_type).await?;
        self.presign_download(key, ttl).await
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn presign_upload(&self, key: &str, content_type: &str, ttl: Duration) -> StorageResult<String> {
        self.presign_put(key, content_type, ttl).await
    }

    async fn presign_download(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        self.presign_get(key, ttl).await
    }

    async fn download(&self, key: &str, path: &Path) -> StorageResult<()> {
        self.download_file(key, path).await.map(|_| ())
    }

    async fn upload(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        self.upload_file(path, key, content_type).await
    }
}
