//! S3 client implementation.

use std::path::Path;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Configuration for the S3 client.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Bucket name
    pub bucket: String,
    /// Region
    pub region: String,
    /// Custom endpoint for S3-compatible stores
    pub endpoint_url: Option<String>,
    /// Static credentials; the default AWS chain is used when absent
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl S3Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let bucket = std::env::var("S3_BUCKET")
            .map_err(|_| StorageError::config("S3_BUCKET not set"))?;

        Ok(Self {
            bucket,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            endpoint_url: non_empty_env("S3_ENDPOINT_URL"),
            access_key_id: non_empty_env("S3_ACCESS_KEY_ID"),
            secret_access_key: non_empty_env("S3_SECRET_ACCESS_KEY"),
        })
    }
}

/// Presigning settings for a URL lifetime, rejecting lifetimes the store
/// does not accept.
fn presigning_config(ttl: Duration) -> StorageResult<PresigningConfig> {
    PresigningConfig::expires_in(ttl).map_err(|e| StorageError::InvalidTtl {
        ttl,
        message: e.to_string(),
    })
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// S3-compatible storage client.
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    bucket: String,
}

impl S3Client {
    /// Create a new client from configuration.
    pub async fn new(config: S3Config) -> StorageResult<Self> {
        let region = Region::new(config.region.clone());

        let mut builder = match (&config.access_key_id, &config.secret_access_key) {
            (Some(key_id), Some(secret)) => {
                let credentials = Credentials::new(key_id, secret, None, None, "shorts-env");
                Builder::new()
                    .behavior_version(BehaviorVersion::latest())
                    .region(region)
                    .credentials_provider(credentials)
            }
            (None, None) => {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(region)
                    .load()
                    .await;
                Builder::from(&shared)
            }
            _ => {
                return Err(StorageError::config(
                    "S3_ACCESS_KEY_ID and S3_SECRET_ACCESS_KEY must be set together",
                ))
            }
        };

        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = S3Config::from_env()?;
        Self::new(config).await
    }

    /// Upload a file.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        debug!("Uploading {} to {}", path.display(), key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload(key, e))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload(key, e))?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(())
    }

    /// Stream an object to a file.
    pub async fn download_file(&self, key: &str, path: impl AsRef<Path>) -> StorageResult<u64> {
        let path = path.as_ref();
        debug!("Downloading {} to {}", key, path.display());

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NoSuchKey") {
                    StorageError::not_found(key)
                } else {
                    StorageError::download(key, e)
                }
            })?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut reader = response.body.into_async_read();
        let mut file = tokio::fs::File::create(path).await?;
        let bytes = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|e| StorageError::download(key, format!("writing {}: {}", path.display(), e)))?;

        info!("Downloaded {} ({} bytes) to {}", key, bytes, path.display());
        Ok(bytes)
    }

    /// Generate a presigned URL for GET.
    pub async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let presign_config = presigning_config(expires_in)?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::presign(key, e))?;

        Ok(presigned.uri().to_string())
    }

    /// Generate a presigned URL for a direct PUT with a fixed content type.
    pub async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let presign_config = presigning_config(expires_in)?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::presign(key, e))?;

        Ok(presigned.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_presign_with_static_credentials() {
        let client = S3Client::new(S3Config {
            bucket: "shorts-test".to_string(),
            region: "us-east-1".to_string(),
            endpoint_url: Some("http://localhost:9000".to_string()),
            access_key_id: Some("minio".to_string()),
            secret_access_key: Some("minio123".to_string()),
        })
        .await
        .unwrap();

        let url = client
            .presign_put("uploads/abc/video.mp4", "video/mp4", Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:9000/shorts-test/uploads/abc/video.mp4?"));
        assert!(url.contains("X-Amz-Expires=3600"));

        let url = client
            .presign_get("clips/j/clip_1.mp4", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.contains("clips/j/clip_1.mp4"));
    }

    #[tokio::test]
    async fn test_partial_credentials_rejected() {
        let result = S3Client::new(S3Config {
            bucket: "b".to_string(),
            region: "us-east-1".to_string(),
            endpoint_url: None,
            access_key_id: Some("only-id".to_string()),
            secret_access_key: None,
        })
        .await;
        assert!(matches!(result, Err(StorageError::Config(_))));
    }

    #[test]
    fn test_presign_lifetime_bounds() {
        assert!(presigning_config(Duration::from_secs(3600)).is_ok());
        assert!(presigning_config(Duration::from_secs(86_400)).is_ok());

        let err = presigning_config(Duration::from_secs(8 * 86_400)).unwrap_err();
        assert!(matches!(err, StorageError::InvalidTtl { .. }));
        assert!(err.to_string().starts_with("Presigned URL lifetime of 691200s"));
    }
}
