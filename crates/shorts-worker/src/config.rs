//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Parent directory for per-job scratch directories
    pub work_dir: PathBuf,
    /// Maximum pipeline runs executing at once; further jobs wait queued
    pub max_concurrent_jobs: usize,
    /// Upper bound on keyframes requested per clip
    pub max_keyframes: usize,
    /// Wall-clock limit for a single FFmpeg invocation
    pub ffmpeg_timeout: Duration,
    /// Lifetime of presigned upload URLs
    pub upload_url_ttl: Duration,
    /// Lifetime of presigned clip URLs
    pub clip_url_ttl: Duration,
    /// Lifetime of presigned source video URLs
    pub source_url_ttl: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("shorts"),
            max_concurrent_jobs: 4,
            max_keyframes: 4,
            ffmpeg_timeout: Duration::from_secs(1800),
            upload_url_ttl: Duration::from_secs(3600),
            clip_url_ttl: Duration::from_secs(86400),
            source_url_ttl: Duration::from_secs(3600),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            max_concurrent_jobs: env_parse("WORKER_MAX_JOBS")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_concurrent_jobs),
            max_keyframes: env_parse("WORKER_MAX_KEYFRAMES")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_keyframes),
            ffmpeg_timeout: env_parse("WORKER_FFMPEG_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.ffmpeg_timeout),
            upload_url_ttl: env_parse("UPLOAD_URL_TTL")
                .map(Duration::from_secs)
                .unwrap_or(defaults.upload_url_ttl),
            clip_url_ttl: env_parse("CLIP_URL_TTL")
                .map(Duration::from_secs)
                .unwrap_or(defaults.clip_url_ttl),
            source_url_ttl: env_parse("SOURCE_URL_TTL")
                .map(Duration::from_secs)
                .unwrap_or(defaults.source_url_ttl),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.max_concurrent_jobs, 4);
        assert_eq!(config.max_keyframes, 4);
        assert_eq!(config.clip_url_ttl, Duration::from_secs(86400));
        assert!(config.work_dir.ends_with("shorts"));
    }
}
