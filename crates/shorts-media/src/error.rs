//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("Invalid clip range: {0}")]
    InvalidRange(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Short description including the FFmpeg exit code and the last stderr
    /// line, suitable for a job error message.
    pub fn summary(&self) -> String {
        match self {
            Self::FfmpegFailed {
                message,
                stderr,
                exit_code,
            } => {
                let mut out = message.clone();
                if let Some(code) = exit_code {
                    out.push_str(&format!(" (exit code {code})"));
                }
                if let Some(last) = stderr
                    .as_deref()
                    .and_then(|s| s.lines().rev().find(|l| !l.trim().is_empty()))
                {
                    out.push_str(": ");
                    out.push_str(last.trim());
                }
                out
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_uses_last_stderr_line() {
        let err = MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            Some("frame=1\nInvalid argument\n\n".to_string()),
            Some(234),
        );
        assert_eq!(
            err.summary(),
            "FFmpeg exited with non-zero status (exit code 234): Invalid argument"
        );
    }

    #[test]
    fn test_summary_other_errors() {
        assert_eq!(MediaError::Timeout(5).summary(), "Operation timed out after 5 seconds");
    }
}
