//! Collaborator endpoints, credentials and per-call timeouts.

use std::time::Duration;

pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_DEEPGRAM_BASE_URL: &str = "https://api.deepgram.com/v1";
pub const DEFAULT_SELECTION_MODEL: &str = "anthropic/claude-3.7-sonnet";
pub const DEFAULT_KEYFRAME_MODEL: &str = "anthropic/claude-sonnet-4";
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "nova-2";

/// Configuration for the ML collaborators.
#[derive(Debug, Clone)]
pub struct MlClientConfig {
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub selection_model: String,
    pub keyframe_model: String,
    pub deepgram_api_key: Option<String>,
    pub deepgram_base_url: String,
    pub transcription_model: String,
    pub transcribe_timeout: Duration,
    pub selection_timeout: Duration,
    pub keyframe_timeout: Duration,
}

impl Default for MlClientConfig {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            openrouter_base_url: DEFAULT_OPENROUTER_BASE_URL.to_string(),
            selection_model: DEFAULT_SELECTION_MODEL.to_string(),
            keyframe_model: DEFAULT_KEYFRAME_MODEL.to_string(),
            deepgram_api_key: None,
            deepgram_base_url: DEFAULT_DEEPGRAM_BASE_URL.to_string(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            transcribe_timeout: Duration::from_secs(300),
            selection_timeout: Duration::from_secs(120),
            keyframe_timeout: Duration::from_secs(60),
        }
    }
}

impl MlClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            openrouter_api_key: std::env::var("OPENROUTER_API_KEY").ok().filter(|k| !k.is_empty()),
            openrouter_base_url: std::env::var("OPENROUTER_BASE_URL")
                .unwrap_or(defaults.openrouter_base_url),
            selection_model: std::env::var("SELECTION_MODEL").unwrap_or(defaults.selection_model),
            keyframe_model: std::env::var("KEYFRAME_MODEL").unwrap_or(defaults.keyframe_model),
            deepgram_api_key: std::env::var("DEEPGRAM_API_KEY").ok().filter(|k| !k.is_empty()),
            deepgram_base_url: std::env::var("DEEPGRAM_BASE_URL")
                .unwrap_or(defaults.deepgram_base_url),
            transcription_model: std::env::var("TRANSCRIPTION_MODEL")
                .unwrap_or(defaults.transcription_model),
            transcribe_timeout: env_secs("TRANSCRIBE_TIMEOUT").unwrap_or(defaults.transcribe_timeout),
            selection_timeout: env_secs("SELECTION_TIMEOUT").unwrap_or(defaults.selection_timeout),
            keyframe_timeout: env_secs("KEYFRAME_TIMEOUT").unwrap_or(defaults.keyframe_timeout),
        }
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
}
