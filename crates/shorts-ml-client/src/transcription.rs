//! Diarized speech transcription.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shorts_models::{Transcript, TranscriptSegment};
use tracing::{debug, info};

use crate::config::MlClientConfig;
use crate::error::{MlError, MlResult};

/// Turns audio into ordered, speaker-attributed segments.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe MP3 audio bytes.
    async fn transcribe(&self, audio: Vec<u8>) -> MlResult<Transcript>;
}

#[derive(Debug, Deserialize)]
struct ListenResponse {
    #[serde(default)]
    results: Option<ListenResults>,
    #[serde(default)]
    err_msg: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    #[serde(default)]
    utterances: Vec<Utterance>,
}

#[derive(Debug, Deserialize)]
struct Utterance {
    start: f64,
    end: f64,
    transcript: String,
    #[serde(default)]
    speaker: u32,
}

/// Deepgram `/listen` client with diarization and utterance segmentation.
pub struct DeepgramTranscriber {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl DeepgramTranscriber {
    pub fn new(config: &MlClientConfig) -> MlResult<Self> {
        let api_key = config
            .deepgram_api_key
            .clone()
            .ok_or_else(|| MlError::config("DEEPGRAM_API_KEY not set"))?;

        Ok(Self {
            http: Client::builder().build()?,
            base_url: config.deepgram_base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.transcription_model.clone(),
            timeout: config.transcribe_timeout,
        })
    }
}

#[async_trait]
impl Transcriber for DeepgramTranscriber {
    async fn transcribe(&self, audio: Vec<u8>) -> MlResult<Transcript> {
        let url = format!("{}/listen", self.base_url);
        debug!("Sending {} bytes of audio to {}", audio.len(), url);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/mpeg")
            .query(&[
                ("model", self.model.as_str()),
                ("diarize", "true"),
                ("punctuate", "true"),
                ("utterances", "true"),
            ])
            .timeout(self.timeout)
            .body(audio)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(MlError::request_failed(format!(
                "transcription returned {}: {}",
                status, body
            )));
        }

        let parsed: ListenResponse = serde_json::from_str(&body)?;
        if let Some(msg) = parsed.err_msg {
            return Err(MlError::request_failed(msg));
        }
        if let Some(error) = parsed.error {
            return Err(MlError::request_failed(error.to_string()));
        }

        let segments: Vec<TranscriptSegment> = parsed
            .results
            .map(|r| r.utterances)
            .unwrap_or_default()
            .into_iter()
            .map(|u| TranscriptSegment {
                start: u.start,
                end: u.end,
                text: u.transcript,
                speaker: u.speaker,
            })
            .collect();

        info!("Transcription returned {} utterances", segments.len());
        Ok(Transcript::new(segments))
    }
}
