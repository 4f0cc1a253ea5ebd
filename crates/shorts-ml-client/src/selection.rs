//! Ranked clip selection from a transcript.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use shorts_models::{ClipCandidate, Transcript};
use tracing::{debug, info};

use crate::config::MlClientConfig;
use crate::error::{MlError, MlResult};
use crate::lenient_json::parse_lenient;
use crate::openrouter::{MessageContent, OpenRouterClient};

/// Picks the most shareable moments of a transcript.
#[async_trait]
pub trait ClipSelector: Send + Sync {
    /// Return ranked candidates in the order the service produced them.
    async fn select(&self, transcript: &Transcript) -> MlResult<Vec<ClipCandidate>>;
}

#[derive(Debug, Deserialize)]
struct SelectionResponse {
    #[serde(default)]
    clips: Vec<ClipCandidate>,
}

/// Build the selection prompt for a transcript.
pub fn build_selection_prompt(transcript: &Transcript) -> String {
    format!(
        r#"You are analyzing a podcast transcript to find the top 3 clips that would go viral on TikTok/YouTube Shorts.

TRANSCRIPT:
{segments}
For each clip, evaluate based on:
1. Hook strength - Does it grab attention in the first 3 seconds?
2. Standalone clarity - Can someone understand this without context?
3. Emotional resonance - Is it surprising, funny, controversial, or inspiring?
4. Quotability - Does it have memorable phrasing?

IMPORTANT: Return ONLY valid JSON with NO additional text. Use double quotes for all strings.

Return this exact structure:
{{"clips": [{{"rank": 1, "start_time": 0.0, "end_time": 60.0, "transcript_excerpt": "quote here", "explanation": "why selected"}}, {{"rank": 2, "start_time": 0.0, "end_time": 60.0, "transcript_excerpt": "quote here", "explanation": "why selected"}}, {{"rank": 3, "start_time": 0.0, "end_time": 60.0, "transcript_excerpt": "quote here", "explanation": "why selected"}}]}}

Each clip should be 30-60 seconds long. Pick moments that would make someone stop scrolling."#,
        segments = transcript.to_prompt_text()
    )
}

/// Extract candidates from the selection service's free-form reply.
pub fn parse_selection_response(text: &str) -> MlResult<Vec<ClipCandidate>> {
    let parsed = parse_lenient::<SelectionResponse>(text)?;
    debug!(strategy = ?parsed.strategy, "Parsed selection response");
    Ok(parsed.value.clips)
}

/// Selection through an OpenRouter chat model.
pub struct OpenRouterSelector {
    client: OpenRouterClient,
    model: String,
    timeout: Duration,
}

impl OpenRouterSelector {
    pub fn new(config: &MlClientConfig) -> MlResult<Self> {
        let api_key = config
            .openrouter_api_key
            .clone()
            .ok_or_else(|| MlError::config("OPENROUTER_API_KEY not set"))?;

        Ok(Self {
            client: OpenRouterClient::new(&config.openrouter_base_url, api_key)?,
            model: config.selection_model.clone(),
            timeout: config.selection_timeout,
        })
    }
}

#[async_trait]
impl ClipSelector for OpenRouterSelector {
    async fn select(&self, transcript: &Transcript) -> MlResult<Vec<ClipCandidate>> {
        if transcript.is_empty() {
            info!("Transcript is empty, no clips to select");
            return Ok(Vec::new());
        }

        let prompt = build_selection_prompt(transcript);
        let reply = self
            .client
            .complete(&self.model, MessageContent::Text(prompt), self.timeout)
            .await?;
        debug!("Selection response length: {} chars", reply.len());

        let clips = parse_selection_response(&reply)?;
        info!("Selection returned {} candidates", clips.len());
        Ok(clips)
    }
}
