//! Active-speaker keyframe estimation from sampled frames.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use shorts_models::{Keyframe, SampledFrame, CROP_X_CENTER};
use tracing::{debug, info};

use crate::config::MlClientConfig;
use crate::error::{MlError, MlResult};
use crate::lenient_json::parse_lenient;
use crate::openrouter::{ContentPart, MessageContent, OpenRouterClient};

/// Locates the active speaker horizontally over the course of a clip.
#[async_trait]
pub trait KeyframeEstimator: Send + Sync {
    /// Return at most `max_keyframes` clamped keyframes sorted by time.
    /// An empty result means the service found nothing usable.
    async fn estimate(
        &self,
        frames: &[SampledFrame],
        clip_duration: f64,
        max_keyframes: usize,
    ) -> MlResult<Vec<Keyframe>>;
}

#[derive(Debug, Deserialize)]
struct KeyframeResponse {
    #[serde(default)]
    keyframes: Vec<RawKeyframe>,
}

#[derive(Debug, Deserialize)]
struct RawKeyframe {
    #[serde(default)]
    time: Option<f64>,
    #[serde(default, rename = "cropX")]
    crop_x: Option<f64>,
    #[serde(default)]
    notes: Option<String>,
}

/// Build the estimation prompt for frames of a clip.
pub fn build_keyframe_prompt(frame_times: &[f64], clip_duration: f64, max_keyframes: usize) -> String {
    let timestamps = frame_times
        .iter()
        .map(|t| format!("{:.1}s", t))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"I'm showing you {count} frames from a video clip, sampled at regular intervals.
The clip is {clip_duration:.1} seconds long.

Frame timestamps (seconds from start): {timestamps}

For each frame, identify where the ACTIVE SPEAKER is positioned horizontally.
Look for: mouth movement, hand gestures, body language, eye gaze of listeners.

Return ONLY this JSON with speaker positions at key moments:
{{
    "keyframes": [
        {{"time": 0.0, "cropX": <0.0-1.0>, "notes": "<who is speaking>"}},
        {{"time": <seconds>, "cropX": <0.0-1.0>, "notes": "<who is speaking>"}},
        ...
    ]
}}

Guidelines for cropX:
- 0.0 = speaker at left edge
- 0.5 = speaker at center
- 1.0 = speaker at right edge

Include a keyframe whenever the active speaker CHANGES or MOVES significantly.
Minimum 2 keyframes, maximum {max_keyframes} keyframes.
Only add keyframes where there's a meaningful change in speaker position."#,
        count = frame_times.len(),
    )
}

/// Prompt text followed by each labelled frame.
pub fn build_keyframe_content(
    frames: &[SampledFrame],
    clip_duration: f64,
    max_keyframes: usize,
) -> MessageContent {
    let times: Vec<f64> = frames.iter().map(|f| f.time).collect();
    let mut parts = Vec::with_capacity(1 + frames.len() * 2);
    parts.push(ContentPart::text(build_keyframe_prompt(
        &times,
        clip_duration,
        max_keyframes,
    )));

    for (i, frame) in frames.iter().enumerate() {
        parts.push(ContentPart::text(format!("Frame {} ({:.1}s):", i + 1, frame.time)));
        parts.push(ContentPart::image(frame.data_url()));
    }

    MessageContent::Parts(parts)
}

/// Extract keyframes from the estimation service's reply, clamped to the
/// clip, stably sorted by time and cut to `max_keyframes`.
pub fn parse_keyframe_response(
    text: &str,
    clip_duration: f64,
    max_keyframes: usize,
) -> MlResult<Vec<Keyframe>> {
    let parsed = parse_lenient::<KeyframeResponse>(text)?;
    debug!(strategy = ?parsed.strategy, "Parsed keyframe response");

    let keyframes = parsed
        .value
        .keyframes
        .into_iter()
        .map(|raw| {
            Keyframe::clamped(
                raw.time.unwrap_or(0.0),
                raw.crop_x.unwrap_or(CROP_X_CENTER),
                raw.notes.unwrap_or_default(),
                clip_duration,
            )
        })
        .collect::<Vec<_>>();

    if keyframes.is_empty() {
        return Ok(keyframes);
    }

    let mut keyframes = Keyframe::normalize_all(keyframes, clip_duration);
    keyframes.truncate(max_keyframes.max(1));
    Ok(keyframes)
}

/// Estimation through a multimodal OpenRouter chat model.
pub struct OpenRouterKeyframeEstimator {
    client: OpenRouterClient,
    model: String,
    timeout: Duration,
}

impl OpenRouterKeyframeEstimator {
    pub fn new(config: &MlClientConfig) -> MlResult<Self> {
        let api_key = config
            .openrouter_api_key
            .clone()
            .ok_or_else(|| MlError::config("OPENROUTER_API_KEY not set"))?;

        Ok(Self {
            client: OpenRouterClient::new(&config.openrouter_base_url, api_key)?,
            model: config.keyframe_model.clone(),
            timeout: config.keyframe_timeout,
        })
    }
}

#[async_trait]
impl KeyframeEstimator for OpenRouterKeyframeEstimator {
    async fn estimate(
        &self,
        frames: &[SampledFrame],
        clip_duration: f64,
        max_keyframes: usize,
    ) -> MlResult<Vec<Keyframe>> {
        if frames.is_empty() {
            return Ok(Vec::new());
        }

        let content = build_keyframe_content(frames, clip_duration, max_keyframes);
        let reply = self.client.complete(&self.model, content, self.timeout).await?;
        let keyframes = parse_keyframe_response(&reply, clip_duration, max_keyframes)?;

        info!("Keyframe estimation returned {} keyframes", keyframes.len());
        Ok(keyframes)
    }
}
