//! Diarized transcript models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One diarized utterance of the source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Spoken text
    pub text: String,
    /// Speaker index assigned by diarization
    #[serde(default)]
    pub speaker: u32,
}

/// Ordered transcript of a source video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Transcript {
    pub segments: Vec<TranscriptSegment>,
}

/// Flattened transcript entry exposed on a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptLine {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Transcript {
    /// Create a transcript from segments.
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        Self { segments }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Render the transcript one segment per line as `[12.0s - 15.5s]: text`.
    pub fn to_prompt_text(&self) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            out.push_str(&format!(
                "[{:.1}s - {:.1}s]: {}\n",
                seg.start,
                seg.end,
                seg.text.trim()
            ));
        }
        out
    }

    /// Speaker-less view with trimmed text.
    pub fn lines(&self) -> Vec<TranscriptLine> {
        self.segments
            .iter()
            .map(|seg| TranscriptLine {
                start: seg.start,
                end: seg.end,
                text: seg.text.trim().to_string(),
            })
            .collect()
    }
}
