//! Clip candidate models.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::keyframe::Keyframe;

/// Storage location of an extracted clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClipArtifact {
    /// Object key, e.g. `clips/{job_id}/clip_{rank}.mp4`
    pub s3_key: String,
    /// Presigned read URL for the object
    pub video_url: String,
}

/// One ranked clip proposed by the selection service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipCandidate {
    /// Caller-facing identity, unique within a clip set
    pub rank: u32,

    /// Start time in seconds from the source start
    pub start_time: f64,

    /// End time in seconds from the source start
    pub end_time: f64,

    #[serde(default)]
    pub transcript_excerpt: String,

    #[serde(default)]
    pub explanation: String,

    /// Crop keyframes, sorted by time, never empty
    #[serde(default = "default_keyframes")]
    pub keyframes: Vec<Keyframe>,

    /// Extracted clip, once uploaded
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ClipArtifact>,
}

fn default_keyframes() -> Vec<Keyframe> {
    vec![Keyframe::centered()]
}

impl ClipCandidate {
    /// Create a candidate with the centered fallback keyframe.
    pub fn new(
        rank: u32,
        start_time: f64,
        end_time: f64,
        transcript_excerpt: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            rank,
            start_time,
            end_time,
            transcript_excerpt: transcript_excerpt.into(),
            explanation: explanation.into(),
            keyframes: default_keyframes(),
            artifact: None,
        }
    }

    /// Clip length in seconds.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Why this candidate cannot be extracted, if anything.
    pub fn rejection_reason(&self) -> Option<&'static str> {
        if self.rank == 0 {
            return Some("rank must be positive");
        }
        if !self.start_time.is_finite() || !self.end_time.is_finite() {
            return Some("non-finite time range");
        }
        if self.start_time < 0.0 {
            return Some("negative start time");
        }
        if self.end_time <= self.start_time {
            return Some("end time not after start time");
        }
        None
    }
}

/// A candidate dropped while building a [`ClipSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedCandidate {
    pub rank: u32,
    pub reason: &'static str,
}

/// Ordered result of one job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipSet {
    pub clips: Vec<ClipCandidate>,
}

impl ClipSet {
    /// Build a clip set, keeping input order and dropping candidates that
    /// are malformed or repeat an earlier rank.
    pub fn from_candidates(candidates: Vec<ClipCandidate>) -> (Self, Vec<RejectedCandidate>) {
        let mut seen = HashSet::new();
        let mut clips = Vec::with_capacity(candidates.len());
        let mut rejected = Vec::new();

        for candidate in candidates {
            if let Some(reason) = candidate.rejection_reason() {
                rejected.push(RejectedCandidate {
                    rank: candidate.rank,
                    reason,
                });
                continue;
            }
            if !seen.insert(candidate.rank) {
                rejected.push(RejectedCandidate {
                    rank: candidate.rank,
                    reason: "duplicate rank",
                });
                continue;
            }
            clips.push(candidate);
        }

        (Self { clips }, rejected)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Find a clip by rank.
    pub fn find(&self, rank: u32) -> Option<&ClipCandidate> {
        self.clips.iter().find(|c| c.rank == rank)
    }

    /// Find a clip by rank for in-place update.
    pub fn find_mut(&mut self, rank: u32) -> Option<&mut ClipCandidate> {
        self.clips.iter_mut().find(|c| c.rank == rank)
    }
}
