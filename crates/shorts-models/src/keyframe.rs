//! Crop keyframes.
//!
//! A keyframe is a sampled observation of where the active speaker sits
//! horizontally at a given moment of a clip. Values coming from a model or a
//! user are clamped on construction so no consumer ever sees an out-of-range
//! keyframe.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lowest allowed normalized horizontal position.
pub const CROP_X_MIN: f64 = 0.1;

/// Highest allowed normalized horizontal position.
pub const CROP_X_MAX: f64 = 0.9;

/// Frame center, used when no position is known.
pub const CROP_X_CENTER: f64 = 0.5;

/// A (time, horizontal position) observation within one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Keyframe {
    /// Seconds from the clip's start, within `[0, clip_duration]`
    #[serde(rename = "time")]
    pub time_offset: f64,

    /// Normalized horizontal speaker position, within `[0.1, 0.9]`
    #[serde(rename = "cropX")]
    pub crop_x: f64,

    /// Free-form description (e.g. who is speaking)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl Keyframe {
    /// Build a keyframe, clamping time into `[0, clip_duration]` and
    /// position into `[CROP_X_MIN, CROP_X_MAX]`.
    ///
    /// Non-finite inputs fall back to the clip start and frame center.
    pub fn clamped(time_offset: f64, crop_x: f64, notes: impl Into<String>, clip_duration: f64) -> Self {
        let max_time = if clip_duration.is_finite() { clip_duration.max(0.0) } else { 0.0 };
        let time_offset = if time_offset.is_finite() {
            // `+ 0.0` normalizes a negative zero so serialized thresholds stay stable
            time_offset.clamp(0.0, max_time) + 0.0
        } else {
            0.0
        };
        let crop_x = if crop_x.is_finite() {
            crop_x.clamp(CROP_X_MIN, CROP_X_MAX)
        } else {
            CROP_X_CENTER
        };

        Self {
            time_offset,
            crop_x,
            notes: notes.into(),
        }
    }

    /// The fallback keyframe: clip start, frame center.
    pub fn centered() -> Self {
        Self {
            time_offset: 0.0,
            crop_x: CROP_X_CENTER,
            notes: String::new(),
        }
    }

    /// Re-clamp this keyframe against a clip duration.
    pub fn clamp_to(self, clip_duration: f64) -> Self {
        Self::clamped(self.time_offset, self.crop_x, self.notes, clip_duration)
    }

    /// Clamp a list of keyframes and order it by time.
    ///
    /// The sort is stable, so keyframes sharing a timestamp keep their input
    /// order. An empty list becomes the single centered fallback.
    pub fn normalize_all(keyframes: Vec<Keyframe>, clip_duration: f64) -> Vec<Keyframe> {
        let mut keyframes: Vec<Keyframe> = keyframes
            .into_iter()
            .map(|k| k.clamp_to(clip_duration))
            .collect();

        if keyframes.is_empty() {
            return vec![Self::centered()];
        }

        keyframes.sort_by(|a, b| a.time_offset.total_cmp(&b.time_offset));
        keyframes
    }
}

impl Default for Keyframe {
    fn default() -> Self {
        Self::centered()
    }
}
