//! Sampled video frames.

use serde::{Deserialize, Serialize};

/// A downscaled JPEG frame of a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledFrame {
    /// Seconds from the clip start
    pub time: f64,
    /// Base64-encoded JPEG bytes
    pub jpeg_base64: String,
}

impl SampledFrame {
    /// Data URL form accepted by multimodal chat APIs.
    pub fn data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.jpeg_base64)
    }
}
