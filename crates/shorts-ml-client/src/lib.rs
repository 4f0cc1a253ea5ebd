//! Clients for the external ML collaborators of the clip pipeline.
//!
//! - [`Transcriber`]: diarized speech-to-text (Deepgram)
//! - [`ClipSelector`]: ranked clip candidates from a transcript (OpenRouter)
//! - [`KeyframeEstimator`]: active-speaker positions from sampled frames (OpenRouter)
//!
//! Model replies are free-form text; [`lenient_json`] recovers the embedded
//! JSON object.

pub mod config;
pub mod error;
pub mod keyframes;
pub mod lenient_json;
pub mod openrouter;
pub mod selection;
pub mod transcription;

pub use config::MlClientConfig;
pub use error::{MlError, MlResult};
pub use keyframes::{KeyframeEstimator, OpenRouterKeyframeEstimator};
pub use lenient_json::{parse_lenient, LenientParseError, ParseStrategy, Parsed};
pub use openrouter::OpenRouterClient;
pub use selection::{ClipSelector, OpenRouterSelector};
pub use transcription::{DeepgramTranscriber, Transcriber};
