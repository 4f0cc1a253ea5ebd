//! In-memory collaborators for tests.
//!
//! Available to this crate's unit tests and, through the `testing` feature,
//! to downstream crates that drive the pipeline without network or FFmpeg.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use shorts_media::{MediaEngine, MediaError, MediaResult, RenderRequest, VideoInfo};
use shorts_ml_client::{ClipSelector, KeyframeEstimator, MlError, MlResult, Transcriber};
use shorts_models::{ClipCandidate, JobId, JobRecord, Keyframe, SampledFrame, Transcript};
use shorts_storage::{ObjectStore, StorageError, StorageResult};

use crate::config::WorkerConfig;
use crate::pipeline::PipelineContext;
use crate::registry::JobRegistry;

/// Object store backed by a map; URLs are `memory://{key}`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_uploads: AtomicBool,
}

impl MemoryStore {
    pub fn insert(&self, key: &str, bytes: &[u8]) {
        self.objects.lock().unwrap().insert(key.to_string(), bytes.to_vec());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn fail_uploads(&self) {
        self.fail_uploads.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn presign_upload(&self, key: &str, content_type: &str, _ttl: Duration) -> StorageResult<String> {
        Ok(format!("memory://{}?upload&content_type={}", key, content_type))
    }

    async fn presign_download(&self, key: &str, _ttl: Duration) -> StorageResult<String> {
        Ok(format!("memory://{}", key))
    }

    async fn download(&self, key: &str, path: &Path) -> StorageResult<()> {
        let bytes = self.get(key).ok_or_else(|| StorageError::not_found(key))?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    async fn upload(&self, path: &Path, key: &str, _content_type: &str) -> StorageResult<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::upload(key, "memory store rejects uploads"));
        }
        let bytes = tokio::fs::read(path).await?;
        self.insert(key, &bytes);
        Ok(())
    }
}

/// Media engine that writes placeholder files and records renders.
#[derive(Debug)]
pub struct FakeMedia {
    video: Mutex<VideoInfo>,
    frames: Mutex<Vec<SampledFrame>>,
    renders: Mutex<Vec<RenderRequest>>,
    fail_audio: AtomicBool,
    fail_renders: AtomicBool,
}

impl Default for FakeMedia {
    fn default() -> Self {
        Self {
            video: Mutex::new(VideoInfo {
                duration: 120.0,
                width: 1920,
                height: 1080,
                fps: 30.0,
            }),
            frames: Mutex::new(Vec::new()),
            renders: Mutex::new(Vec::new()),
            fail_audio: AtomicBool::new(false),
            fail_renders: AtomicBool::new(false),
        }
    }
}

impl FakeMedia {
    pub fn set_video(&self, video: VideoInfo) {
        *self.video.lock().unwrap() = video;
    }

    pub fn set_frames(&self, frames: Vec<SampledFrame>) {
        *self.frames.lock().unwrap() = frames;
    }

    pub fn fail_audio(&self) {
        self.fail_audio.store(true, Ordering::SeqCst);
    }

    pub fn fail_renders(&self) {
        self.fail_renders.store(true, Ordering::SeqCst);
    }

    /// Every render request received, in order.
    pub fn renders(&self) -> Vec<RenderRequest> {
        self.renders.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaEngine for FakeMedia {
    async fn probe(&self, _path: &Path) -> MediaResult<VideoInfo> {
        Ok(self.video.lock().unwrap().clone())
    }

    async fn extract_audio(&self, _input: &Path, output: &Path) -> MediaResult<()> {
        if self.fail_audio.load(Ordering::SeqCst) {
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some("Output file does not contain any stream".to_string()),
                Some(1),
            ));
        }
        tokio::fs::write(output, b"audio").await?;
        Ok(())
    }

    async fn sample_frames(
        &self,
        _input: &Path,
        _start: f64,
        _duration: f64,
        count: usize,
        _work_dir: &Path,
    ) -> MediaResult<Vec<SampledFrame>> {
        let mut frames = self.frames.lock().unwrap().clone();
        frames.truncate(count);
        Ok(frames)
    }

    async fn render(&self, request: &RenderRequest) -> MediaResult<()> {
        self.renders.lock().unwrap().push(request.clone());
        if self.fail_renders.load(Ordering::SeqCst) {
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some("Invalid argument".to_string()),
                Some(234),
            ));
        }
        tokio::fs::write(&request.output, b"clip").await?;
        Ok(())
    }
}

/// Transcriber returning a canned transcript or error.
#[derive(Debug, Default)]
pub struct FakeTranscriber {
    transcript: Mutex<Transcript>,
    error: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl FakeTranscriber {
    pub fn set_transcript(&self, transcript: Transcript) {
        *self.transcript.lock().unwrap() = transcript;
    }

    pub fn fail_with(&self, message: &str) {
        *self.error.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio: Vec<u8>) -> MlResult<Transcript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.error.lock().unwrap().clone() {
            return Err(MlError::request_failed(message));
        }
        Ok(self.transcript.lock().unwrap().clone())
    }
}

/// Selector returning canned candidates, an error, or panicking.
#[derive(Debug, Default)]
pub struct FakeSelector {
    candidates: Mutex<Vec<ClipCandidate>>,
    error: Mutex<Option<String>>,
    panic: AtomicBool,
    last_transcript_len: Mutex<Option<usize>>,
}

impl FakeSelector {
    pub fn set_candidates(&self, candidates: Vec<ClipCandidate>) {
        *self.candidates.lock().unwrap() = candidates;
    }

    pub fn fail_with(&self, message: &str) {
        *self.error.lock().unwrap() = Some(message.to_string());
    }

    pub fn panic_on_select(&self) {
        self.panic.store(true, Ordering::SeqCst);
    }

    /// Segment count of the transcript most recently passed to `select`.
    pub fn last_transcript_len(&self) -> Option<usize> {
        *self.last_transcript_len.lock().unwrap()
    }
}

#[async_trait]
impl ClipSelector for FakeSelector {
    async fn select(&self, transcript: &Transcript) -> MlResult<Vec<ClipCandidate>> {
        *self.last_transcript_len.lock().unwrap() = Some(transcript.len());
        if self.panic.load(Ordering::SeqCst) {
            panic!("selector exploded");
        }
        if let Some(message) = self.error.lock().unwrap().clone() {
            return Err(MlError::invalid_response(message));
        }
        Ok(self.candidates.lock().unwrap().clone())
    }
}

/// Estimator returning canned keyframes or an error.
#[derive(Debug, Default)]
pub struct FakeEstimator {
    keyframes: Mutex<Vec<Keyframe>>,
    error: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl FakeEstimator {
    pub fn set_keyframes(&self, keyframes: Vec<Keyframe>) {
        *self.keyframes.lock().unwrap() = keyframes;
    }

    pub fn fail_with(&self, message: &str) {
        *self.error.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyframeEstimator for FakeEstimator {
    async fn estimate(
        &self,
        _frames: &[SampledFrame],
        _clip_duration: f64,
        _max_keyframes: usize,
    ) -> MlResult<Vec<Keyframe>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.error.lock().unwrap().clone() {
            return Err(MlError::request_failed(message));
        }
        Ok(self.keyframes.lock().unwrap().clone())
    }
}

/// A full set of fakes sharing one registry and scratch root.
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub media: Arc<FakeMedia>,
    pub transcriber: Arc<FakeTranscriber>,
    pub selector: Arc<FakeSelector>,
    pub estimator: Arc<FakeEstimator>,
    pub registry: JobRegistry,
    work_root: tempfile::TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            store: Arc::default(),
            media: Arc::default(),
            transcriber: Arc::default(),
            selector: Arc::default(),
            estimator: Arc::default(),
            registry: JobRegistry::new(),
            work_root: tempfile::tempdir().expect("create scratch root"),
        }
    }

    /// Scratch root used as the worker's work directory.
    pub fn work_root(&self) -> &Path {
        self.work_root.path()
    }

    pub fn config(&self) -> WorkerConfig {
        WorkerConfig {
            work_dir: self.work_root.path().to_path_buf(),
            ..WorkerConfig::default()
        }
    }

    pub fn context(&self) -> PipelineContext {
        PipelineContext {
            config: self.config(),
            registry: self.registry.clone(),
            store: self.store.clone(),
            media: self.media.clone(),
            transcriber: self.transcriber.clone(),
            selector: self.selector.clone(),
            estimator: self.estimator.clone(),
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll until a job is terminal. Panics after five seconds.
pub async fn wait_for_terminal(registry: &JobRegistry, id: &JobId) -> JobRecord {
    for _ in 0..500 {
        if let Ok(record) = registry.get(id).await {
            if record.status.is_terminal() {
                return record;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not finish", id);
}
