//! Application state.

use std::sync::Arc;

use shorts_media::FfmpegEngine;
use shorts_ml_client::{
    DeepgramTranscriber, MlClientConfig, OpenRouterKeyframeEstimator, OpenRouterSelector,
};
use shorts_storage::{ObjectStore, S3Client};
use shorts_worker::{JobRegistry, Pipeline, PipelineContext, WorkerConfig};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Pipeline,
}

impl AppState {
    /// Build the production collaborators from the environment.
    pub async fn new(config: ApiConfig, worker_config: WorkerConfig) -> anyhow::Result<Self> {
        let store = S3Client::from_env().await?;
        let ml_config = MlClientConfig::from_env();

        let ctx = PipelineContext {
            media: Arc::new(FfmpegEngine::new(worker_config.ffmpeg_timeout.as_secs())),
            transcriber: Arc::new(DeepgramTranscriber::new(&ml_config)?),
            selector: Arc::new(OpenRouterSelector::new(&ml_config)?),
            estimator: Arc::new(OpenRouterKeyframeEstimator::new(&ml_config)?),
            store: Arc::new(store),
            registry: JobRegistry::new(),
            config: worker_config,
        };

        Ok(Self::with_pipeline(config, Pipeline::new(ctx)))
    }

    pub fn with_pipeline(config: ApiConfig, pipeline: Pipeline) -> Self {
        Self { config, pipeline }
    }

    pub fn registry(&self) -> &JobRegistry {
        self.pipeline.registry()
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.pipeline.context().store
    }

    pub fn worker_config(&self) -> &WorkerConfig {
        &self.pipeline.context().config
    }
}
