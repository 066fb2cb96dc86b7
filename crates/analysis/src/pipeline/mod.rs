pub mod audio;
pub mod image;
pub mod video;

pub use audio::AudioPipeline;
pub use image::ImagePipeline;
pub use video::VideoPipeline;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::envelope::Analysis;
use crate::error::AnalysisError;
use crate::model::{CtcVocabulary, ImageModel, SpeechModel};
use crate::normalize::FrameExtractor;
use crate::{MediaRequest, Modality};

/// Trait for a named strategy that turns one upload into an analysis.
///
/// Several variants may exist per modality; configuration picks one.
#[async_trait]
pub trait MediaPipeline: Send + Sync + 'static {
    /// Runs the full normalize → features → inference → rank chain.
    async fn analyze(&self, request: Arc<MediaRequest>) -> Result<Analysis, AnalysisError>;

    /// Human-readable variant name.
    fn name(&self) -> &str;

    fn modality(&self) -> Modality;
}

/// Named pipelines keyed by the modality they serve.
pub type PipelineSet = HashMap<Modality, Arc<dyn MediaPipeline>>;

/// Runs CPU-bound pipeline work on the blocking pool.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, AnalysisError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AnalysisError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AnalysisError::Inference(format!("pipeline task join error: {e}")))?
}

/// Wires pipelines around already-loaded models.
///
/// The image model serves both the image and the video pipeline. A `None` model
/// leaves its modalities without a pipeline.
pub fn pipelines_with_models(
    config: &AnalysisConfig,
    image_model: Option<Arc<dyn ImageModel>>,
    speech_model: Option<Arc<dyn SpeechModel>>,
) -> PipelineSet {
    let mut pipelines: PipelineSet = HashMap::new();

    if let Some(model) = image_model {
        let image = ImagePipeline::new(model, config.image_labels.clone(), config.pixel_convention);
        let extractor = FrameExtractor::new(config.ffmpeg_path.clone(), config.video_max_frames);
        let video = VideoPipeline::new(image.clone(), extractor, config.video_policy);
        pipelines.insert(Modality::Image, Arc::new(image));
        pipelines.insert(Modality::Video, Arc::new(video));
    }

    if let Some(model) = speech_model {
        let vocabulary = CtcVocabulary::from_charset(&config.audio_vocabulary);
        pipelines.insert(Modality::Audio, Arc::new(AudioPipeline::new(model, vocabulary)));
    }

    let configured: Vec<String> = pipelines
        .values()
        .map(|p| format!("{}={}", p.modality(), p.name()))
        .collect();
    info!(?configured, "Analysis pipelines wired");

    pipelines
}

/// Loads the configured ONNX models and wires pipelines around them.
#[cfg(feature = "onnx")]
pub fn build_pipelines(config: &AnalysisConfig) -> anyhow::Result<PipelineSet> {
    use crate::model::onnx::{OnnxImageModel, OnnxSpeechModel};

    let image_model = config
        .image_model_path
        .as_deref()
        .map(|path| OnnxImageModel::load(path).map(|m| Arc::new(m) as Arc<dyn ImageModel>))
        .transpose()?;
    let speech_model = config
        .audio_model_path
        .as_deref()
        .map(|path| OnnxSpeechModel::load(path).map(|m| Arc::new(m) as Arc<dyn SpeechModel>))
        .transpose()?;

    Ok(pipelines_with_models(config, image_model, speech_model))
}
