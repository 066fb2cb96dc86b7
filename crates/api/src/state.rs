use std::sync::Arc;

use anyhow::Context;
use mediascan_analysis::pipeline::build_pipelines;
use mediascan_analysis::{AnalysisConfig, AnalysisEngine};
use mediascan_config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub engine: Arc<AnalysisEngine>,
}

impl AppState {
    /// Loads every configured model and builds the engine around them.
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let config = analysis_config(&settings)?;
        let pipelines = build_pipelines(&config).context("Failed to load analysis models")?;
        let engine = AnalysisEngine::new(pipelines, config.request_timeout());
        Ok(Self::with_engine(settings, engine))
    }

    /// Uses an engine built elsewhere, e.g. around in-memory models.
    pub fn with_engine(settings: Settings, engine: Arc<AnalysisEngine>) -> Self {
        Self { settings, engine }
    }
}

/// Converts file/env settings into the analysis crate's config.
pub fn analysis_config(settings: &Settings) -> anyhow::Result<AnalysisConfig> {
    let analysis = &settings.analysis;
    Ok(AnalysisConfig {
        request_timeout_secs: analysis.request_timeout_secs,
        image_model_path: analysis.image.model_path.clone(),
        image_labels: analysis.image.labels.clone(),
        pixel_convention: analysis
            .image
            .pixel_convention
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?,
        video_policy: analysis
            .video
            .policy
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?,
        video_max_frames: analysis.video.max_frames,
        ffmpeg_path: analysis.video.ffmpeg_path.clone(),
        audio_model_path: analysis.audio.model_path.clone(),
        audio_vocabulary: analysis.audio.vocabulary.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediascan_analysis::{FramePolicy, PixelConvention};

    #[test]
    fn settings_convert_to_analysis_config() {
        let mut settings = Settings::load().unwrap();
        settings.analysis.video.policy = "multi_frame".to_string();
        settings.analysis.request_timeout_secs = Some(30);

        let config = analysis_config(&settings).unwrap();
        assert_eq!(config.pixel_convention, PixelConvention::Rescale);
        assert_eq!(config.video_policy, FramePolicy::MultiFrame);
        assert_eq!(config.request_timeout().map(|d| d.as_secs()), Some(30));
        assert_eq!(config.image_labels.len(), 8);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let mut settings = Settings::load().unwrap();
        settings.analysis.video.policy = "every_other_frame".to_string();
        assert!(analysis_config(&settings).is_err());
    }
}
