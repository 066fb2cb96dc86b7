use std::sync::Arc;

use ::image::RgbImage;
use async_trait::async_trait;
use tracing::debug;

use super::{MediaPipeline, run_blocking};
use crate::config::PixelConvention;
use crate::envelope::Analysis;
use crate::error::AnalysisError;
use crate::features::pixel_tensor;
use crate::model::{ImageModel, classify};
use crate::normalize::{conform_frame, normalize_image};
use crate::ranker::{Ranking, rank};
use crate::{MediaRequest, Modality};

/// Single-image classification: decode → 224×224 → pixel convention → forward → rank.
#[derive(Clone)]
pub struct ImagePipeline {
    model: Arc<dyn ImageModel>,
    labels: Arc<[String]>,
    convention: PixelConvention,
}

impl ImagePipeline {
    pub fn new(
        model: Arc<dyn ImageModel>,
        labels: Vec<String>,
        convention: PixelConvention,
    ) -> Self {
        Self {
            model,
            labels: labels.into(),
            convention,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Class probabilities for one decoded RGB frame of any size.
    pub fn frame_probabilities(&self, frame: RgbImage) -> Result<Vec<f32>, AnalysisError> {
        let frame = conform_frame(frame);
        let input = pixel_tensor(&frame, self.convention);
        classify(self.model.as_ref(), input, self.labels.len())
    }

    pub fn rank(&self, probabilities: &[f32]) -> Result<Ranking, AnalysisError> {
        rank(probabilities, &self.labels)
    }

    /// Builds the wire body for a ranked result.
    pub fn classification(&self, ranking: Ranking, frames_analyzed: Option<usize>) -> Analysis {
        let top = ranking.top().clone();
        Analysis::Classification {
            predicted_class: top.label,
            confidence: top.confidence,
            all_predictions: ranking.predictions,
            model_used: self.model.name().to_string(),
            frames_analyzed,
        }
    }

    fn run(&self, request: &MediaRequest) -> Result<Analysis, AnalysisError> {
        let frame = normalize_image(&request.bytes)?;
        let probabilities = self.frame_probabilities(frame)?;
        let ranking = self.rank(&probabilities)?;
        debug!(
            top = %ranking.top().label,
            confidence = ranking.top().confidence,
            "Image classified"
        );
        Ok(self.classification(ranking, None))
    }
}

#[async_trait]
impl MediaPipeline for ImagePipeline {
    async fn analyze(&self, request: Arc<MediaRequest>) -> Result<Analysis, AnalysisError> {
        let pipeline = self.clone();
        run_blocking(move || pipeline.run(&request)).await
    }

    fn name(&self) -> &str {
        "classifier"
    }

    fn modality(&self) -> Modality {
        Modality::Image
    }
}
