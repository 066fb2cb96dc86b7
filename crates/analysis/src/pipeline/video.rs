use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{ImagePipeline, MediaPipeline, run_blocking};
use crate::config::FramePolicy;
use crate::envelope::Analysis;
use crate::error::AnalysisError;
use crate::normalize::FrameExtractor;
use crate::{MediaRequest, Modality};

/// Video classification on top of the image classifier.
///
/// `SingleFrame` classifies the first decodable frame. `MultiFrame` classifies
/// every extracted frame and averages the probability vectors.
#[derive(Clone)]
pub struct VideoPipeline {
    image: ImagePipeline,
    extractor: FrameExtractor,
    policy: FramePolicy,
}

impl VideoPipeline {
    pub fn new(image: ImagePipeline, extractor: FrameExtractor, policy: FramePolicy) -> Self {
        Self {
            image,
            extractor,
            policy,
        }
    }

    fn run(&self, request: &MediaRequest) -> Result<Analysis, AnalysisError> {
        let extension = request.extension();
        let frames = self
            .extractor
            .extract(&request.bytes, extension.as_deref(), self.policy)?;
        if frames.is_empty() {
            return Err(AnalysisError::EmptyVideo);
        }

        match self.policy {
            FramePolicy::SingleFrame => {
                let first = frames.into_iter().next().ok_or(AnalysisError::EmptyVideo)?;
                let probabilities = self.image.frame_probabilities(first)?;
                let ranking = self.image.rank(&probabilities)?;
                Ok(self.image.classification(ranking, None))
            }
            FramePolicy::MultiFrame => {
                let per_frame = frames
                    .into_iter()
                    .map(|frame| self.image.frame_probabilities(frame))
                    .collect::<Result<Vec<_>, _>>()?;
                let frames_analyzed = per_frame.len();
                let averaged = average_probabilities(&per_frame)?;
                let ranking = self.image.rank(&averaged)?;
                debug!(
                    frames_analyzed,
                    top = %ranking.top().label,
                    "Video classified"
                );
                Ok(self.image.classification(ranking, Some(frames_analyzed)))
            }
        }
    }
}

/// Elementwise mean of per-frame probability vectors.
pub fn average_probabilities(per_frame: &[Vec<f32>]) -> Result<Vec<f32>, AnalysisError> {
    let first = per_frame.first().ok_or(AnalysisError::EmptyVideo)?;
    let width = first.len();

    let mut sum = vec![0.0f32; width];
    for (idx, probs) in per_frame.iter().enumerate() {
        if probs.len() != width {
            return Err(AnalysisError::Shape(format!(
                "frame {idx} has {} scores, frame 0 has {width}",
                probs.len()
            )));
        }
        for (acc, &p) in sum.iter_mut().zip(probs) {
            *acc += p;
        }
    }

    let count = per_frame.len() as f32;
    Ok(sum.into_iter().map(|s| s / count).collect())
}

#[async_trait]
impl MediaPipeline for VideoPipeline {
    async fn analyze(&self, request: Arc<MediaRequest>) -> Result<Analysis, AnalysisError> {
        let pipeline = self.clone();
        run_blocking(move || pipeline.run(&request)).await
    }

    fn name(&self) -> &str {
        match self.policy {
            FramePolicy::SingleFrame => "single_frame",
            FramePolicy::MultiFrame => "multi_frame",
        }
    }

    fn modality(&self) -> Modality {
        Modality::Video
    }
}
