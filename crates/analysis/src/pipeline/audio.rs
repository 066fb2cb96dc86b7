use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{MediaPipeline, run_blocking};
use crate::envelope::Analysis;
use crate::error::AnalysisError;
use crate::features::spectrogram;
use crate::model::{CtcVocabulary, SpeechModel, recognize};
use crate::normalize::normalize_audio;
use crate::{MediaRequest, Modality};

/// Speech transcription: decode → 22050 Hz mono → spectrogram → CTC model → greedy decode.
#[derive(Clone)]
pub struct AudioPipeline {
    model: Arc<dyn SpeechModel>,
    vocabulary: Arc<CtcVocabulary>,
}

impl AudioPipeline {
    pub fn new(model: Arc<dyn SpeechModel>, vocabulary: CtcVocabulary) -> Self {
        Self {
            model,
            vocabulary: Arc::new(vocabulary),
        }
    }

    fn run(&self, request: &MediaRequest) -> Result<Analysis, AnalysisError> {
        let pcm = normalize_audio(
            &request.bytes,
            &request.filename,
            request.content_type.as_deref(),
        )?;
        debug!(
            samples = pcm.samples.len(),
            duration_secs = pcm.duration_secs(),
            "Audio normalized"
        );

        let features = spectrogram(&pcm.to_f32())?;
        let symbol_probs = recognize(self.model.as_ref(), features, self.vocabulary.num_classes())?;
        let transcription = self.vocabulary.greedy_decode(&symbol_probs)?;
        debug!(chars = transcription.chars().count(), "Audio transcribed");

        Ok(Analysis::Transcription {
            transcription,
            model_used: self.model.name().to_string(),
        })
    }
}

#[async_trait]
impl MediaPipeline for AudioPipeline {
    async fn analyze(&self, request: Arc<MediaRequest>) -> Result<Analysis, AnalysisError> {
        let pipeline = self.clone();
        run_blocking(move || pipeline.run(&request)).await
    }

    fn name(&self) -> &str {
        "ctc_greedy"
    }

    fn modality(&self) -> Modality {
        Modality::Audio
    }
}
