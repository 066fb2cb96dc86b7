use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::envelope::ResponseEnvelope;
use crate::error::AnalysisError;
use crate::pipeline::PipelineSet;
use crate::{MediaRequest, Modality};

/// How a request ended, before it is mapped onto a transport.
#[derive(Debug)]
pub enum AnalysisOutcome {
    /// Analysis ran, or the type is unsupported/unavailable; `success` says which.
    Completed(ResponseEnvelope),
    /// The upload was well-formed but had nothing to analyze (a video with no frames).
    Rejected(ResponseEnvelope),
    /// Decoding, shape or inference failure. Carries no partial result.
    Failed(AnalysisError),
}

/// Routes each request to the pipeline registered for its modality.
///
/// The engine is created once at startup and shared via `Arc`. Requests never
/// share mutable state, so any number may run at once.
pub struct AnalysisEngine {
    pipelines: PipelineSet,
    timeout: Option<Duration>,
}

impl AnalysisEngine {
    pub fn new(pipelines: PipelineSet, timeout: Option<Duration>) -> Arc<Self> {
        let mut modalities: Vec<&str> = pipelines.keys().map(|m| m.as_str()).collect();
        modalities.sort_unstable();
        info!(?modalities, ?timeout, "Analysis engine created");

        Arc::new(Self { pipelines, timeout })
    }

    /// Whether a pipeline is registered for `modality`.
    pub fn supports(&self, modality: Modality) -> bool {
        self.pipelines.contains_key(&modality)
    }

    /// Dispatches one request.
    ///
    /// Unknown tags and modalities without a loaded model complete with
    /// `success: false` instead of failing. A timeout abandons the result; the
    /// blocking work already started runs to completion in the background.
    pub async fn analyze(&self, request: MediaRequest) -> AnalysisOutcome {
        let Some(modality) = Modality::from_tag(&request.file_type) else {
            info!(
                file_type = %request.file_type,
                filename = %request.filename,
                "Unsupported file type"
            );
            return AnalysisOutcome::Completed(ResponseEnvelope::unsupported(&request));
        };

        let Some(pipeline) = self.pipelines.get(&modality) else {
            warn!(%modality, "No model loaded for modality");
            return AnalysisOutcome::Completed(ResponseEnvelope::unavailable(&request, modality));
        };

        let request = Arc::new(request);
        let started = Instant::now();
        let work = pipeline.analyze(Arc::clone(&request));
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(result) => result,
                Err(_) => Err(AnalysisError::Timeout(limit)),
            },
            None => work.await,
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(analysis) => {
                info!(
                    %modality,
                    pipeline = pipeline.name(),
                    filename = %request.filename,
                    elapsed_ms,
                    "Analysis complete"
                );
                AnalysisOutcome::Completed(ResponseEnvelope::success(&request, analysis))
            }
            Err(AnalysisError::EmptyVideo) => {
                warn!(filename = %request.filename, elapsed_ms, "Video had no decodable frame");
                AnalysisOutcome::Rejected(ResponseEnvelope::empty_video(
                    &request,
                    AnalysisError::EmptyVideo.to_string(),
                ))
            }
            Err(e) => {
                warn!(
                    %modality,
                    kind = e.kind(),
                    error = %e,
                    filename = %request.filename,
                    elapsed_ms,
                    "Analysis failed"
                );
                AnalysisOutcome::Failed(e)
            }
        }
    }
}
