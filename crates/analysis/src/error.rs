use std::time::Duration;

/// Request-local failure kinds. None of these touch the loaded models.
///
/// An unsupported modality is deliberately absent: it is a normal negative
/// result, reported through the envelope.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Unreadable, corrupt or unsupported media bytes.
    #[error("could not decode media: {0}")]
    Decode(String),

    /// A tensor that does not match the model's input or output contract.
    #[error("tensor shape mismatch: {0}")]
    Shape(String),

    /// The video container yielded no decodable frame.
    #[error("no frame decodable from video")]
    EmptyVideo,

    /// The inference runtime failed while executing a forward pass.
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("analysis exceeded {0:?}")]
    Timeout(Duration),
}

impl AnalysisError {
    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    pub fn inference(err: impl std::fmt::Display) -> Self {
        Self::Inference(err.to_string())
    }

    /// Short machine-readable kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Shape(_) => "shape",
            Self::EmptyVideo => "empty_video",
            Self::Inference(_) => "inference",
            Self::Timeout(_) => "timeout",
        }
    }
}
