pub mod config;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod features;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod ranker;

pub use config::{AnalysisConfig, FramePolicy, PixelConvention};
pub use engine::{AnalysisEngine, AnalysisOutcome};
pub use envelope::{Analysis, Prediction, ResponseEnvelope};
pub use error::AnalysisError;
pub use pipeline::MediaPipeline;

use std::fmt;

/// One of the three media categories a request can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modality {
    Image,
    Video,
    Audio,
}

impl Modality {
    /// Parses a caller-supplied tag. Matching is exact: `"Image"` or `" image"` are not modalities.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded file plus the form fields that came with it.
#[derive(Debug, Clone)]
pub struct MediaRequest {
    pub bytes: Vec<u8>,
    /// Used only to infer the container; never opened as a path.
    pub filename: String,
    /// Declared MIME type of the upload, if the caller sent one.
    pub content_type: Option<String>,
    /// Raw modality tag as received. May name an unsupported type.
    pub file_type: String,
    /// Free text echoed back unmodified.
    pub message: String,
}

impl MediaRequest {
    pub fn new(
        bytes: Vec<u8>,
        filename: impl Into<String>,
        file_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            content_type: None,
            file_type: file_type.into(),
            message: message.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Lowercased filename extension without the dot.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}
