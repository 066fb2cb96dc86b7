use serde::{Deserialize, Serialize};

use crate::{MediaRequest, Modality};

pub const STATUS_UNSUPPORTED: &str = "unsupported type";
pub const STATUS_UNAVAILABLE: &str = "analysis unavailable";
pub const STATUS_NO_FRAME: &str = "no frame decodable";

/// A single (label, confidence) pair as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "class")]
    pub label: String,
    pub confidence: f32,
}

/// Modality-specific body of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Analysis {
    Classification {
        predicted_class: String,
        confidence: f32,
        /// Sorted descending by confidence.
        all_predictions: Vec<Prediction>,
        model_used: String,
        /// Only set by the multi-frame video policy.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        frames_analyzed: Option<usize>,
    },
    Transcription {
        transcription: String,
        model_used: String,
    },
    Status {
        status: String,
        note: String,
    },
}

impl Analysis {
    pub fn status(status: &str, note: impl Into<String>) -> Self {
        Self::Status {
            status: status.to_string(),
            note: note.into(),
        }
    }
}

/// The externally observable response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub file_type: String,
    pub filename: String,
    pub message: String,
    pub analysis: Analysis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    fn for_request(request: &MediaRequest, success: bool, analysis: Analysis) -> Self {
        Self {
            success,
            file_type: request.file_type.clone(),
            filename: request.filename.clone(),
            message: request.message.clone(),
            analysis,
            error: None,
        }
    }

    pub fn success(request: &MediaRequest, analysis: Analysis) -> Self {
        Self::for_request(request, true, analysis)
    }

    pub fn unsupported(request: &MediaRequest) -> Self {
        Self::for_request(
            request,
            false,
            Analysis::status(
                STATUS_UNSUPPORTED,
                "Only image, video or audio files are supported.",
            ),
        )
    }

    /// A supported modality with no pipeline configured (e.g. no model deployed).
    pub fn unavailable(request: &MediaRequest, modality: Modality) -> Self {
        Self::for_request(
            request,
            false,
            Analysis::status(
                STATUS_UNAVAILABLE,
                format!("The {modality} model has not been integrated yet."),
            ),
        )
    }

    pub fn empty_video(request: &MediaRequest, reason: impl Into<String>) -> Self {
        let mut envelope = Self::for_request(
            request,
            false,
            Analysis::status(STATUS_NO_FRAME, "The video could not be read."),
        );
        envelope.error = Some(reason.into());
        envelope
    }
}
