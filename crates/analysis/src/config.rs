use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How raw 0–255 pixels are mapped to model input values.
///
/// Part of the model contract: exactly one convention matches a given weight file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelConvention {
    /// `x / 255`, the convention `model_epoch_80` was trained with.
    Rescale,
    /// `(x / 255 - mean) / std` with the ImageNet channel statistics.
    Imagenet,
}

impl FromStr for PixelConvention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rescale" => Ok(Self::Rescale),
            "imagenet" => Ok(Self::Imagenet),
            other => Err(format!("unknown pixel convention '{other}' (expected rescale|imagenet)")),
        }
    }
}

/// Which frames of a video are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramePolicy {
    /// Classify the first readable frame only.
    SingleFrame,
    /// Classify every frame and average the probability vectors.
    MultiFrame,
}

impl FromStr for FramePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_frame" => Ok(Self::SingleFrame),
            "multi_frame" => Ok(Self::MultiFrame),
            other => Err(format!(
                "unknown video policy '{other}' (expected single_frame|multi_frame)"
            )),
        }
    }
}

/// Configuration for the analysis pipelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Per-request wall-clock limit. None = unbounded.
    pub request_timeout_secs: Option<u64>,
    /// Path to the image classifier ONNX file. None disables image and video.
    pub image_model_path: Option<String>,
    /// Class labels in model output order.
    pub image_labels: Vec<String>,
    pub pixel_convention: PixelConvention,
    pub video_policy: FramePolicy,
    /// Cap on frames extracted by the multi-frame policy.
    pub video_max_frames: usize,
    /// ffmpeg binary used for non-GIF containers.
    pub ffmpeg_path: String,
    /// Path to the CTC speech model ONNX file. None disables audio.
    pub audio_model_path: Option<String>,
    /// CTC character set; index 0 is the OOV token, the blank follows the last symbol.
    pub audio_vocabulary: String,
}

impl AnalysisConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: None,
            image_model_path: None,
            image_labels: vec![
                "acne".to_string(),
                "benign-mole".to_string(),
                "bruises".to_string(),
                "dermatitis".to_string(),
                "freckles".to_string(),
                "melanoma".to_string(),
                "stretch marks".to_string(),
                "wart".to_string(),
            ],
            pixel_convention: PixelConvention::Rescale,
            video_policy: FramePolicy::SingleFrame,
            video_max_frames: 300,
            ffmpeg_path: "ffmpeg".to_string(),
            audio_model_path: None,
            audio_vocabulary: "abcdefghijklmnopqrstuvwxyz'?! ".to_string(),
        }
    }
}
