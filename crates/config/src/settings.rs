use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Class labels of the deployed `model_epoch_80` skin-condition classifier,
/// in output-index order.
pub const DEFAULT_IMAGE_LABELS: [&str; 8] = [
    "acne",
    "benign-mole",
    "bruises",
    "dermatitis",
    "freckles",
    "melanoma",
    "stretch marks",
    "wart",
];

/// Character set of the deployed CTC speech model (index 0 is reserved for OOV).
pub const DEFAULT_AUDIO_VOCABULARY: &str = "abcdefghijklmnopqrstuvwxyz'?! ";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub analysis: AnalysisSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Upper bound on a multipart upload body, in bytes.
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisSettings {
    /// Per-request wall-clock limit. `None` disables the timeout.
    pub request_timeout_secs: Option<u64>,
    pub image: ImageSettings,
    pub video: VideoSettings,
    pub audio: AudioSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImageSettings {
    /// Path to the ONNX export of the image classifier. Also drives video.
    pub model_path: Option<String>,
    pub labels: Vec<String>,
    /// "rescale" (divide by 255) or "imagenet" (channel mean/std).
    pub pixel_convention: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VideoSettings {
    /// "single_frame" or "multi_frame".
    pub policy: String,
    pub max_frames: usize,
    pub ffmpeg_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AudioSettings {
    /// Path to the ONNX export of the CTC speech model.
    pub model_path: Option<String>,
    pub vocabulary: String,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("MEDIASCAN"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 8000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("app.max_upload_bytes", 100 * 1024 * 1024)?
            .set_default("analysis.request_timeout_secs", None::<u64>)?
            .set_default("analysis.image.model_path", "models/model_epoch_80.onnx")?
            .set_default(
                "analysis.image.labels",
                DEFAULT_IMAGE_LABELS
                    .iter()
                    .map(|l| l.to_string())
                    .collect::<Vec<_>>(),
            )?
            .set_default("analysis.image.pixel_convention", "rescale")?
            .set_default("analysis.video.policy", "single_frame")?
            .set_default("analysis.video.max_frames", 300)?
            .set_default("analysis.video.ffmpeg_path", "ffmpeg")?
            .set_default("analysis.audio.model_path", None::<String>)?
            .set_default("analysis.audio.vocabulary", DEFAULT_AUDIO_VOCABULARY)?
            .build()?;

        config.try_deserialize()
    }
}
