//! Conversion of arbitrary uploads into the canonical signal each model was trained on.
//!
//! - audio: 22050 Hz, mono, 16-bit PCM
//! - image: 224×224 RGB
//! - video: a sequence of RGB frames (resized per frame by the image path)

pub mod audio;
pub mod image;
pub mod opus_decoder;
pub mod resampler;
pub mod video;

pub use audio::normalize_audio;
pub use image::{conform_frame, normalize_image};
pub use opus_decoder::OpusDecoder;
pub use resampler::Resampler;
pub use video::FrameExtractor;

use std::io::Cursor;

use crate::error::AnalysisError;

/// Sample rate the speech model was trained at.
pub const TARGET_SAMPLE_RATE: u32 = 22_050;
pub const TARGET_CHANNELS: u16 = 1;

/// Canonical audio: mono 16-bit PCM at [`TARGET_SAMPLE_RATE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmAudio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmAudio {
    pub fn is_canonical(&self) -> bool {
        self.sample_rate == TARGET_SAMPLE_RATE && self.channels == TARGET_CHANNELS
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Samples scaled to [-1.0, 1.0).
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples.iter().map(|&s| i16_to_f32(s)).collect()
    }

    /// Encodes the buffer as a 16-bit PCM WAV file.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, AnalysisError> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer =
                hound::WavWriter::new(&mut cursor, spec).map_err(AnalysisError::decode)?;
            for &sample in &self.samples {
                writer.write_sample(sample).map_err(AnalysisError::decode)?;
            }
            writer.finalize().map_err(AnalysisError::decode)?;
        }
        Ok(cursor.into_inner())
    }
}

pub(crate) fn i16_to_f32(sample: i16) -> f32 {
    sample as f32 / 32768.0
}

pub(crate) fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}
