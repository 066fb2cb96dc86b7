use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, RgbImage};
use tracing::debug;

use crate::config::FramePolicy;
use crate::error::AnalysisError;

/// Decodes video uploads into RGB frames.
///
/// Animated GIFs are decoded in-process. Every other container goes through
/// an `ffmpeg` subprocess that dumps PNG frames into a temporary directory.
#[derive(Debug, Clone)]
pub struct FrameExtractor {
    ffmpeg_path: String,
    max_frames: usize,
}

impl FrameExtractor {
    pub fn new(ffmpeg_path: impl Into<String>, max_frames: usize) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            max_frames: max_frames.max(1),
        }
    }

    /// Returns the frames selected by `policy`, in presentation order.
    ///
    /// A container no decoder can read gives an empty result; the caller
    /// decides what zero frames means. A missing `ffmpeg` binary or a temp
    /// file failure is a `Decode` error.
    pub fn extract(
        &self,
        bytes: &[u8],
        extension: Option<&str>,
        policy: FramePolicy,
    ) -> Result<Vec<RgbImage>, AnalysisError> {
        let limit = match policy {
            FramePolicy::SingleFrame => 1,
            FramePolicy::MultiFrame => self.max_frames,
        };

        let frames = match extension {
            Some("gif") => decode_gif(bytes, limit),
            _ => self.decode_with_ffmpeg(bytes, extension.unwrap_or("mp4"), limit)?,
        };

        debug!(frames = frames.len(), ?policy, "Video frames extracted");
        Ok(frames)
    }

    fn decode_with_ffmpeg(
        &self,
        bytes: &[u8],
        extension: &str,
        limit: usize,
    ) -> Result<Vec<RgbImage>, AnalysisError> {
        // Both guards delete their paths on drop, so every return below cleans up.
        let mut input = tempfile::Builder::new()
            .prefix("mediascan-upload-")
            .suffix(&format!(".{extension}"))
            .tempfile()
            .map_err(|e| AnalysisError::Decode(format!("temp file: {e}")))?;
        input
            .write_all(bytes)
            .and_then(|_| input.flush())
            .map_err(|e| AnalysisError::Decode(format!("temp file: {e}")))?;
        let frame_dir = tempfile::Builder::new()
            .prefix("mediascan-frames-")
            .tempdir()
            .map_err(|e| AnalysisError::Decode(format!("temp dir: {e}")))?;

        let output = Command::new(&self.ffmpeg_path)
            .arg("-nostdin")
            .args(["-v", "error"])
            .arg("-i")
            .arg(input.path())
            .args(["-frames:v", &limit.to_string()])
            .args(["-pix_fmt", "rgb24"])
            .arg(frame_dir.path().join("frame_%06d.png"))
            .output()
            .map_err(|e| {
                AnalysisError::Decode(format!("failed to run {}: {e}", self.ffmpeg_path))
            })?;

        // ffmpeg ran but could not read the container: no frame to offer.
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(status = %output.status, stderr = %stderr.trim(), "ffmpeg read no frames");
            return Ok(Vec::new());
        }

        let mut frame_paths = list_png_frames(frame_dir.path())?;
        frame_paths.sort();

        frame_paths
            .iter()
            .take(limit)
            .map(|path| {
                image::open(path)
                    .map(|img| img.to_rgb8())
                    .map_err(|e| AnalysisError::Decode(format!("frame {}: {e}", path.display())))
            })
            .collect()
    }
}

fn list_png_frames(dir: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| AnalysisError::Decode(format!("frame dir: {e}")))?;
    Ok(entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
        .collect())
}

/// Decodes up to `limit` frames, stopping at the first unreadable one.
///
/// An unreadable header yields no frames.
fn decode_gif(bytes: &[u8], limit: usize) -> Vec<RgbImage> {
    let decoder = match GifDecoder::new(Cursor::new(bytes)) {
        Ok(decoder) => decoder,
        Err(e) => {
            debug!(error = %e, "GIF header unreadable");
            return Vec::new();
        }
    };

    let mut frames = Vec::new();
    for frame in decoder.into_frames().take(limit) {
        match frame {
            Ok(f) => frames.push(DynamicImage::ImageRgba8(f.into_buffer()).to_rgb8()),
            Err(e) => {
                debug!(error = %e, decoded = frames.len(), "GIF frame unreadable");
                break;
            }
        }
    }
    frames
}
