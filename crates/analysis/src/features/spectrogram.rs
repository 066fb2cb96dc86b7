//! Magnitude spectrogram matching the speech model's training-time front end.
//!
//! These constants are part of the model contract. A different value does not
//! fail; it silently produces features the model cannot read.

use std::f32::consts::PI;

use ndarray::{Array2, Array3, Axis};
use rustfft::{FftPlanner, num_complex::Complex};

use crate::error::AnalysisError;

pub const FRAME_LENGTH: usize = 256;
pub const FRAME_STEP: usize = 160;
pub const FFT_LENGTH: usize = 384;
/// `FFT_LENGTH / 2 + 1` one-sided frequency bins.
pub const FREQ_BINS: usize = FFT_LENGTH / 2 + 1;
/// Exponent applied to the magnitude in place of a log.
pub const MAGNITUDE_POWER: f32 = 0.5;
pub const NORM_EPSILON: f32 = 1e-10;

/// Number of STFT frames for a signal of `num_samples` (no end padding).
pub fn frame_count(num_samples: usize) -> usize {
    if num_samples < FRAME_LENGTH {
        0
    } else {
        1 + (num_samples - FRAME_LENGTH) / FRAME_STEP
    }
}

/// Periodic Hann window.
fn hann_window(window_length: usize) -> Vec<f32> {
    (0..window_length)
        .map(|i| 0.5 - 0.5 * ((2.0 * PI * i as f32) / window_length as f32).cos())
        .collect()
}

/// `|STFT|^0.5` of shape (frames, bins).
fn stft_magnitude(samples: &[f32]) -> Array2<f32> {
    let window = hann_window(FRAME_LENGTH);
    let num_frames = frame_count(samples.len());
    let mut spectrogram = Array2::<f32>::zeros((num_frames, FREQ_BINS));

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(FFT_LENGTH);
    let mut frame = vec![Complex::new(0.0f32, 0.0); FFT_LENGTH];

    for frame_idx in 0..num_frames {
        let start = frame_idx * FRAME_STEP;
        for (i, slot) in frame.iter_mut().enumerate() {
            *slot = if i < FRAME_LENGTH {
                Complex::new(samples[start + i] * window[i], 0.0)
            } else {
                Complex::new(0.0, 0.0)
            };
        }
        fft.process(&mut frame);
        for k in 0..FREQ_BINS {
            spectrogram[[frame_idx, k]] = frame[k].norm().powf(MAGNITUDE_POWER);
        }
    }

    spectrogram
}

/// Standardizes each frame across its frequency bins.
fn normalize_frames(mut spectrogram: Array2<f32>) -> Array2<f32> {
    for mut row in spectrogram.axis_iter_mut(Axis(0)) {
        let n = row.len() as f32;
        let mean = row.iter().sum::<f32>() / n;
        let variance = row.iter().map(|&x| (x - mean).powi(2)).sum::<f32>() / n;
        let std = variance.sqrt();
        row.mapv_inplace(|x| (x - mean) / (std + NORM_EPSILON));
    }
    spectrogram
}

/// Computes the model input for mono samples in [-1, 1]: shape (1, frames, 193).
pub fn spectrogram(samples: &[f32]) -> Result<Array3<f32>, AnalysisError> {
    if samples.len() < FRAME_LENGTH {
        return Err(AnalysisError::Shape(format!(
            "audio has {} samples, fewer than one {FRAME_LENGTH}-sample STFT frame",
            samples.len()
        )));
    }

    let features = normalize_frames(stft_magnitude(samples));
    Ok(features.insert_axis(Axis(0)))
}
