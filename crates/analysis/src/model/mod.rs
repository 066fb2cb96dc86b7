//! Loaded models and the shape contract around their forward passes.
//!
//! Models are constructed once, wrapped in `Arc`, and shared read-only by
//! every request.

pub mod ctc;
pub mod mock;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use ctc::CtcVocabulary;

use ndarray::{Array2, Array3, Array4};

use crate::error::AnalysisError;

/// NHWC input of the image classifier, batch of one.
pub const IMAGE_INPUT_SHAPE: [usize; 4] = [1, 224, 224, 3];

/// Trait for image classifiers producing one probability per class.
pub trait ImageModel: Send + Sync + 'static {
    /// Identifier reported as `model_used`.
    fn name(&self) -> &str;

    /// Declared input shape, batch dimension included.
    fn input_shape(&self) -> [usize; 4] {
        IMAGE_INPUT_SHAPE
    }

    /// Runs one forward pass. Callers go through [`classify`], which checks shapes.
    fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>, AnalysisError>;
}

/// Trait for CTC speech models producing per-timestep symbol probabilities.
pub trait SpeechModel: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Frequency bins per spectrogram frame the model was trained on.
    fn feature_bins(&self) -> usize {
        crate::features::spectrogram::FREQ_BINS
    }

    /// Runs one forward pass on a (1, frames, bins) spectrogram.
    /// Returns a (timesteps, symbols) matrix.
    fn forward(&self, input: Array3<f32>) -> Result<Array2<f32>, AnalysisError>;
}

/// Checks `input` against the model contract, then runs the classifier.
pub fn classify(
    model: &dyn ImageModel,
    input: Array4<f32>,
    num_classes: usize,
) -> Result<Vec<f32>, AnalysisError> {
    let expected = model.input_shape();
    if input.shape() != expected {
        return Err(AnalysisError::Shape(format!(
            "{} expects input {:?}, got {:?}",
            model.name(),
            expected,
            input.shape()
        )));
    }

    let probabilities = model.forward(input)?;
    if probabilities.len() != num_classes {
        return Err(AnalysisError::Shape(format!(
            "{} produced {} scores, expected {num_classes}",
            model.name(),
            probabilities.len()
        )));
    }
    Ok(probabilities)
}

/// Checks `input` against the model contract, then runs the speech model.
pub fn recognize(
    model: &dyn SpeechModel,
    input: Array3<f32>,
    num_symbols: usize,
) -> Result<Array2<f32>, AnalysisError> {
    let shape = input.shape();
    if shape[0] != 1 || shape[1] == 0 || shape[2] != model.feature_bins() {
        return Err(AnalysisError::Shape(format!(
            "{} expects input [1, frames>0, {}], got {:?}",
            model.name(),
            model.feature_bins(),
            shape
        )));
    }

    let symbol_probs = model.forward(input)?;
    if symbol_probs.ncols() != num_symbols {
        return Err(AnalysisError::Shape(format!(
            "{} emits {} symbols per step, vocabulary needs {num_symbols}",
            model.name(),
            symbol_probs.ncols()
        )));
    }
    Ok(symbol_probs)
}
