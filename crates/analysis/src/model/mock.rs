//! In-memory models for wiring pipelines without weight files.

use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::{Array2, Array3, Array4};

use super::{ImageModel, SpeechModel};
use crate::error::AnalysisError;

type ScoreFn = dyn Fn(&Array4<f32>) -> Vec<f32> + Send + Sync;

/// Image model returning scores computed from the input, or fixed scores.
pub struct MockImageModel {
    name: String,
    score: Box<ScoreFn>,
    calls: AtomicUsize,
}

impl MockImageModel {
    pub fn fixed(name: impl Into<String>, probabilities: Vec<f32>) -> Self {
        Self::from_fn(name, move |_| probabilities.clone())
    }

    pub fn from_fn(
        name: impl Into<String>,
        score: impl Fn(&Array4<f32>) -> Vec<f32> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            score: Box::new(score),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of forward passes run so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageModel for MockImageModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((self.score)(&input))
    }
}

/// Speech model emitting a scripted symbol per timestep.
pub struct MockSpeechModel {
    name: String,
    num_classes: usize,
    /// Symbol index emitted at each timestep; timesteps past the end emit blank.
    script: Vec<usize>,
}

impl MockSpeechModel {
    /// Emits the blank symbol (last class) at every timestep.
    pub fn silent(name: impl Into<String>, num_classes: usize) -> Self {
        Self::scripted(name, num_classes, Vec::new())
    }

    pub fn scripted(name: impl Into<String>, num_classes: usize, script: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            num_classes,
            script,
        }
    }
}

impl SpeechModel for MockSpeechModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, input: Array3<f32>) -> Result<Array2<f32>, AnalysisError> {
        let timesteps = input.shape()[1];
        let blank = self.num_classes - 1;
        let mut probs = Array2::zeros((timesteps, self.num_classes));
        for t in 0..timesteps {
            let symbol = self.script.get(t).copied().unwrap_or(blank);
            probs[[t, symbol]] = 1.0;
        }
        Ok(probs)
    }
}
