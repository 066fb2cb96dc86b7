use rubato::{
    Async as AsyncResampler, FixedAsync, Resampler as RubatoResampler,
    SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use audioadapter_buffers::direct::InterleavedSlice;

use crate::error::AnalysisError;

/// Input frames per resampler call.
const CHUNK_SIZE: usize = 1024;

/// Mono sinc resampler between two fixed rates.
pub struct Resampler {
    inner: AsyncResampler<f32>,
    /// Accumulator for input samples that don't fill a complete chunk.
    pending: Vec<f32>,
    /// Number of input frames the resampler expects per process() call.
    chunk_size: usize,
}

impl Resampler {
    /// Creates a mono resampler from `from_rate` to `to_rate`.
    pub fn new(from_rate: u32, to_rate: u32, chunk_size: usize) -> Result<Self, AnalysisError> {
        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        let inner = AsyncResampler::<f32>::new_sinc(
            to_rate as f64 / from_rate as f64,
            2.0,
            &params,
            chunk_size,
            1,                 // mono channel
            FixedAsync::Input, // fixed input size
        )
        .map_err(|e| AnalysisError::Decode(format!("failed to create resampler: {e}")))?;

        Ok(Self {
            inner,
            pending: Vec::with_capacity(chunk_size * 2),
            chunk_size,
        })
    }

    /// Feeds mono samples and returns whatever resampled output is ready.
    ///
    /// Buffers internally if input doesn't fill a complete resampler chunk.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>, AnalysisError> {
        self.pending.extend_from_slice(input);

        let mut output = Vec::new();

        while self.pending.len() >= self.chunk_size {
            let chunk: Vec<f32> = self.pending.drain(..self.chunk_size).collect();
            let frames = chunk.len(); // mono: 1 sample = 1 frame
            let input_adapter = InterleavedSlice::new(&chunk, 1, frames)
                .map_err(|e| AnalysisError::Decode(format!("resampler input adapter: {e}")))?;

            let resampled = self
                .inner
                .process(&input_adapter, 0, None)
                .map_err(|e| AnalysisError::Decode(format!("resample error: {e}")))?;

            output.extend(resampled.take_data());
        }

        Ok(output)
    }

    /// Output frames between an input event and its appearance in the output.
    pub fn output_delay(&self) -> usize {
        self.inner.output_delay()
    }

    /// Flushes any remaining buffered samples (with zero-padding).
    pub fn flush(&mut self) -> Result<Vec<f32>, AnalysisError> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        self.pending.resize(self.chunk_size, 0.0);
        self.process(&[])
    }
}

/// Resamples a complete mono clip, returning exactly `len * to / from` samples
/// aligned with the input.
pub fn resample_clip(
    samples: &[f32],
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<f32>, AnalysisError> {
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }

    let expected_len = (samples.len() as u64 * to_rate as u64 / from_rate as u64) as usize;
    let mut resampler = Resampler::new(from_rate, to_rate, CHUNK_SIZE)?;
    let delay = resampler.output_delay();

    let mut output = resampler.process(samples)?;
    output.extend(resampler.flush()?);
    // Push silence until the delayed tail has drained.
    while output.len() < expected_len + delay {
        let tail = resampler.process(&vec![0.0; CHUNK_SIZE])?;
        if tail.is_empty() {
            break;
        }
        output.extend(tail);
    }
    output.drain(..delay.min(output.len()));
    output.truncate(expected_len);

    Ok(output)
}
