pub mod pixels;
pub mod spectrogram;

pub use pixels::pixel_tensor;
pub use spectrogram::spectrogram;
