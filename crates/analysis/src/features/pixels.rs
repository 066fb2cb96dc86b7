use image::RgbImage;
use ndarray::Array4;

use crate::config::PixelConvention;

pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

impl PixelConvention {
    /// Maps one 0–255 channel value to the model input domain.
    pub fn apply(&self, value: u8, channel: usize) -> f32 {
        let scaled = value as f32 / 255.0;
        match self {
            Self::Rescale => scaled,
            Self::Imagenet => (scaled - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel],
        }
    }
}

/// Builds an NHWC batch of one: shape (1, height, width, 3).
pub fn pixel_tensor(frame: &RgbImage, convention: PixelConvention) -> Array4<f32> {
    let (width, height) = frame.dimensions();
    Array4::from_shape_fn((1, height as usize, width as usize, 3), |(_, y, x, c)| {
        convention.apply(frame.get_pixel(x as u32, y as u32).0[c], c)
    })
}
