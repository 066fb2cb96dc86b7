use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::error::AnalysisError;

/// Side length of the square raster the classifier consumes.
pub const TARGET_SIZE: u32 = 224;

/// Bicubic, fixed across calls; the weights were trained against it.
pub const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Decodes any supported encoding and conforms it to 224×224 RGB.
pub fn normalize_image(bytes: &[u8]) -> Result<RgbImage, AnalysisError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| AnalysisError::Decode(format!("image: {e}")))?;
    Ok(conform_frame(decoded.to_rgb8()))
}

/// Resizes an RGB raster to 224×224 unless it already is.
pub fn conform_frame(frame: RgbImage) -> RgbImage {
    if frame.dimensions() == (TARGET_SIZE, TARGET_SIZE) {
        return frame;
    }
    imageops::resize(&frame, TARGET_SIZE, TARGET_SIZE, RESIZE_FILTER)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgb, RgbaImage};

    use super::*;

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn png_is_resized_to_target() {
        let img = RgbImage::from_pixel(640, 480, Rgb([10, 20, 30]));
        let out = normalize_image(&encode(DynamicImage::ImageRgb8(img), ImageFormat::Png)).unwrap();
        assert_eq!(out.dimensions(), (TARGET_SIZE, TARGET_SIZE));
        assert_eq!(out.get_pixel(100, 100), &Rgb([10, 20, 30]));
    }

    #[test]
    fn alpha_is_dropped() {
        let img = RgbaImage::from_pixel(32, 32, image::Rgba([200, 100, 50, 7]));
        let bytes = encode(DynamicImage::ImageRgba8(img), ImageFormat::Png);
        let out = normalize_image(&bytes).unwrap();
        assert_eq!(out.get_pixel(0, 0), &Rgb([200, 100, 50]));
    }

    #[test]
    fn correctly_sized_frame_is_untouched() {
        let img = RgbImage::from_fn(TARGET_SIZE, TARGET_SIZE, |x, y| Rgb([x as u8, y as u8, 0]));
        assert_eq!(conform_frame(img.clone()), img);
    }

    #[test]
    fn corrupt_bytes_are_decode_error() {
        let err = normalize_image(&[0x89, b'P', b'N', b'G', 0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)));
    }
}
