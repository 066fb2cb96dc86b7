//! Synthetic uploads.

use std::io::Cursor;

use image::codecs::gif::GifEncoder;
use image::{Delay, DynamicImage, Frame, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use mediascan_analysis::normalize::{PcmAudio, TARGET_SAMPLE_RATE};

/// Mono 16-bit silence at the speech model's sample rate.
pub fn silent_wav(secs: u32) -> Vec<u8> {
    PcmAudio {
        samples: vec![0; (TARGET_SAMPLE_RATE * secs) as usize],
        sample_rate: TARGET_SAMPLE_RATE,
        channels: 1,
    }
    .to_wav_bytes()
    .unwrap()
}

/// Bytes no decoder recognizes.
pub fn garbage() -> Vec<u8> {
    (0..2048u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8 | 0x01).collect()
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Animated GIF with `count` distinct solid-color frames.
pub fn animated_gif(count: u8) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        let frames = (0..count).map(|i| {
            let shade = i.wrapping_mul(23);
            let img = RgbaImage::from_pixel(48, 48, Rgba([shade, 255 - shade, 64, 255]));
            Frame::from_parts(img, 0, 0, Delay::from_numer_denom_ms(40, 1))
        });
        encoder.encode_frames(frames).unwrap();
    }
    buf
}
