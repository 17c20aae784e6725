//! Desaturate filter.

use image::RgbaImage;

/// Replaces each pixel's R, G and B with their arithmetic mean.
///
/// No luminance weighting is applied and alpha is left untouched.
pub fn desaturate(mut buffer: RgbaImage) -> RgbaImage {
    for pixel in buffer.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let average = ((r as u16 + g as u16 + b as u16) as f32 / 3.0).round() as u8;
        pixel.0 = [average, average, average, a];
    }
    buffer
}
