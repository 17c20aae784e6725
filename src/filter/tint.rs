//! Tint filter using RGBK channel separation.
//!
//! The sprite is split into four layers: red only, green only, blue only,
//! and black (all color zeroed), each keeping the original alpha. The black
//! layer is copied into a fresh buffer and the color layers are then added
//! on top with additive blending, each at an opacity proportional to the
//! requested channel. Detail and coverage survive the recolor, which a flat
//! alpha-blended wash would lose.

use image::{Rgba, RgbaImage};

use crate::config::FilterOptions;
use crate::raster::{BlendMode, composite};

/// Splits an image into `[red, green, blue, black]` layers.
pub fn rgbk_layers(image: &RgbaImage) -> [RgbaImage; 4] {
    let (width, height) = image.dimensions();
    let mut layers: [RgbaImage; 4] = std::array::from_fn(|_| RgbaImage::new(width, height));

    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        layers[0].put_pixel(x, y, Rgba([r, 0, 0, a]));
        layers[1].put_pixel(x, y, Rgba([0, g, 0, a]));
        layers[2].put_pixel(x, y, Rgba([0, 0, b, a]));
        layers[3].put_pixel(x, y, Rgba([0, 0, 0, a]));
    }

    layers
}

/// Recolors `buffer` toward `colors` (0-255 per channel).
///
/// Channels with a value of zero or less are skipped entirely.
pub fn tint(buffer: &RgbaImage, options: &FilterOptions) -> RgbaImage {
    let [red, green, blue, black] = rgbk_layers(buffer);

    let mut out = RgbaImage::new(buffer.width(), buffer.height());
    composite(&mut out, &black, 1.0, BlendMode::Copy);

    for (index, layer) in [red, green, blue].iter().enumerate() {
        let value = options.channel(index);
        if value > 0.0 {
            composite(&mut out, layer, (value / 255.0) as f32, BlendMode::Lighter);
        }
    }

    out
}
