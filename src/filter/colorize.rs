//! Colorize filter: fill the sprite's transparent areas with a solid color.

use image::{Rgba, RgbaImage};
use palette::Srgba;

use crate::config::FilterOptions;
use crate::raster::{BlendMode, composite};

/// Composites `buffer` over a solid fill.
///
/// The fill is `colors` (0-255) with alpha `strength`, which defaults to 1.
/// Opaque source pixels come through unchanged, fully transparent ones take
/// the fill color, and partially covered ones blend between the two.
pub fn colorize(buffer: &RgbaImage, options: &FilterOptions) -> RgbaImage {
    let fill = fill_color(options);
    let mut render = RgbaImage::from_pixel(
        buffer.width(),
        buffer.height(),
        Rgba([fill.red, fill.green, fill.blue, fill.alpha]),
    );

    composite(&mut render, buffer, 1.0, BlendMode::SourceOver);
    render
}

/// Resolves the fill color from filter options.
pub fn fill_color(options: &FilterOptions) -> Srgba<u8> {
    let unit = |index: usize| (options.channel(index) / 255.0).clamp(0.0, 1.0) as f32;
    let alpha = options.strength_or_full().clamp(0.0, 1.0) as f32;

    Srgba::new(unit(0), unit(1), unit(2), alpha).into_format()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(colors: [f64; 3], strength: Option<f64>) -> FilterOptions {
        FilterOptions {
            strength,
            ..FilterOptions::colors(colors)
        }
    }

    #[test]
    fn opaque_pixels_are_unchanged() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([12, 200, 99, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 255]));

        let out = colorize(&img, &options([255.0, 0.0, 0.0], Some(1.0)));
        assert_eq!(out, img);
    }

    #[test]
    fn transparent_pixels_take_the_fill() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([12, 200, 99, 255]));
        img.put_pixel(1, 0, Rgba([50, 50, 50, 0]));

        let out = colorize(&img, &options([10.0, 20.0, 30.0], Some(1.0)));
        assert_eq!(out.get_pixel(0, 0).0, [12, 200, 99, 255]);
        assert_eq!(out.get_pixel(1, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn missing_strength_means_full() {
        let img = RgbaImage::new(1, 1);
        let out = colorize(&img, &options([0.0, 0.0, 255.0], None));
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn strength_sets_fill_alpha() {
        let img = RgbaImage::new(1, 1);
        let out = colorize(&img, &options([0.0, 255.0, 0.0], Some(0.5)));
        assert_eq!(out.get_pixel(0, 0).0, [0, 255, 0, 128]);
    }

    #[test]
    fn half_covered_pixels_blend_with_fill() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 128]));
        let out = colorize(&img, &options([0.0, 0.0, 255.0], Some(1.0)));
        let p = out.get_pixel(0, 0);
        assert!(p[0] > 0 && p[2] > 0);
        assert_eq!(p[3], 255);
    }

    #[test]
    fn fill_color_clamps_out_of_range_channels() {
        let fill = fill_color(&options([300.0, -5.0, 128.0], Some(2.0)));
        assert_eq!((fill.red, fill.green, fill.blue, fill.alpha), (255, 0, 128, 255));
    }
}
