//! Raster conversions and whole-image compositing.
//!
//! Filters work on straight-alpha [`RgbaImage`] buffers while drawing goes
//! through premultiplied [`Pixmap`]s. This module owns the conversions
//! between the two and the three compositing rules the filters need.

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{ColorU8, Pixmap};

// ============================================================================
// Blend Mode
// ============================================================================

/// Compositing rule used by [`composite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Replace the destination with the source (canvas `copy`).
    Copy,
    /// Standard alpha blending (canvas `source-over`).
    SourceOver,
    /// Additive blending, saturating per channel (canvas `lighter`).
    Lighter,
}

/// Draws `src` over the whole of `dest` using `mode`, with the source alpha
/// scaled by `opacity`.
///
/// Both images are expected to share dimensions; pixels outside the overlap
/// are left untouched.
pub fn composite(dest: &mut RgbaImage, src: &RgbaImage, opacity: f32, mode: BlendMode) {
    let width = dest.width().min(src.width());
    let height = dest.height().min(src.height());
    let opacity = opacity.clamp(0.0, 1.0);

    for y in 0..height {
        for x in 0..width {
            let s = *src.get_pixel(x, y);
            let d = *dest.get_pixel(x, y);
            let out = match mode {
                BlendMode::Copy => copy(s, opacity),
                BlendMode::SourceOver => source_over(s, d, opacity),
                BlendMode::Lighter => lighter(s, d, opacity),
            };
            dest.put_pixel(x, y, out);
        }
    }
}

fn copy(src: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    if opacity >= 1.0 {
        return src;
    }
    let a = to_unit(src[3]) * opacity;
    if a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    Rgba([src[0], src[1], src[2], to_byte(a)])
}

/// Source-over blending of two straight-alpha pixels.
pub fn source_over(src: Rgba<u8>, dst: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let sa = to_unit(src[3]) * opacity;
    let da = to_unit(dst[3]);

    let out_a = sa + da * (1.0 - sa);
    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |s: u8, d: u8| -> u8 {
        let out = (to_unit(s) * sa + to_unit(d) * da * (1.0 - sa)) / out_a;
        to_byte(out)
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        to_byte(out_a),
    ])
}

/// Additive blending of two straight-alpha pixels.
///
/// Premultiplied channels and alpha are summed and clamped to 1, then the
/// result is converted back to straight alpha.
pub fn lighter(src: Rgba<u8>, dst: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let sa = to_unit(src[3]) * opacity;
    let da = to_unit(dst[3]);

    let out_a = (sa + da).min(1.0);
    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let add = |s: u8, d: u8| -> u8 {
        let premultiplied = (to_unit(s) * sa + to_unit(d) * da).min(1.0);
        to_byte(premultiplied / out_a)
    };

    Rgba([
        add(src[0], dst[0]),
        add(src[1], dst[1]),
        add(src[2], dst[2]),
        to_byte(out_a),
    ])
}

#[inline]
fn to_unit(v: u8) -> f32 {
    v as f32 / 255.0
}

#[inline]
fn to_byte(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

// ============================================================================
// Pixmap Conversions
// ============================================================================

/// Converts a premultiplied tiny-skia pixmap into a straight-alpha image.
pub fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());

    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
    }

    img
}

/// Converts a straight-alpha image into a premultiplied pixmap.
///
/// Returns `None` for zero-sized images, which tiny-skia cannot allocate.
pub fn rgba_image_to_pixmap(img: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(img.width(), img.height())?;

    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }

    Some(pixmap)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_over_opaque_source_wins() {
        let out = source_over(Rgba([0, 0, 255, 255]), Rgba([255, 0, 0, 255]), 1.0);
        assert_eq!(out.0, [0, 0, 255, 255]);
    }

    #[test]
    fn source_over_transparent_source_keeps_destination() {
        let out = source_over(Rgba([0, 0, 255, 0]), Rgba([10, 20, 30, 255]), 1.0);
        assert_eq!(out.0, [10, 20, 30, 255]);
    }

    #[test]
    fn source_over_half_alpha_mixes() {
        let out = source_over(Rgba([0, 0, 255, 128]), Rgba([255, 0, 0, 255]), 1.0);
        assert!(out[0] > 0, "Should have some red");
        assert!(out[2] > 0, "Should have some blue");
        assert_eq!(out[3], 255);
    }

    #[test]
    fn lighter_adds_channels() {
        let out = lighter(Rgba([100, 0, 0, 255]), Rgba([0, 50, 0, 255]), 1.0);
        assert_eq!(out.0, [100, 50, 0, 255]);
    }

    #[test]
    fn lighter_saturates() {
        let out = lighter(Rgba([200, 0, 0, 255]), Rgba([200, 0, 0, 255]), 1.0);
        assert_eq!(out.0, [255, 0, 0, 255]);
    }

    #[test]
    fn lighter_scales_by_opacity() {
        let out = lighter(Rgba([200, 0, 0, 255]), Rgba([0, 0, 0, 255]), 0.5);
        assert_eq!(out.0, [100, 0, 0, 255]);
    }

    #[test]
    fn composite_copy_replaces() {
        let mut dest = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let src = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4]));
        composite(&mut dest, &src, 1.0, BlendMode::Copy);
        assert_eq!(dest.get_pixel(1, 1).0, [1, 2, 3, 4]);
    }

    #[test]
    fn pixmap_conversion_preserves_opaque_pixels() {
        let mut img = RgbaImage::new(3, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([12, 34, 56, 255]));
        img.put_pixel(2, 0, Rgba([0, 0, 0, 0]));

        let pixmap = rgba_image_to_pixmap(&img).unwrap();
        let back = pixmap_to_rgba_image(&pixmap);
        assert_eq!(back, img);
    }

    #[test]
    fn zero_sized_image_has_no_pixmap() {
        assert!(rgba_image_to_pixmap(&RgbaImage::new(0, 4)).is_none());
    }
}
