//! SVG sprite rasterization using resvg/usvg.

use image::RgbaImage;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use crate::error::{PiecesError, Result};
use crate::raster::pixmap_to_rgba_image;

/// Rasterizes SVG markup into an RGBA image.
///
/// With `size = None` the document is drawn at its natural size. Otherwise it
/// is scaled so its larger dimension equals `size`, preserving aspect ratio.
pub fn render_svg(svg_data: &str, size: Option<u32>) -> Result<RgbaImage> {
    let opts = Options::default();
    let tree = Tree::from_str(svg_data, &opts).map_err(|e| PiecesError::Svg(e.to_string()))?;

    let svg_size = tree.size();
    let scale = match size {
        Some(size) => size as f32 / svg_size.width().max(svg_size.height()),
        None => 1.0,
    };
    let width = (svg_size.width() * scale).ceil() as u32;
    let height = (svg_size.height() * scale).ceil() as u32;

    let mut pixmap = Pixmap::new(width, height).ok_or(PiecesError::EmptyAsset)?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    Ok(pixmap_to_rgba_image(&pixmap))
}

/// Looks up the Twemoji SVG for an emoji character.
#[cfg(feature = "twemoji")]
pub fn resolve_emoji(emoji: &str) -> Option<&'static str> {
    use twemoji_assets::svg::SvgTwemojiAsset;

    let asset = SvgTwemojiAsset::from_emoji(emoji)?;
    Some(asset.as_ref())
}

/// Without the `twemoji` feature no emoji can be resolved.
#[cfg(not(feature = "twemoji"))]
pub fn resolve_emoji(_emoji: &str) -> Option<&'static str> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOT_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10"><rect width="20" height="10" fill="#00ff00"/></svg>"##;

    #[test]
    fn renders_at_natural_size() {
        let img = render_svg(DOT_SVG, None).unwrap();
        assert_eq!(img.dimensions(), (20, 10));
        assert_eq!(img.get_pixel(5, 5).0, [0, 255, 0, 255]);
    }

    #[test]
    fn scales_to_requested_size() {
        let img = render_svg(DOT_SVG, Some(40)).unwrap();
        assert_eq!(img.dimensions(), (40, 20));
    }

    #[test]
    fn rejects_invalid_markup() {
        assert!(matches!(render_svg("not svg", None), Err(PiecesError::Svg(_))));
    }

    #[cfg(feature = "twemoji")]
    #[test]
    fn resolves_known_emoji() {
        let svg = resolve_emoji("🦆").expect("Duck emoji should be supported");
        assert!(svg.contains("<svg"));
    }
}
