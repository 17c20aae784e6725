//! Sprite assets and the loader that resolves them.
//!
//! An [`Asset`] is the decoded, immutable sprite every particle of an emitter
//! draws. It keeps both representations the crate needs: the straight-alpha
//! [`RgbaImage`] filters operate on, and the premultiplied [`Pixmap`] the
//! render surface blits from.

pub mod source;
pub mod svg;

pub use source::AssetSource;

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbaImage};
use resvg::tiny_skia::Pixmap;
use tracing::debug;

use crate::error::{PiecesError, Result};
use crate::raster::rgba_image_to_pixmap;
use source::DataUri;

// ============================================================================
// Asset
// ============================================================================

/// A decoded sprite image.
#[derive(Debug, Clone)]
pub struct Asset {
    image: RgbaImage,
    pixmap: Pixmap,
}

impl Asset {
    /// Wraps a straight-alpha image.
    ///
    /// Fails with [`PiecesError::EmptyAsset`] if the image has no pixels.
    pub fn from_image(image: RgbaImage) -> Result<Self> {
        let pixmap = rgba_image_to_pixmap(&image).ok_or(PiecesError::EmptyAsset)?;
        Ok(Self { image, pixmap })
    }

    /// Decodes PNG, JPEG or any other format the `image` crate recognizes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(PiecesError::AssetDecode)?
            .to_rgba8();
        Self::from_image(image)
    }

    /// Rasterizes SVG markup at its natural size.
    pub fn from_svg(markup: &str) -> Result<Self> {
        Self::from_image(svg::render_svg(markup, None)?)
    }

    /// The straight-alpha pixels.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// The premultiplied pixels used for drawing.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consumes the asset, returning its straight-alpha pixels.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Encodes the sprite as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(PiecesError::Encode)?;
        Ok(bytes)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Resolves an [`AssetSource`] into a decoded [`Asset`].
///
/// Unlike a browser image element, failures are reported instead of
/// silently never completing.
pub trait AssetLoader {
    fn load(&self, source: &AssetSource) -> Result<Asset>;
}

/// Loads an asset and hands it to `on_ready`.
///
/// `on_ready` runs at most once, and only on success; the error is returned
/// to the caller instead.
pub fn load_asset<L, F>(loader: &L, source: &AssetSource, on_ready: F) -> Result<()>
where
    L: AssetLoader + ?Sized,
    F: FnOnce(Asset),
{
    let asset = loader.load(source)?;
    on_ready(asset);
    Ok(())
}

/// Loads inline sources and local files.
///
/// Remote URLs are rejected with [`PiecesError::UnsupportedAssetSource`].
#[derive(Debug, Clone, Default)]
pub struct FileAssetLoader {
    base_dir: Option<PathBuf>,
}

impl FileAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves relative paths against `base_dir` instead of the working directory.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn load_data_uri(&self, uri: &str) -> Result<Asset> {
        let parsed = DataUri::parse(uri).ok_or_else(|| PiecesError::AssetLoad {
            source_name: "data URI".into(),
            reason: "missing `,` separator".into(),
        })?;

        let bytes = if parsed.base64 {
            let compact: String = parsed.payload.split_ascii_whitespace().collect();
            STANDARD
                .decode(compact)
                .map_err(|e| PiecesError::AssetLoad {
                    source_name: format!("data:{}", parsed.mime),
                    reason: e.to_string(),
                })?
        } else {
            parsed.payload.as_bytes().to_vec()
        };

        if parsed.is_svg() {
            let markup = String::from_utf8(bytes).map_err(|e| PiecesError::AssetLoad {
                source_name: "data:image/svg+xml".into(),
                reason: e.to_string(),
            })?;
            Asset::from_svg(&markup)
        } else {
            Asset::decode(&bytes)
        }
    }

    fn load_file(&self, path: &Path) -> Result<Asset> {
        let path = self.resolve_path(path);
        let is_svg = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));

        if is_svg {
            Asset::from_svg(&std::fs::read_to_string(&path)?)
        } else {
            Asset::decode(&std::fs::read(&path)?)
        }
    }
}

impl AssetLoader for FileAssetLoader {
    fn load(&self, source: &AssetSource) -> Result<Asset> {
        debug!(source = %source, "loading asset");

        match source {
            AssetSource::DataUri(uri) => self.load_data_uri(uri),
            AssetSource::Svg(markup) => Asset::from_svg(markup),
            AssetSource::Emoji(emoji) => {
                let markup = svg::resolve_emoji(emoji).ok_or_else(|| PiecesError::AssetLoad {
                    source_name: format!("emoji {emoji}"),
                    reason: "emoji is not available".into(),
                })?;
                Asset::from_svg(markup)
            }
            AssetSource::Url(url) => Err(PiecesError::UnsupportedAssetSource(url.clone())),
            AssetSource::Path(path) => self.load_file(path),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        Asset::from_image(img.clone()).unwrap().to_png().unwrap()
    }

    #[test]
    fn loads_bundled_sprite() {
        let asset = FileAssetLoader::new().load(&AssetSource::bundled()).unwrap();
        assert_eq!((asset.width(), asset.height()), (32, 32));
        assert_eq!(asset.pixmap().width(), 32);
    }

    #[test]
    fn loads_base64_png_data_uri() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(&img)));

        let asset = FileAssetLoader::new().load(&AssetSource::from(uri)).unwrap();
        assert_eq!(asset.image(), &img);
    }

    #[test]
    fn loads_plain_svg_data_uri() {
        let uri = r##"data:image/svg+xml,<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"><rect width="4" height="4" fill="#ff0000"/></svg>"##;
        let asset = FileAssetLoader::new().load(&AssetSource::from(uri)).unwrap();
        assert_eq!(asset.image().get_pixel(1, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn loads_file_relative_to_base_dir() {
        let dir = std::env::temp_dir().join(format!("pieces-asset-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 255]));
        std::fs::write(dir.join("dot.png"), png_bytes(&img)).unwrap();

        let loader = FileAssetLoader::with_base_dir(&dir);
        let asset = loader.load(&AssetSource::from("dot.png")).unwrap();
        assert_eq!(asset.image(), &img);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn remote_urls_are_rejected() {
        let err = FileAssetLoader::new()
            .load(&AssetSource::from("https://example.com/spark.png"))
            .unwrap_err();
        assert!(matches!(err, PiecesError::UnsupportedAssetSource(_)));
    }

    #[test]
    fn corrupt_payload_is_an_error() {
        let err = FileAssetLoader::new()
            .load(&AssetSource::from("data:image/png;base64,AAAA"))
            .unwrap_err();
        assert!(matches!(err, PiecesError::AssetDecode(_)));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = FileAssetLoader::new()
            .load(&AssetSource::from("/definitely/not/here.png"))
            .unwrap_err();
        assert!(matches!(err, PiecesError::Io(_)));
    }

    #[test]
    fn load_asset_calls_back_only_on_success() {
        let mut called = false;
        load_asset(&FileAssetLoader::new(), &AssetSource::bundled(), |_| called = true).unwrap();
        assert!(called);

        let mut called = false;
        let result = load_asset(
            &FileAssetLoader::new(),
            &AssetSource::from("https://example.com/x.png"),
            |_| called = true,
        );
        assert!(result.is_err());
        assert!(!called);
    }

    #[test]
    fn into_image_returns_straight_pixels() {
        let img = RgbaImage::from_pixel(2, 1, Rgba([40, 80, 120, 128]));
        let asset = Asset::from_image(img.clone()).unwrap();
        assert_eq!(asset.into_image(), img);
    }

    #[test]
    fn empty_image_is_rejected() {
        assert!(matches!(
            Asset::from_image(RgbaImage::new(0, 0)),
            Err(PiecesError::EmptyAsset)
        ));
    }
}
