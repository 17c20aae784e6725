//! Pixel filters applied to the sprite before it is drawn.
//!
//! A filter is a pure raster-to-raster transform: it receives the running
//! buffer and the options configured under its name, and returns the buffer
//! the next filter will see. Filters are looked up by name in a
//! [`FilterRegistry`]; names with no registered filter are skipped.
//!
//! # Built-in Filters
//!
//! | Name         | Effect                                                   |
//! |--------------|----------------------------------------------------------|
//! | `colorize`   | Fills transparent areas with `colors` at `strength`      |
//! | `desaturate` | Replaces RGB with the mean of the three channels         |
//! | `tint`       | Rebuilds the image from red/green/blue/black layers      |
//!
//! # Example
//!
//! ```
//! use image::{Rgba, RgbaImage};
//! use pieces::{apply_filters, Asset, FilterChain, FilterOptions, Registry};
//!
//! let registry = Registry::with_defaults();
//! let sprite = Asset::from_image(RgbaImage::from_pixel(2, 2, Rgba([90, 120, 30, 255]))).unwrap();
//!
//! let chain = FilterChain::new().with("desaturate", FilterOptions::default());
//! let gray = apply_filters(&registry.filters, &sprite, &chain).unwrap();
//! assert_eq!(gray.image().get_pixel(0, 0).0, [80, 80, 80, 255]);
//! ```

pub mod colorize;
pub mod desaturate;
pub mod tint;

pub use colorize::colorize;
pub use desaturate::desaturate;
pub use tint::{rgbk_layers, tint};

use image::RgbaImage;
use tracing::debug;

use crate::asset::Asset;
use crate::config::{FilterChain, FilterOptions};
use crate::error::Result;
use crate::registry::NameRegistry;

// ============================================================================
// Filter Trait
// ============================================================================

/// A raster-to-raster transform usable in a [`FilterChain`].
///
/// Implementations must not retain state between calls. Closures with the
/// matching signature implement this trait, so ad-hoc filters can be
/// registered without a new type.
pub trait PixelFilter: Send + Sync {
    /// Transforms `buffer`, returning the buffer for the next filter.
    fn apply(&self, buffer: RgbaImage, options: &FilterOptions) -> RgbaImage;
}

impl<F> PixelFilter for F
where
    F: Fn(RgbaImage, &FilterOptions) -> RgbaImage + Send + Sync,
{
    fn apply(&self, buffer: RgbaImage, options: &FilterOptions) -> RgbaImage {
        self(buffer, options)
    }
}

/// Name-to-filter table consulted by [`apply_filters`].
pub type FilterRegistry = NameRegistry<Box<dyn PixelFilter>>;

// ============================================================================
// Built-in Filters
// ============================================================================

/// The filters shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFilter {
    Colorize,
    Desaturate,
    Tint,
}

impl BuiltinFilter {
    pub const ALL: [BuiltinFilter; 3] = [Self::Colorize, Self::Desaturate, Self::Tint];

    /// The name the filter is registered under.
    pub fn name(self) -> &'static str {
        match self {
            Self::Colorize => "colorize",
            Self::Desaturate => "desaturate",
            Self::Tint => "tint",
        }
    }
}

impl PixelFilter for BuiltinFilter {
    fn apply(&self, buffer: RgbaImage, options: &FilterOptions) -> RgbaImage {
        match self {
            Self::Colorize => colorize(&buffer, options),
            Self::Desaturate => desaturate(buffer),
            Self::Tint => tint(&buffer, options),
        }
    }
}

/// Registers every [`BuiltinFilter`] under its name.
pub fn register_builtin_filters(registry: &mut FilterRegistry) {
    for filter in BuiltinFilter::ALL {
        registry.register(filter.name(), Box::new(filter));
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Runs `chain` over the sprite, in order, and returns the filtered sprite.
///
/// Unregistered filter names are skipped without error.
pub fn apply_filters(filters: &FilterRegistry, asset: &Asset, chain: &FilterChain) -> Result<Asset> {
    let mut buffer = asset.image().clone();

    for (name, options) in chain.iter() {
        match filters.get(name) {
            Some(filter) => buffer = filter.apply(buffer, options),
            None => debug!(filter = name, "skipping unregistered filter"),
        }
    }

    Asset::from_image(buffer)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn registry() -> FilterRegistry {
        let mut registry = FilterRegistry::new();
        register_builtin_filters(&mut registry);
        registry
    }

    fn sprite(pixel: [u8; 4]) -> Asset {
        Asset::from_image(RgbaImage::from_pixel(2, 2, Rgba(pixel))).unwrap()
    }

    #[test]
    fn builtins_are_registered_by_name() {
        let registry = registry();
        for name in ["colorize", "desaturate", "tint"] {
            assert!(registry.get(name).is_some(), "{name} should be registered");
        }
    }

    #[test]
    fn empty_chain_is_identity() {
        let source = sprite([1, 2, 3, 4]);
        let out = apply_filters(&registry(), &source, &FilterChain::new()).unwrap();
        assert_eq!(out.image(), source.image());
    }

    #[test]
    fn unknown_filters_are_skipped() {
        let source = sprite([30, 60, 90, 255]);
        let chain = FilterChain::new()
            .with("blur", FilterOptions::default())
            .with("desaturate", FilterOptions::default())
            .with("sepia", FilterOptions::default());

        let out = apply_filters(&registry(), &source, &chain).unwrap();
        assert_eq!(out.image().get_pixel(0, 0).0, [60, 60, 60, 255]);
    }

    #[test]
    fn filters_run_in_chain_order() {
        let source = sprite([200, 100, 0, 255]);

        let tint_then_gray = FilterChain::new()
            .with("tint", FilterOptions::colors([255.0, 0.0, 0.0]))
            .with("desaturate", FilterOptions::default());
        let gray_then_tint = FilterChain::new()
            .with("desaturate", FilterOptions::default())
            .with("tint", FilterOptions::colors([255.0, 0.0, 0.0]));

        let a = apply_filters(&registry(), &source, &tint_then_gray).unwrap();
        let b = apply_filters(&registry(), &source, &gray_then_tint).unwrap();

        // tint keeps only red (200), then gray averages to 67
        assert_eq!(a.image().get_pixel(0, 0).0, [67, 67, 67, 255]);
        // gray gives 100 everywhere, then tint keeps only its red channel
        assert_eq!(b.image().get_pixel(0, 0).0, [100, 0, 0, 255]);
    }

    #[test]
    fn closures_can_be_registered() {
        let mut registry = registry();
        registry.register(
            "invert",
            Box::new(|mut buffer: RgbaImage, _: &FilterOptions| {
                for p in buffer.pixels_mut() {
                    p.0 = [255 - p[0], 255 - p[1], 255 - p[2], p[3]];
                }
                buffer
            }),
        );

        let chain = FilterChain::new().with("invert", FilterOptions::default());
        let out = apply_filters(&registry, &sprite([0, 10, 255, 255]), &chain).unwrap();
        assert_eq!(out.image().get_pixel(1, 1).0, [255, 245, 0, 255]);
    }
}
