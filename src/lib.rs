//! pieces: decorative sprite particles rendered onto a viewport overlay
//!
//! This crate spawns, animates and retires small sprites emitted from a
//! configurable point. The sprite can be recolored once up front by a chain
//! of pixel filters (colorize, desaturate, tint) before any particle uses it.
//!
//! # Example
//!
//! ```
//! use pieces::{
//!     EmitterConfig, Emitter, FileAssetLoader, FilterChain, FilterOptions,
//!     ManualClock, Registry, Viewport,
//! };
//!
//! let registry = Registry::with_defaults();
//! let mut viewport = Viewport::new(200, 200);
//!
//! let settings = EmitterConfig {
//!     position_x: 100.0,
//!     position_y: 180.0,
//!     velocity_y: -2.0,
//!     filters: FilterChain::new().with("tint", FilterOptions::colors([255.0, 80.0, 0.0])),
//!     seed: Some(42),
//!     ..EmitterConfig::default()
//! };
//!
//! let mut emitter = Emitter::new(&registry, settings, &mut viewport).unwrap();
//! emitter.prepare_asset(&registry, &FileAssetLoader::new()).unwrap();
//! emitter.run_frames(&mut ManualClock::from_fps(60.0).unwrap(), 120).unwrap();
//!
//! let frame = emitter.surface().snapshot().unwrap();
//! assert_eq!(frame.dimensions(), (200, 200));
//! ```
//!
//! # Configuration as JSON
//!
//! Settings use the same camelCase keys in JSON. Missing keys keep their
//! defaults, and `filters` merges per filter name:
//!
//! ```
//! use pieces::{ConfigPatch, EmitterConfig};
//!
//! let patch = ConfigPatch::from_json(r#"{
//!     "spawnInterval": 80,
//!     "filters": { "desaturate": {} }
//! }"#).unwrap();
//!
//! let settings = EmitterConfig::from_patch(patch);
//! assert_eq!(settings.spawn_interval, 80.0);
//! assert_eq!(settings.max_life_time, 5000.0);
//! assert!(settings.filters.get("desaturate").is_some());
//! ```

mod asset;
mod clock;
mod config;
mod element;
mod emitter;
mod error;
mod filter;
mod particle;
pub mod raster;
mod registry;
mod surface;

pub use asset::svg::render_svg;
pub use asset::{Asset, AssetLoader, AssetSource, FileAssetLoader, load_asset};
pub use clock::{FrameClock, ManualClock, StopToken, SystemClock};
pub use config::{ConfigPatch, EmitterConfig, FilterChain, FilterOptions};
pub use element::{ElementPosition, EmitterElement, LayoutRect, LayoutSource};
pub use emitter::{Emitter, ParticleId};
pub use error::{PiecesError, Result};
pub use filter::{
    BuiltinFilter, FilterRegistry, PixelFilter, apply_filters, colorize, desaturate,
    register_builtin_filters, rgbk_layers, tint,
};
pub use particle::{ParticleFactory, ParticleState, StandardParticle, Tickable};
pub use registry::{NameRegistry, Registry};
pub use surface::{CanvasSurface, RenderEngineFactory, RenderSurface, Viewport, ViewportSize};
