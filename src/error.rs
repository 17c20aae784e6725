//! Error type shared by every fallible operation in the crate.

use thiserror::Error;

/// Errors produced while configuring, loading or driving an emitter.
#[derive(Debug, Error)]
pub enum PiecesError {
    /// The `render` selector names no registered render engine.
    #[error("no render engine registered under `{0}`")]
    UnknownRenderEngine(String),

    /// The `particleName` selector names no registered particle kind.
    #[error("no particle kind registered under `{0}`")]
    UnknownParticleKind(String),

    /// The asset source could be read but not turned into an image.
    #[error("failed to load asset `{source_name}`: {reason}")]
    AssetLoad { source_name: String, reason: String },

    /// The asset bytes are not a decodable raster image.
    #[error("failed to decode asset: {0}")]
    AssetDecode(#[source] image::ImageError),

    /// The decoded image has no pixels to draw.
    #[error("asset image has zero width or height")]
    EmptyAsset,

    /// SVG markup could not be parsed or rasterized.
    #[error("failed to rasterize SVG: {0}")]
    Svg(String),

    /// The asset source uses a scheme this loader cannot fetch.
    #[error("unsupported asset source `{0}`")]
    UnsupportedAssetSource(String),

    /// The frame loop was started before the asset finished preparing.
    #[error("emitter asset has not been prepared")]
    AssetNotReady,

    /// The drawable surface could not be allocated at the requested size.
    #[error("cannot allocate a {width}x{height} render surface")]
    SurfaceAllocation { width: u32, height: u32 },

    /// A frame rate that is zero, negative or not finite.
    #[error("frame rate must be a positive finite number, got {0}")]
    InvalidFrameRate(f64),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PiecesError>;
