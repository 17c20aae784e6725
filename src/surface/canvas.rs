//! The default render engine: an in-memory RGBA canvas covering the viewport.

use crossbeam_channel::Receiver;
use image::RgbaImage;
use resvg::tiny_skia::{BlendMode, Color, FilterQuality, Pixmap, PixmapPaint, Transform};
use tracing::debug;

use super::{RenderSurface, Viewport, ViewportSize};
use crate::config::EmitterConfig;
use crate::error::{PiecesError, Result};
use crate::particle::ParticleState;
use crate::raster::pixmap_to_rgba_image;

// ============================================================================
// CanvasSurface
// ============================================================================

/// A full-viewport drawable backed by a [`Pixmap`].
///
/// Each sprite is drawn centered on the particle position, rotated by the
/// particle's rotation and scaled to `size x size`. The transform and alpha
/// are built per call, so nothing leaks between particles.
#[derive(Debug)]
pub struct CanvasSurface {
    pixmap: Option<Pixmap>,
    size: ViewportSize,
    z_index: i32,
    resizes: Option<Receiver<ViewportSize>>,
}

impl CanvasSurface {
    /// Registry name of this engine.
    pub const NAME: &'static str = "canvas";

    /// Creates a surface matching the viewport and subscribes to its resizes.
    pub fn new(viewport: &mut Viewport, z_index: i32) -> Result<Self> {
        let size = viewport.size();
        let pixmap = allocate(size)?;
        Ok(Self {
            pixmap: Some(pixmap),
            size,
            z_index,
            resizes: Some(viewport.subscribe()),
        })
    }

    /// [`RenderEngineFactory`](super::RenderEngineFactory) for this engine.
    pub fn create(config: &EmitterConfig, viewport: &mut Viewport) -> Result<Box<dyn RenderSurface>> {
        Ok(Box::new(Self::new(viewport, config.z_index)?))
    }

    /// Reallocates the drawable at `size`. The previous frame is discarded.
    pub fn resize(&mut self, size: ViewportSize) -> Result<()> {
        if self.pixmap.is_none() {
            return Ok(());
        }
        self.pixmap = Some(allocate(size)?);
        self.size = size;
        debug!(width = size.width, height = size.height, "canvas resized");
        Ok(())
    }

    pub fn is_destroyed(&self) -> bool {
        self.pixmap.is_none()
    }

    /// The drawable, until the surface is destroyed.
    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }

    fn apply_pending_resize(&mut self) {
        let Some(latest) = self.resizes.as_ref().and_then(|rx| rx.try_iter().last()) else {
            return;
        };
        if latest == self.size {
            return;
        }
        if let Err(err) = self.resize(latest) {
            debug!(%err, "keeping previous canvas size");
        }
    }
}

/// A pixmap at least one pixel in each dimension.
fn allocate(size: ViewportSize) -> Result<Pixmap> {
    Pixmap::new(size.width.max(1), size.height.max(1)).ok_or(PiecesError::SurfaceAllocation {
        width: size.width,
        height: size.height,
    })
}

/// Maps sprite pixel space onto the canvas for one particle.
fn sprite_transform(particle: &ParticleState, width: u32, height: u32) -> Transform {
    let (w, h) = (width as f32, height as f32);
    let size = particle.size as f32;

    Transform::from_translate(particle.position_x as f32, particle.position_y as f32)
        .pre_concat(Transform::from_rotate(particle.rotation.to_degrees() as f32))
        .pre_scale(size / w, size / h)
        .pre_translate(-w / 2.0, -h / 2.0)
}

impl RenderSurface for CanvasSurface {
    fn on_tick(&mut self) {
        self.apply_pending_resize();
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill(Color::TRANSPARENT);
        }
    }

    fn render(&mut self, particle: &ParticleState) {
        let (Some(pixmap), Some(asset)) = (self.pixmap.as_mut(), particle.asset.as_deref()) else {
            return;
        };
        if particle.size.is_nan() || particle.size <= 0.0 {
            return;
        }

        let transform = sprite_transform(particle, asset.width(), asset.height());
        if !transform.is_finite() {
            return;
        }

        let opacity = particle.opacity as f32;
        let paint = PixmapPaint {
            opacity: if opacity.is_nan() { 0.0 } else { opacity.clamp(0.0, 1.0) },
            blend_mode: BlendMode::SourceOver,
            quality: FilterQuality::Bilinear,
        };
        pixmap.draw_pixmap(0, 0, asset.pixmap().as_ref(), &paint, transform, None);
    }

    fn destroy(&mut self) {
        if self.pixmap.take().is_some() {
            debug!("canvas destroyed");
        }
        self.resizes = None;
    }

    fn size(&self) -> ViewportSize {
        self.size
    }

    fn z_index(&self) -> i32 {
        self.z_index
    }

    fn snapshot(&self) -> Option<RgbaImage> {
        self.pixmap.as_ref().map(pixmap_to_rgba_image)
    }
}

// ============================================================================
// Tests
// ============================================================================
