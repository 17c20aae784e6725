//! Render surfaces and the viewport they track.
//!
//! A render surface is the full-viewport drawing target an emitter owns. It
//! is cleared at the start of every frame and then receives one
//! [`render`](RenderSurface::render) call per live particle. Surfaces never
//! take pointer input; they sit above the page purely as an overlay.
//!
//! The [`Viewport`] broadcasts size changes to every surface subscribed to
//! it. Surfaces apply the latest pending size at their next
//! [`on_tick`](RenderSurface::on_tick), so a resize always lands between
//! frames.

mod canvas;

pub use canvas::CanvasSurface;

use crossbeam_channel::{Receiver, Sender, unbounded};
use image::RgbaImage;
use tracing::debug;

use crate::config::EmitterConfig;
use crate::error::Result;
use crate::particle::ParticleState;

/// Creates a render engine: `(settings, viewport)`.
pub type RenderEngineFactory = fn(&EmitterConfig, &mut Viewport) -> Result<Box<dyn RenderSurface>>;

// ============================================================================
// Render Surface
// ============================================================================

/// A drawing target driven once per frame.
pub trait RenderSurface {
    /// Prepares the surface for a new frame: applies any pending resize and
    /// clears every pixel.
    fn on_tick(&mut self);

    /// Draws one particle's sprite using the particle's own transform and
    /// opacity. No drawing state carries over to the next call.
    fn render(&mut self, particle: &ParticleState);

    /// Releases the drawable and stops listening for resizes.
    fn destroy(&mut self);

    /// Current drawable size.
    fn size(&self) -> ViewportSize;

    /// Stacking order of the overlay.
    fn z_index(&self) -> i32;

    /// Whether the surface captures pointer input. Overlays never do.
    fn intercepts_pointer(&self) -> bool {
        false
    }

    /// A copy of the current frame, if the surface keeps pixels in memory.
    fn snapshot(&self) -> Option<RgbaImage> {
        None
    }
}

// ============================================================================
// Viewport
// ============================================================================

/// Width and height of the viewport in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// The window surfaces cover, and the source of resize notifications.
#[derive(Debug)]
pub struct Viewport {
    size: ViewportSize,
    subscribers: Vec<Sender<ViewportSize>>,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: ViewportSize::new(width, height),
            subscribers: Vec::new(),
        }
    }

    pub fn size(&self) -> ViewportSize {
        self.size
    }

    /// Registers a listener for future size changes.
    pub fn subscribe(&mut self) -> Receiver<ViewportSize> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Changes the viewport size and notifies subscribers.
    ///
    /// Subscribers whose receiving end was dropped are forgotten. Returns the
    /// number of subscribers notified.
    pub fn resize(&mut self, width: u32, height: u32) -> usize {
        let size = ViewportSize::new(width, height);
        self.size = size;
        self.subscribers.retain(|tx| tx.send(size).is_ok());
        debug!(width, height, listeners = self.subscribers.len(), "viewport resized");
        self.subscribers.len()
    }

    /// Number of live subscribers, as of the last resize.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_broadcasts_to_subscribers() {
        let mut viewport = Viewport::new(100, 50);
        let a = viewport.subscribe();
        let b = viewport.subscribe();

        assert_eq!(viewport.resize(200, 80), 2);
        assert_eq!(viewport.size(), ViewportSize::new(200, 80));
        assert_eq!(a.try_recv().unwrap(), ViewportSize::new(200, 80));
        assert_eq!(b.try_recv().unwrap(), ViewportSize::new(200, 80));
    }

    #[test]
    fn dropped_subscribers_are_forgotten() {
        let mut viewport = Viewport::new(10, 10);
        let kept = viewport.subscribe();
        drop(viewport.subscribe());
        assert_eq!(viewport.subscriber_count(), 2);

        assert_eq!(viewport.resize(20, 20), 1);
        assert_eq!(viewport.subscriber_count(), 1);
        assert!(kept.try_recv().is_ok());
    }
}
