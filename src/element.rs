//! Binding an emitter's spawn point to a page element.
//!
//! [`EmitterElement`] reads the element's layout box through a
//! [`LayoutSource`] and keeps the emitter's position at the element's
//! top-left corner, relative to the document body. The host calls
//! [`on_element_changed`](EmitterElement::on_element_changed) whenever the
//! element's attributes or content change, or forwards those notifications
//! over a channel and lets [`sync`](EmitterElement::sync) drain them.

use crossbeam_channel::Receiver;
use tracing::debug;

use crate::config::EmitterConfig;
use crate::emitter::Emitter;
use crate::error::Result;
use crate::registry::Registry;
use crate::surface::Viewport;

/// A layout box in viewport coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayoutRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutRect {
    pub const fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }
}

/// An element's offset from the document body.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementPosition {
    pub top: f64,
    pub left: f64,
}

/// Where the bound element and the document body currently are.
pub trait LayoutSource {
    /// The bound element's bounding box.
    fn element_rect(&self) -> LayoutRect;

    /// The document body's bounding box.
    fn body_rect(&self) -> LayoutRect;
}

/// An emitter that follows an element.
#[derive(Debug)]
pub struct EmitterElement<L> {
    element: L,
    emitter: Emitter,
}

impl<L: LayoutSource> EmitterElement<L> {
    /// Creates the emitter and moves it to the element.
    pub fn new(registry: &Registry, element: L, settings: EmitterConfig, viewport: &mut Viewport) -> Result<Self> {
        let emitter = Emitter::new(registry, settings, viewport)?;
        Ok(Self::bind(element, emitter))
    }

    /// Binds an existing emitter and moves it to the element.
    pub fn bind(element: L, emitter: Emitter) -> Self {
        let mut bound = Self { element, emitter };
        bound.on_element_changed();
        bound
    }

    /// The element's top-left corner relative to the body.
    pub fn position(&self) -> ElementPosition {
        let body = self.element.body_rect();
        let rect = self.element.element_rect();
        ElementPosition {
            top: rect.top - body.top,
            left: rect.left - body.left,
        }
    }

    /// Moves the emitter's spawn point to `position`.
    pub fn set_position(&mut self, position: ElementPosition) {
        self.emitter.set_position(position.left, position.top);
    }

    /// Re-reads the element's position and applies it.
    pub fn on_element_changed(&mut self) -> ElementPosition {
        let position = self.position();
        debug!(top = position.top, left = position.left, "element moved");
        self.set_position(position);
        position
    }

    /// Applies pending change notifications, collapsing any burst into a
    /// single re-read. Returns whether anything was pending.
    pub fn sync<T>(&mut self, changes: &Receiver<T>) -> bool {
        if changes.try_iter().count() == 0 {
            return false;
        }
        self.on_element_changed();
        true
    }

    pub fn element(&self) -> &L {
        &self.element
    }

    /// Mutable access to the layout source. Call
    /// [`on_element_changed`](Self::on_element_changed) afterwards to pick up
    /// any movement.
    pub fn element_mut(&mut self) -> &mut L {
        &mut self.element
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn emitter_mut(&mut self) -> &mut Emitter {
        &mut self.emitter
    }

    pub fn into_emitter(self) -> Emitter {
        self.emitter
    }
}
