//! Name-to-implementation tables.
//!
//! Emitters select their render engine, particle kind and filters by name.
//! A [`Registry`] holds the three tables and is built explicitly by whoever
//! composes the system, then borrowed wherever a lookup is needed.
//!
//! ```
//! use pieces::{EmitterConfig, Registry, StandardParticle};
//!
//! let mut registry = Registry::with_defaults();
//! registry.particles.register("drifting", StandardParticle::spawn);
//!
//! assert!(registry.render_engines.contains("canvas"));
//! assert!(registry.particles.contains("drifting"));
//! assert!(registry.filters.contains("tint"));
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::filter::{FilterRegistry, register_builtin_filters};
use crate::particle::{ParticleFactory, StandardParticle};
use crate::surface::{CanvasSurface, RenderEngineFactory};

/// A table mapping names to implementations.
pub struct NameRegistry<T> {
    entries: HashMap<String, T>,
}

impl<T> Default for NameRegistry<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> NameRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` under `name`, returning the entry it replaced.
    pub fn register(&mut self, name: impl Into<String>, value: T) -> Option<T> {
        self.entries.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> fmt::Debug for NameRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("NameRegistry").field("names", &names).finish()
    }
}

/// The three tables an emitter resolves names against.
#[derive(Debug, Default)]
pub struct Registry {
    /// Render engines, selected by `EmitterConfig::render`.
    pub render_engines: NameRegistry<RenderEngineFactory>,
    /// Particle kinds, selected by `EmitterConfig::particle_name`.
    pub particles: NameRegistry<ParticleFactory>,
    /// Pixel filters, selected by the keys of `EmitterConfig::filters`.
    pub filters: FilterRegistry,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the `canvas` engine, the `standard` particle and
    /// the `colorize`, `desaturate` and `tint` filters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .render_engines
            .register(CanvasSurface::NAME, CanvasSurface::create);
        registry
            .particles
            .register(StandardParticle::NAME, StandardParticle::spawn);
        register_builtin_filters(&mut registry.filters);
        registry
    }
}
