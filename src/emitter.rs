//! The emitter: spawn gating, the frame loop and particle bookkeeping.
//!
//! An [`Emitter`] owns its settings, one render surface and the live particle
//! collection. Each frame it clears the surface, walks the particles from the
//! newest to the oldest (removing dead ones, ticking and drawing the rest),
//! then attempts one spawn.
//!
//! # Example
//!
//! ```
//! use pieces::{ConfigPatch, Emitter, FileAssetLoader, ManualClock, Registry, Viewport};
//!
//! let registry = Registry::with_defaults();
//! let mut viewport = Viewport::new(320, 240);
//!
//! let patch = ConfigPatch::from_json(r#"{ "positionX": 160, "positionY": 200, "seed": 7 }"#).unwrap();
//! let mut emitter = Emitter::from_patch(&registry, patch, &mut viewport).unwrap();
//! emitter.prepare_asset(&registry, &FileAssetLoader::new()).unwrap();
//!
//! let frames = emitter.run_frames(&mut ManualClock::new(16.0), 30).unwrap();
//! assert_eq!(frames, 30);
//! assert!(emitter.particle_count() > 0);
//! ```

use std::fmt;
use std::mem;
use std::sync::Arc;

use fastrand::Rng;
use tracing::{debug, info, trace};

use crate::asset::{Asset, AssetLoader, load_asset};
use crate::clock::{FrameClock, StopToken};
use crate::config::{ConfigPatch, EmitterConfig};
use crate::error::{PiecesError, Result};
use crate::filter::apply_filters;
use crate::particle::{ParticleFactory, Tickable};
use crate::registry::Registry;
use crate::surface::{RenderSurface, Viewport};

/// Identity of a particle within its emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(u64);

struct LiveParticle {
    id: ParticleId,
    particle: Box<dyn Tickable>,
}

// ============================================================================
// Emitter
// ============================================================================

/// A single particle effect.
pub struct Emitter {
    settings: EmitterConfig,
    surface: Box<dyn RenderSurface>,
    spawn_particle: ParticleFactory,
    particles: Vec<LiveParticle>,
    last_spawn: Option<f64>,
    asset: Option<Arc<Asset>>,
    rng: Rng,
    next_id: u64,
    destroyed: bool,
}

impl Emitter {
    /// Creates an emitter and its render surface.
    ///
    /// Fails if `settings.render` or `settings.particle_name` is not
    /// registered, or if the surface cannot be allocated.
    pub fn new(registry: &Registry, settings: EmitterConfig, viewport: &mut Viewport) -> Result<Self> {
        let create_surface = *registry
            .render_engines
            .get(&settings.render)
            .ok_or_else(|| PiecesError::UnknownRenderEngine(settings.render.clone()))?;
        let spawn_particle = *registry
            .particles
            .get(&settings.particle_name)
            .ok_or_else(|| PiecesError::UnknownParticleKind(settings.particle_name.clone()))?;

        let surface = create_surface(&settings, viewport)?;
        let rng = settings.seed.map_or_else(Rng::new, Rng::with_seed);

        info!(
            render = %settings.render,
            particle = %settings.particle_name,
            width = surface.size().width,
            height = surface.size().height,
            "emitter created"
        );

        Ok(Self {
            settings,
            surface,
            spawn_particle,
            particles: Vec::new(),
            last_spawn: None,
            asset: None,
            rng,
            next_id: 0,
            destroyed: false,
        })
    }

    /// Creates an emitter from a partial configuration merged over the defaults.
    pub fn from_patch(registry: &Registry, patch: ConfigPatch, viewport: &mut Viewport) -> Result<Self> {
        Self::new(registry, EmitterConfig::from_patch(patch), viewport)
    }

    // ---- Asset ----

    /// Loads the configured image and runs the configured filters over it.
    ///
    /// On failure the emitter keeps its previous asset, if any.
    pub fn prepare_asset<L>(&mut self, registry: &Registry, loader: &L) -> Result<()>
    where
        L: AssetLoader + ?Sized,
    {
        let mut loaded = None;
        load_asset(loader, &self.settings.image, |asset| loaded = Some(asset))?;
        let Some(mut asset) = loaded else {
            return Err(PiecesError::AssetNotReady);
        };

        if !self.settings.filters.is_empty() {
            asset = apply_filters(&registry.filters, &asset, &self.settings.filters)?;
        }

        info!(
            source = %self.settings.image,
            width = asset.width(),
            height = asset.height(),
            filters = self.settings.filters.len(),
            "asset prepared"
        );
        self.set_asset(asset);
        Ok(())
    }

    /// Uses an already prepared sprite. Live particles keep drawing the
    /// sprite they were spawned with.
    pub fn set_asset(&mut self, asset: Asset) {
        self.asset = Some(Arc::new(asset));
    }

    pub fn asset(&self) -> Option<&Arc<Asset>> {
        self.asset.as_ref()
    }

    // ---- Frame Loop ----

    /// Runs one frame at `now` (milliseconds).
    pub fn frame(&mut self, now: f64) {
        if self.destroyed {
            return;
        }

        self.surface.on_tick();

        let mut index = self.particles.len();
        while index > 0 {
            index -= 1;
            let live = &mut self.particles[index];
            if live.particle.is_dead() {
                let id = live.id;
                self.remove_particle(id);
            } else {
                live.particle.tick(now);
                self.surface.render(live.particle.state());
            }
        }

        self.spawn(now);
    }

    /// Spawns one particle if the emitter is running and the spawn interval
    /// has elapsed. The first attempt always spawns.
    ///
    /// Returns whether a particle was spawned.
    pub fn spawn(&mut self, now: f64) -> bool {
        if self.settings.paused || self.destroyed {
            return false;
        }
        if let Some(last) = self.last_spawn {
            if now < last + self.settings.spawn_interval {
                return false;
            }
        }

        let particle = (self.spawn_particle)(&self.settings, self.asset.clone(), now, &mut self.rng);
        let id = ParticleId(self.next_id);
        self.next_id += 1;
        self.particles.push(LiveParticle { id, particle });
        self.last_spawn = Some(now);

        trace!(?id, now, live = self.particles.len(), "particle spawned");
        true
    }

    /// Runs frames until `token` is cancelled or the emitter is destroyed.
    ///
    /// Returns the number of frames run. Fails with
    /// [`PiecesError::AssetNotReady`] if no asset has been prepared.
    pub fn run<C>(&mut self, clock: &mut C, token: &StopToken) -> Result<u64>
    where
        C: FrameClock + ?Sized,
    {
        self.ensure_asset()?;

        let mut frames = 0;
        while !token.is_cancelled() && !self.destroyed {
            self.frame(clock.now());
            frames += 1;
            clock.next_frame();
        }
        debug!(frames, "frame loop stopped");
        Ok(frames)
    }

    /// Runs exactly `count` frames, or fewer if the emitter is destroyed.
    pub fn run_frames<C>(&mut self, clock: &mut C, count: u64) -> Result<u64>
    where
        C: FrameClock + ?Sized,
    {
        self.ensure_asset()?;

        let mut frames = 0;
        while frames < count && !self.destroyed {
            self.frame(clock.now());
            frames += 1;
            clock.next_frame();
        }
        Ok(frames)
    }

    fn ensure_asset(&self) -> Result<()> {
        if self.asset.is_none() {
            return Err(PiecesError::AssetNotReady);
        }
        Ok(())
    }

    // ---- Control ----

    /// Resumes spawning.
    pub fn start(&mut self) {
        self.settings.paused = false;
    }

    /// Suspends spawning. Live particles keep moving and drawing.
    pub fn stop(&mut self) {
        self.settings.paused = true;
    }

    pub fn is_paused(&self) -> bool {
        self.settings.paused
    }

    /// Releases the surface and drops every particle. Later frames and runs
    /// do nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.surface.destroy();
        self.particles.clear();
        self.destroyed = true;
        debug!("emitter destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // ---- Settings ----

    pub fn settings(&self) -> &EmitterConfig {
        &self.settings
    }

    /// Mutable settings. Changes apply to particles spawned afterwards.
    pub fn settings_mut(&mut self) -> &mut EmitterConfig {
        &mut self.settings
    }

    /// Merges `patch` into the current settings.
    pub fn apply_patch(&mut self, patch: ConfigPatch) {
        self.settings = mem::take(&mut self.settings).merge(patch);
    }

    /// Moves the spawn point.
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.settings.position_x = x;
        self.settings.position_y = y;
    }

    // ---- Particles ----

    /// Live particles, oldest first.
    pub fn particles(&self) -> impl Iterator<Item = (ParticleId, &dyn Tickable)> {
        self.particles.iter().map(|live| (live.id, live.particle.as_ref()))
    }

    pub fn particle(&self, id: ParticleId) -> Option<&dyn Tickable> {
        self.particles
            .iter()
            .find(|live| live.id == id)
            .map(|live| live.particle.as_ref())
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Removes a particle by identity, returning it if it was live.
    pub fn remove_particle(&mut self, id: ParticleId) -> Option<Box<dyn Tickable>> {
        let index = self.particles.iter().position(|live| live.id == id)?;
        trace!(?id, "particle removed");
        Some(self.particles.remove(index).particle)
    }

    pub fn surface(&self) -> &dyn RenderSurface {
        self.surface.as_ref()
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("render", &self.settings.render)
            .field("particle_name", &self.settings.particle_name)
            .field("paused", &self.settings.paused)
            .field("particles", &self.particles.len())
            .field("last_spawn", &self.last_spawn)
            .field("asset_ready", &self.asset.is_some())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
