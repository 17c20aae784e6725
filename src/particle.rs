//! Particle kinematics.
//!
//! A particle is spawned from a snapshot of its emitter's settings and then
//! advanced once per frame until it dies. It has two states: alive and dead,
//! and dead is terminal.

use std::f64::consts::PI;
use std::sync::Arc;

use fastrand::Rng;

use crate::asset::Asset;
use crate::config::EmitterConfig;

/// Creates a particle kind: `(settings, asset, now_ms, rng)`.
pub type ParticleFactory =
    fn(&EmitterConfig, Option<Arc<Asset>>, f64, &mut Rng) -> Box<dyn Tickable>;

// ============================================================================
// Particle State
// ============================================================================

/// The drawable state every particle kind exposes.
///
/// Angles are in the particle's own units (`angle`) and radians (`rotation`);
/// times are milliseconds.
#[derive(Debug, Clone, Default)]
pub struct ParticleState {
    pub position_x: f64,
    pub position_y: f64,
    pub velocity_x: f64,
    pub velocity_y: f64,
    pub size: f64,
    pub opacity: f64,
    pub angle: f64,
    /// Rotation applied when drawing, in radians.
    pub rotation: f64,
    /// Milliseconds since `start_life`, as of the last tick.
    pub life_time: f64,
    pub start_life: f64,
    /// The sprite this particle draws.
    pub asset: Option<Arc<Asset>>,
}

/// A particle kind the emitter can drive.
pub trait Tickable {
    /// Advances the particle to `now` (milliseconds).
    fn tick(&mut self, now: f64);

    /// Whether the particle should be removed instead of ticked.
    fn is_dead(&self) -> bool;

    /// The state the render surface draws from.
    fn state(&self) -> &ParticleState;
}

// ============================================================================
// Standard Particle
// ============================================================================

/// The default particle kind: drifts with a fixed velocity while it grows,
/// fades and spins over its lifetime.
#[derive(Debug, Clone)]
pub struct StandardParticle {
    pub state: ParticleState,
    pub max_life_time: f64,
    pub start_size: f64,
    pub end_size: f64,
    pub grow_factor: f64,
    pub rotation_speed: f64,
    pub rotation_angle_span: f64,
    pub start_opacity: f64,
    pub opacity_decline_speed: f64,
}

impl StandardParticle {
    /// Registry name of this kind.
    pub const NAME: &'static str = "standard";

    /// Spawns a particle from the emitter's current settings.
    ///
    /// The angle is drawn uniformly from `[0, 359)`. Vertical velocity is
    /// jittered by subtracting `random * velocityYRandomFactor`; horizontal
    /// velocity is replaced by `random * velocityXRandomFactor / velocityX`.
    /// A `velocityX` of zero therefore yields a non-finite velocity, which is
    /// passed through as is.
    pub fn new(config: &EmitterConfig, asset: Option<Arc<Asset>>, now: f64, rng: &mut Rng) -> Self {
        let angle = rng.f64() * 359.0;
        let velocity_y = config.velocity_y - rng.f64() * config.velocity_y_random_factor;
        let velocity_x = rng.f64() * config.velocity_x_random_factor / config.velocity_x;

        Self {
            state: ParticleState {
                position_x: config.position_x,
                position_y: config.position_y,
                velocity_x,
                velocity_y,
                size: config.size,
                opacity: config.start_opacity,
                angle,
                rotation: angle / config.rotation_angle_span * PI,
                life_time: config.life_time,
                start_life: now,
                asset,
            },
            max_life_time: config.max_life_time,
            start_size: config.start_size,
            end_size: config.end_size,
            grow_factor: config.grow_factor,
            rotation_speed: config.rotation_speed,
            rotation_angle_span: config.rotation_angle_span,
            start_opacity: config.start_opacity,
            opacity_decline_speed: config.opacity_decline_speed,
        }
    }

    /// [`ParticleFactory`] for this kind.
    pub fn spawn(
        config: &EmitterConfig,
        asset: Option<Arc<Asset>>,
        now: f64,
        rng: &mut Rng,
    ) -> Box<dyn Tickable> {
        Box::new(Self::new(config, asset, now, rng))
    }

    /// Elapsed life on a 0-100 scale. Not clamped.
    pub fn life_percent(&self) -> f64 {
        self.state.life_time / self.max_life_time * 100.0
    }
}

impl Tickable for StandardParticle {
    fn tick(&mut self, now: f64) {
        let state = &mut self.state;

        state.life_time = now - state.start_life;
        state.angle += self.rotation_speed;

        let life_percent = state.life_time / self.max_life_time * 100.0;

        state.size =
            self.start_size + (self.end_size - self.start_size) * life_percent * self.grow_factor;

        let opacity = self.start_opacity - life_percent * self.opacity_decline_speed;
        state.opacity = if opacity.is_nan() { opacity } else { opacity.max(0.0) };

        state.rotation = state.angle / self.rotation_angle_span * PI;

        state.position_x += state.velocity_x;
        state.position_y += state.velocity_y;
    }

    fn is_dead(&self) -> bool {
        self.state.position_y < -self.state.size || self.state.life_time > self.max_life_time
    }

    fn state(&self) -> &ParticleState {
        &self.state
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn still_config() -> EmitterConfig {
        EmitterConfig {
            velocity_x_random_factor: 0.0,
            velocity_y_random_factor: 0.0,
            ..EmitterConfig::default()
        }
    }

    #[test]
    fn spawn_copies_settings() {
        let config = EmitterConfig {
            position_x: 12.0,
            position_y: 34.0,
            start_opacity: 0.8,
            ..EmitterConfig::default()
        };
        let p = StandardParticle::new(&config, None, 500.0, &mut Rng::with_seed(1));
        assert_eq!(p.state.position_x, 12.0);
        assert_eq!(p.state.position_y, 34.0);
        assert_eq!(p.state.start_life, 500.0);
        assert_eq!(p.state.opacity, 0.8);
        assert_eq!(p.max_life_time, 5000.0);
    }

    #[test]
    fn spawn_randomizes_angle_and_velocity() {
        let config = EmitterConfig::default();
        let mut rng = Rng::with_seed(7);
        for _ in 0..100 {
            let p = StandardParticle::new(&config, None, 0.0, &mut rng);
            assert!((0.0..359.0).contains(&p.state.angle));
            // velocityY - random * 3
            assert!(p.state.velocity_y <= 1.0 && p.state.velocity_y > -2.0);
            // random * 0.5 / 1
            assert!((0.0..0.5).contains(&p.state.velocity_x));
        }
    }

    #[test]
    fn horizontal_jitter_divides_by_velocity() {
        let config = EmitterConfig {
            velocity_x: 4.0,
            velocity_x_random_factor: 2.0,
            ..EmitterConfig::default()
        };
        let mut rng = Rng::with_seed(3);
        for _ in 0..50 {
            let p = StandardParticle::new(&config, None, 0.0, &mut rng);
            assert!((0.0..0.5).contains(&p.state.velocity_x));
        }
    }

    #[test]
    fn zero_horizontal_velocity_is_not_finite() {
        let config = EmitterConfig {
            velocity_x: 0.0,
            ..EmitterConfig::default()
        };
        let mut p = StandardParticle::new(&config, None, 0.0, &mut Rng::with_seed(9));
        assert!(!p.state.velocity_x.is_finite());
        p.tick(16.0);
        assert!(!p.state.position_x.is_finite());
    }

    #[test]
    fn tick_follows_life_curve() {
        let config = EmitterConfig {
            start_size: 30.0,
            end_size: 70.0,
            grow_factor: 0.1,
            max_life_time: 5000.0,
            start_opacity: 1.0,
            opacity_decline_speed: 0.01,
            ..still_config()
        };
        let mut p = StandardParticle::new(&config, None, 0.0, &mut Rng::with_seed(5));
        p.tick(2500.0);

        assert_eq!(p.state.life_time, 2500.0);
        assert!((p.life_percent() - 50.0).abs() < 1e-9);
        assert!((p.state.size - 230.0).abs() < 1e-9);
        assert!((p.state.opacity - 0.5).abs() < 1e-9);
    }

    #[test]
    fn opacity_floors_at_zero() {
        let config = EmitterConfig {
            opacity_decline_speed: 1.0,
            ..still_config()
        };
        let mut p = StandardParticle::new(&config, None, 0.0, &mut Rng::with_seed(5));
        p.tick(4000.0);
        assert_eq!(p.state.opacity, 0.0);
    }

    #[test]
    fn rotation_tracks_angle() {
        let config = EmitterConfig {
            rotation_speed: 10.0,
            rotation_angle_span: 180.0,
            ..still_config()
        };
        let mut p = StandardParticle::new(&config, None, 0.0, &mut Rng::with_seed(11));
        let start = p.state.angle;
        p.tick(16.0);
        p.tick(32.0);
        assert!((p.state.angle - (start + 20.0)).abs() < 1e-9);
        assert!((p.state.rotation - p.state.angle / 180.0 * PI).abs() < 1e-12);
    }

    #[test]
    fn position_advances_by_velocity_each_tick() {
        let mut p = StandardParticle::new(&still_config(), None, 0.0, &mut Rng::with_seed(2));
        p.state.velocity_x = 2.0;
        p.state.velocity_y = 3.0;
        for frame in 1..=5 {
            p.tick(frame as f64 * 16.0);
        }
        assert_eq!(p.state.position_x, 10.0);
        assert_eq!(p.state.position_y, 15.0);
    }

    #[test]
    fn dies_after_max_life_time() {
        let config = EmitterConfig {
            max_life_time: 1000.0,
            ..still_config()
        };
        let mut p = StandardParticle::new(&config, None, 0.0, &mut Rng::with_seed(4));
        p.tick(1000.0);
        assert!(!p.is_dead(), "exactly max life is still alive");
        p.tick(1001.0);
        assert!(p.is_dead());
    }

    #[test]
    fn dies_when_above_the_top_edge() {
        let config = EmitterConfig {
            max_life_time: 1000.0,
            ..still_config()
        };
        let mut p = StandardParticle::new(&config, None, 0.0, &mut Rng::with_seed(4));
        p.state.velocity_y = -100.0;
        p.tick(10.0);
        // size is about 30 here, position is -100
        assert!(p.state.life_time < 1000.0);
        assert!(p.is_dead());
    }

    #[test]
    fn factory_boxes_standard_particle() {
        let config = EmitterConfig::default();
        let particle = StandardParticle::spawn(&config, None, 42.0, &mut Rng::with_seed(0));
        assert_eq!(particle.state().start_life, 42.0);
        assert!(!particle.is_dead());
    }
}
