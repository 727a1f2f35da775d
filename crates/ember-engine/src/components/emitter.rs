use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::extensions::easing::Easing;
use crate::renderer::surface::BlendMode;
use crate::systems::effects::Rgb;

/// How the emitter releases particles on its own during `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmissionMode {
    /// Emit `spawn_rate` particles per second, carrying fractional remainders.
    #[default]
    Continuous,
    /// Every `burst_interval` seconds, roll `burst_chance` and emit `burst_count`.
    Burst,
}

/// Rasterized particle shape. `size` is the side length or the diameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParticleShape {
    #[default]
    Rectangle,
    Circle,
}

/// Which axes a sinusoidal sway is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OscillationAxis {
    X,
    #[default]
    Y,
    Both,
}

/// Ranges sampled once per particle to build its sway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscillationConfig {
    pub axis: OscillationAxis,
    /// Offset amplitude in pixels.
    pub amplitude_range: (f32, f32),
    /// Angular frequency in radians per second of particle age.
    pub frequency_range: (f32, f32),
    /// Phase offset in radians.
    pub phase_range: (f32, f32),
}

impl Default for OscillationConfig {
    fn default() -> Self {
        Self {
            axis: OscillationAxis::Y,
            amplitude_range: (4.0, 8.0),
            frequency_range: (0.3, 0.6),
            phase_range: (0.6, TAU),
        }
    }
}

/// What happens to particles that leave the room set by
/// `ParticleEmitter::set_room_dimensions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoundsPolicy {
    /// Particles may leave the room freely.
    #[default]
    None,
    /// Particles outside the room are retired.
    Clip,
    /// Particles re-enter from the opposite edge.
    Wrap,
}

/// Draw order of live particles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderOrder {
    /// Spawn order: oldest first, newest on top.
    #[default]
    Forward,
    /// Newest first, oldest on top.
    Reverse,
}

/// Tunable emitter parameters. Every `(min, max)` range is sampled uniformly
/// per particle at spawn time. Omitted JSON fields take the `Default` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Emission mode (continuous or burst).
    pub mode: EmissionMode,
    /// Particles per second (Continuous mode). 0 disables auto-spawning.
    pub spawn_rate: f32,
    /// Particles per burst (Burst mode).
    pub burst_count: u32,
    /// Seconds between burst attempts.
    pub burst_interval: f32,
    /// Percent chance (0-100) that a burst attempt fires.
    pub burst_chance: f32,
    /// Hard cap on live particles.
    pub max_pool_size: usize,
    /// Particle lifetime in seconds.
    pub lifetime_range: (f32, f32),
    pub size_start_range: (f32, f32),
    pub size_end_range: (f32, f32),
    pub color_start_range: (Rgb, Rgb),
    pub color_end_range: (Rgb, Rgb),
    pub alpha_start_range: (f32, f32),
    pub alpha_end_range: (f32, f32),
    pub shape: ParticleShape,
    pub glow: bool,
    /// Glow halo width in pixels (only used when `glow` is set).
    pub glow_radius_range: (f32, f32),
    /// Horizontal velocity in pixels per second.
    pub velocity_x_range: (f32, f32),
    /// Vertical velocity in pixels per second.
    pub velocity_y_range: (f32, f32),
    /// Flip the sampled horizontal velocity with 50% probability.
    pub random_x_dir: bool,
    /// Flip the sampled vertical velocity with 50% probability.
    pub random_y_dir: bool,
    /// Constant acceleration in pixels per second squared.
    pub gravity: Vec2,
    pub oscillation: Option<OscillationConfig>,
    /// Curve applied to normalized age before size/colour/alpha interpolation.
    pub easing: Easing,
    pub bounds_policy: BoundsPolicy,
    pub render_order: RenderOrder,
    pub blend_mode: BlendMode,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            mode: EmissionMode::Continuous,
            spawn_rate: 0.0,
            burst_count: 8,
            burst_interval: 1.0,
            burst_chance: 100.0,
            max_pool_size: EmitterConfig::DEFAULT_MAX_POOL_SIZE,
            lifetime_range: (1.0, 1.0),
            size_start_range: (4.0, 4.0),
            size_end_range: (4.0, 4.0),
            color_start_range: (Rgb::WHITE, Rgb::WHITE),
            color_end_range: (Rgb::WHITE, Rgb::WHITE),
            alpha_start_range: (255.0, 255.0),
            alpha_end_range: (255.0, 255.0),
            shape: ParticleShape::Rectangle,
            glow: false,
            glow_radius_range: (0.0, 0.0),
            velocity_x_range: (0.0, 0.0),
            velocity_y_range: (0.0, 0.0),
            random_x_dir: false,
            random_y_dir: false,
            gravity: Vec2::ZERO,
            oscillation: None,
            easing: Easing::Linear,
            bounds_policy: BoundsPolicy::None,
            render_order: RenderOrder::Forward,
            blend_mode: BlendMode::Alpha,
        }
    }
}

/// Swap an inverted range and zero out non-finite ends.
fn sorted((a, b): (f32, f32)) -> (f32, f32) {
    let a = if a.is_finite() { a } else { 0.0 };
    let b = if b.is_finite() { b } else { 0.0 };
    if a <= b { (a, b) } else { (b, a) }
}

fn clamped((a, b): (f32, f32), lo: f32, hi: f32) -> (f32, f32) {
    (a.clamp(lo, hi), b.clamp(lo, hi))
}

fn non_negative(v: f32) -> f32 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

impl EmitterConfig {
    pub const DEFAULT_MAX_POOL_SIZE: usize = 1024;
    /// Shortest lifetime a particle can be given.
    pub const MIN_LIFETIME: f32 = 1.0e-3;

    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the config to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Fast, glowing sparks that fall under gravity and fade out.
    pub fn spark() -> Self {
        Self::new()
            .with_rate(120.0)
            .with_max_pool_size(512)
            .with_lifetime(0.4, 0.9)
            .with_size(3.0, 5.0, 1.0, 1.0)
            .with_colors((Rgb::new(255, 240, 160), Rgb::new(255, 200, 80)), (Rgb::new(200, 40, 0), Rgb::new(120, 20, 0)))
            .with_alpha((255.0, 255.0), (0.0, 0.0))
            .with_shape(ParticleShape::Circle)
            .with_glow(2.0, 4.0)
            .with_velocity((40.0, 160.0), (-220.0, -80.0))
            .with_random_dir(true, false)
            .with_gravity(Vec2::new(0.0, 400.0))
            .with_easing(Easing::QuadOut)
            .with_blend_mode(BlendMode::Additive)
    }

    /// A stream of particles drifting left with a slow vertical sway, bursting
    /// ten at a time on a 40% chance every 100 ms.
    pub fn rain() -> Self {
        Self::new()
            .with_mode(EmissionMode::Burst)
            .with_burst(10, 0.1, 40.0)
            .with_lifetime(25.0, 25.0)
            .with_size(3.0, 3.0, 1.0, 1.0)
            .with_velocity((-150.0, -110.0), (0.0, 0.0))
            .with_oscillation(OscillationConfig::default())
            .with_easing(Easing::QuadIn)
            .with_bounds_policy(BoundsPolicy::Clip)
    }

    // -- Builder pattern --

    pub fn with_mode(mut self, mode: EmissionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.spawn_rate = rate;
        self
    }

    pub fn with_burst(mut self, count: u32, interval: f32, chance: f32) -> Self {
        self.burst_count = count;
        self.burst_interval = interval;
        self.burst_chance = chance;
        self
    }

    pub fn with_max_pool_size(mut self, max: usize) -> Self {
        self.max_pool_size = max;
        self
    }

    pub fn with_lifetime(mut self, min: f32, max: f32) -> Self {
        self.lifetime_range = (min, max);
        self
    }

    /// Start and end size ranges: `(start_min, start_max, end_min, end_max)`.
    pub fn with_size(mut self, start_min: f32, start_max: f32, end_min: f32, end_max: f32) -> Self {
        self.size_start_range = (start_min, start_max);
        self.size_end_range = (end_min, end_max);
        self
    }

    pub fn with_colors(mut self, start: (Rgb, Rgb), end: (Rgb, Rgb)) -> Self {
        self.color_start_range = start;
        self.color_end_range = end;
        self
    }

    pub fn with_alpha(mut self, start: (f32, f32), end: (f32, f32)) -> Self {
        self.alpha_start_range = start;
        self.alpha_end_range = end;
        self
    }

    pub fn with_shape(mut self, shape: ParticleShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_glow(mut self, min_radius: f32, max_radius: f32) -> Self {
        self.glow = true;
        self.glow_radius_range = (min_radius, max_radius);
        self
    }

    pub fn with_velocity(mut self, x: (f32, f32), y: (f32, f32)) -> Self {
        self.velocity_x_range = x;
        self.velocity_y_range = y;
        self
    }

    pub fn with_random_dir(mut self, x: bool, y: bool) -> Self {
        self.random_x_dir = x;
        self.random_y_dir = y;
        self
    }

    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_oscillation(mut self, oscillation: OscillationConfig) -> Self {
        self.oscillation = Some(oscillation);
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_bounds_policy(mut self, policy: BoundsPolicy) -> Self {
        self.bounds_policy = policy;
        self
    }

    pub fn with_render_order(mut self, order: RenderOrder) -> Self {
        self.render_order = order;
        self
    }

    pub fn with_blend_mode(mut self, mode: BlendMode) -> Self {
        self.blend_mode = mode;
        self
    }

    /// Repair out-of-range values instead of rejecting them: inverted ranges
    /// are swapped, alphas clamped to [0, 255], rates and radii made
    /// non-negative and finite, lifetimes kept above `MIN_LIFETIME`.
    pub fn normalized(mut self) -> Self {
        self.spawn_rate = non_negative(self.spawn_rate);
        self.burst_interval = non_negative(self.burst_interval);
        self.burst_chance = non_negative(self.burst_chance).min(100.0);

        self.lifetime_range = clamped(sorted(self.lifetime_range), Self::MIN_LIFETIME, f32::MAX);
        self.size_start_range = clamped(sorted(self.size_start_range), 0.0, f32::MAX);
        self.size_end_range = clamped(sorted(self.size_end_range), 0.0, f32::MAX);
        self.alpha_start_range = clamped(sorted(self.alpha_start_range), 0.0, 255.0);
        self.alpha_end_range = clamped(sorted(self.alpha_end_range), 0.0, 255.0);
        self.glow_radius_range = clamped(sorted(self.glow_radius_range), 0.0, f32::MAX);
        self.velocity_x_range = sorted(self.velocity_x_range);
        self.velocity_y_range = sorted(self.velocity_y_range);

        if !self.gravity.is_finite() {
            self.gravity = Vec2::ZERO;
        }
        if let Some(osc) = self.oscillation.as_mut() {
            osc.amplitude_range = sorted(osc.amplitude_range);
            osc.frequency_range = sorted(osc.frequency_range);
            osc.phase_range = sorted(osc.phase_range);
        }
        self
    }
}
