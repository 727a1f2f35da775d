use glam::Vec2;

use crate::components::emitter::{BoundsPolicy, EmissionMode, EmitterConfig, RenderOrder};
use crate::renderer::surface::{BlendMode, Surface};
use crate::systems::effects::{sanitize_dt, Oscillation, Particle, Rgb, Rng};
use crate::systems::surface_cache::SurfaceCache;

/// Seed used by `ParticleEmitter::new`.
pub const DEFAULT_SEED: u64 = 0x00C0_FFEE;

/// Burst attempts evaluated per update at most, however large `dt` is.
const MAX_BURSTS_PER_UPDATE: u32 = 10;

/// Owns a particle pool and spawns, advances, retires and draws it.
///
/// Call `update` then `render` once per frame from the same thread.
#[derive(Debug)]
pub struct ParticleEmitter {
    position: Vec2,
    size: Vec2,
    active: bool,
    particles: Vec<Particle>,
    config: EmitterConfig,
    room_bounds: Option<Vec2>,
    cache: SurfaceCache,
    rng: Rng,
    spawn_accumulator: f32,
    burst_timer: f32,
    spawned_total: u64,
}

impl ParticleEmitter {
    /// Create an emitter whose spawn area is the rectangle from `position`
    /// to `position + size`.
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self::with_seed(position, size, DEFAULT_SEED)
    }

    /// Create an emitter with an explicit RNG seed for reproducible runs.
    pub fn with_seed(position: Vec2, size: Vec2, seed: u64) -> Self {
        let config = EmitterConfig::default();
        ParticleEmitter {
            position,
            size,
            active: true,
            particles: Vec::with_capacity(config.max_pool_size.min(4096)),
            config,
            room_bounds: None,
            cache: SurfaceCache::new(),
            rng: Rng::new(seed.wrapping_add(7919)),
            spawn_accumulator: 0.0,
            burst_timer: 0.0,
            spawned_total: 0,
        }
    }

    pub fn with_config(mut self, config: EmitterConfig) -> Self {
        self.apply_config(config);
        self
    }

    /// Replace the configuration. Out-of-range values are repaired, cached
    /// sprites are dropped and spawn timing restarts. Live particles keep
    /// the parameters they were spawned with.
    pub fn apply_config(&mut self, config: EmitterConfig) {
        self.config = config.normalized();
        self.cache.invalidate_all();
        self.spawn_accumulator = 0.0;
        self.burst_timer = 0.0;
        log::debug!(
            "emitter config applied: mode={:?} rate={} max_pool={}",
            self.config.mode,
            self.config.spawn_rate,
            self.config.max_pool_size
        );
    }

    /// Set the room extent. Spawn positions are clamped into `[0, extent]`
    /// and the configured `BoundsPolicy` applies to live particles.
    pub fn set_room_dimensions(&mut self, extent: Vec2) {
        let fix = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let extent = Vec2::new(fix(extent.x), fix(extent.y));
        log::debug!("emitter room set to {}x{}", extent.x, extent.y);
        self.room_bounds = Some(extent);
    }

    pub fn clear_room_dimensions(&mut self) {
        self.room_bounds = None;
    }

    /// Spawn up to `amount` particles. Requests beyond the pool's remaining
    /// capacity are dropped.
    pub fn spawn_particle_group(&mut self, amount: usize) {
        let free = self.config.max_pool_size.saturating_sub(self.particles.len());
        let count = amount.min(free);
        if count < amount {
            log::trace!(
                "pool full ({}/{}), dropping {} spawn requests",
                self.particles.len(),
                self.config.max_pool_size,
                amount - count
            );
        }
        self.particles.reserve(count);
        for _ in 0..count {
            let particle = sample_particle(
                &self.config,
                &mut self.rng,
                self.position,
                self.size,
                self.room_bounds,
                self.spawned_total,
            );
            self.particles.push(particle);
            self.spawned_total += 1;
        }
    }

    /// Advance one frame: age every particle, retire the expired (and, with a
    /// room set, apply the bounds policy), then auto-spawn if active.
    /// Negative or non-finite `dt` counts as zero.
    pub fn update(&mut self, dt: f32) {
        let dt = sanitize_dt(dt);

        for p in &mut self.particles {
            p.advance(dt);
        }

        self.retire();

        if self.active {
            let count = self.pending_spawns(dt);
            if count > 0 {
                self.spawn_particle_group(count);
            }
        }
    }

    /// Stable removal of expired particles plus the room policy.
    fn retire(&mut self) {
        let room = self.room_bounds;
        let policy = self.config.bounds_policy;
        self.particles.retain_mut(|p| {
            if p.is_expired() {
                return false;
            }
            match (policy, room) {
                (BoundsPolicy::Clip, Some(extent)) => p.is_inside(extent),
                (BoundsPolicy::Wrap, Some(extent)) => {
                    p.wrap_into(extent);
                    true
                }
                _ => true,
            }
        });
    }

    /// Number of particles the spawn policy asks for this frame.
    fn pending_spawns(&mut self, dt: f32) -> usize {
        if dt == 0.0 {
            return 0;
        }
        match self.config.mode {
            EmissionMode::Continuous => {
                if self.config.spawn_rate <= 0.0 {
                    return 0;
                }
                // At most one full pool owed, so huge rates stay finite.
                let owed = self.spawn_accumulator + self.config.spawn_rate * dt;
                self.spawn_accumulator = owed.min(self.config.max_pool_size as f32);
                let count = self.spawn_accumulator.floor();
                self.spawn_accumulator -= count;
                count as usize
            }
            EmissionMode::Burst => {
                if self.config.burst_count == 0 {
                    return 0;
                }
                let attempts = if self.config.burst_interval <= 0.0 {
                    1
                } else {
                    self.burst_timer += dt;
                    let elapsed = (self.burst_timer / self.config.burst_interval).floor();
                    self.burst_timer -= elapsed * self.config.burst_interval;
                    (elapsed as u32).min(MAX_BURSTS_PER_UPDATE)
                };
                let mut count = 0;
                for _ in 0..attempts {
                    if self.rng.chance(self.config.burst_chance) {
                        count += self.config.burst_count as usize;
                    }
                }
                count
            }
        }
    }

    /// Draw every live particle onto `target`, centred at its position plus
    /// `offset`. Returns the number of sprites drawn.
    ///
    /// Each call counts as one frame for the sprite cache; sprites no
    /// particle has used for a few frames are dropped.
    pub fn render(&mut self, target: &mut Surface, offset: Vec2) -> usize {
        if target.is_empty() {
            return 0;
        }
        let blend = self.config.blend_mode;
        let mut drawn = 0;
        match self.config.render_order {
            RenderOrder::Forward => {
                for p in &self.particles {
                    drawn += draw_particle(&mut self.cache, p, target, offset, blend);
                }
            }
            RenderOrder::Reverse => {
                for p in self.particles.iter().rev() {
                    drawn += draw_particle(&mut self.cache, p, target, offset, blend);
                }
            }
        }
        self.cache.end_frame();
        drawn
    }

    /// Enable or disable spawning. A disabled emitter keeps updating and
    /// drawing its live particles until they expire.
    pub fn set_state(&mut self, active: bool) {
        self.active = active;
    }

    /// Drop every live particle and restart spawn timing.
    pub fn clear(&mut self) {
        log::debug!("emitter cleared ({} particles)", self.particles.len());
        self.particles.clear();
        self.spawn_accumulator = 0.0;
        self.burst_timer = 0.0;
    }

    /// Move the spawn anchor. Live particles stay where they are.
    pub fn update_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn cache(&self) -> &SurfaceCache {
        &self.cache
    }

    pub fn room_bounds(&self) -> Option<Vec2> {
        self.room_bounds
    }

    /// Particles spawned over the emitter's lifetime.
    pub fn spawned_total(&self) -> u64 {
        self.spawned_total
    }
}

/// Build one particle from the config ranges.
/// Free function so the emitter can lend out its config and RNG separately.
fn sample_particle(
    config: &EmitterConfig,
    rng: &mut Rng,
    origin: Vec2,
    area: Vec2,
    room: Option<Vec2>,
    id: u64,
) -> Particle {
    let pos = origin + Vec2::new(rng.range((0.0, area.x)), rng.range((0.0, area.y)));

    let x_dir = if config.random_x_dir { rng.sign() } else { 1.0 };
    let y_dir = if config.random_y_dir { rng.sign() } else { 1.0 };
    let velocity = Vec2::new(
        rng.range(config.velocity_x_range) * x_dir,
        rng.range(config.velocity_y_range) * y_dir,
    );

    let oscillation = config.oscillation.as_ref().map(|osc| Oscillation {
        axis: osc.axis,
        amplitude: rng.range(osc.amplitude_range),
        frequency: rng.range(osc.frequency_range),
        phase: rng.range(osc.phase_range),
    });

    let (color_start_a, color_start_b) = config.color_start_range;
    let (color_end_a, color_end_b) = config.color_end_range;

    let mut particle = Particle {
        id,
        position: pos,
        base_position: pos,
        velocity,
        gravity: config.gravity,
        age: 0.0,
        lifetime: rng.range(config.lifetime_range),
        shape: config.shape,
        size_start: rng.range(config.size_start_range),
        size_end: rng.range(config.size_end_range),
        color_start: Rgb::random_between(color_start_a, color_start_b, rng),
        color_end: Rgb::random_between(color_end_a, color_end_b, rng),
        alpha_start: rng.range(config.alpha_start_range),
        alpha_end: rng.range(config.alpha_end_range),
        glow_enabled: config.glow,
        glow_radius: if config.glow { rng.range(config.glow_radius_range) } else { 0.0 },
        oscillation,
        easing: config.easing,
    };
    particle.position = particle.position_at(0.0);
    // Keep the first drawn position inside the room; sway included.
    if let Some(extent) = room {
        let inside = particle.position.clamp(Vec2::ZERO, extent);
        particle.base_position += inside - particle.position;
        particle.position = inside;
    }
    particle
}

/// Blit one particle's cached sprite. Returns 1 if anything was drawn.
fn draw_particle(
    cache: &mut SurfaceCache,
    particle: &Particle,
    target: &mut Surface,
    offset: Vec2,
    blend: BlendMode,
) -> usize {
    let visuals = particle.visuals();
    let key = particle.surface_key(&visuals);
    if key.size == 0 || key.alpha == 0 {
        return 0;
    }
    let center = particle.position + offset;
    if !center.is_finite() {
        return 0;
    }
    let sprite = cache.get_or_build(key);
    let half = Vec2::new(sprite.width() as f32, sprite.height() as f32) * 0.5;
    let corner = (center - half).round();
    target.blit(&sprite, corner.x as i32, corner.y as i32, blend);
    1
}
