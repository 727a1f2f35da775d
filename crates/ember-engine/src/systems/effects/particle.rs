//! A single particle and its closed-form motion.
//!
//! Position is never integrated step by step. It is evaluated from the
//! particle's age each time it advances, so any split of the same total
//! `dt` lands on the same state.

use glam::Vec2;

use crate::components::emitter::{OscillationAxis, ParticleShape};
use crate::extensions::easing::{lerp, Easing};
use crate::systems::surface_cache::SurfaceKey;

use super::color::Rgb;

/// Sinusoidal sway sampled for one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillation {
    pub axis: OscillationAxis,
    pub amplitude: f32,
    pub frequency: f32,
    pub phase: f32,
}

impl Oscillation {
    /// Offset from the unswayed path at the given age.
    pub fn offset(&self, age: f32) -> Vec2 {
        let d = self.amplitude * (self.frequency * age + self.phase).sin();
        match self.axis {
            OscillationAxis::X => Vec2::new(d, 0.0),
            OscillationAxis::Y => Vec2::new(0.0, d),
            OscillationAxis::Both => Vec2::splat(d),
        }
    }
}

/// Size, colour and alpha of a particle at one point of its life.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleVisuals {
    pub size: f32,
    pub color: Rgb,
    pub alpha: f32,
}

/// A single particle with kinematic and visual state.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Spawn sequence number.
    pub id: u64,
    pub position: Vec2,
    pub base_position: Vec2,
    pub velocity: Vec2,
    pub gravity: Vec2,
    pub age: f32,
    pub lifetime: f32,
    pub shape: ParticleShape,
    pub size_start: f32,
    pub size_end: f32,
    pub color_start: Rgb,
    pub color_end: Rgb,
    pub alpha_start: f32,
    pub alpha_end: f32,
    pub glow_enabled: bool,
    pub glow_radius: f32,
    pub oscillation: Option<Oscillation>,
    pub easing: Easing,
}

/// Negative and non-finite time steps count as zero.
#[inline]
pub(crate) fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
}

impl Particle {
    /// A white, glowless, stationary square of size 1 at `position`.
    /// Adjust fields or use the `with_*` helpers for anything else.
    pub fn new(position: Vec2, lifetime: f32) -> Self {
        Particle {
            id: 0,
            position,
            base_position: position,
            velocity: Vec2::ZERO,
            gravity: Vec2::ZERO,
            age: 0.0,
            lifetime,
            shape: ParticleShape::Rectangle,
            size_start: 1.0,
            size_end: 1.0,
            color_start: Rgb::WHITE,
            color_end: Rgb::WHITE,
            alpha_start: 255.0,
            alpha_end: 255.0,
            glow_enabled: false,
            glow_radius: 0.0,
            oscillation: None,
            easing: Easing::Linear,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_oscillation(mut self, oscillation: Oscillation) -> Self {
        self.oscillation = Some(oscillation);
        self.position = self.position_at(self.age);
        self
    }

    /// Closed-form position at a given age.
    pub fn position_at(&self, age: f32) -> Vec2 {
        let mut pos = self.base_position + self.velocity * age + 0.5 * self.gravity * age * age;
        if let Some(osc) = &self.oscillation {
            pos += osc.offset(age);
        }
        pos
    }

    /// Age the particle by `dt` seconds and re-evaluate its position.
    /// Never removes itself; the emitter retires expired particles.
    pub fn advance(&mut self, dt: f32) {
        self.age += sanitize_dt(dt);
        self.position = self.position_at(self.age);
    }

    pub fn is_expired(&self) -> bool {
        self.age >= self.lifetime
    }

    /// `age / lifetime`, clamped to [0, 1].
    pub fn normalized_age(&self) -> f32 {
        if self.lifetime <= 0.0 {
            return 1.0;
        }
        (self.age / self.lifetime).clamp(0.0, 1.0)
    }

    /// Visuals at normalized age `t_norm` (clamped to [0, 1], then eased).
    pub fn interpolated(&self, t_norm: f32) -> ParticleVisuals {
        let t = self.easing.apply(t_norm);
        ParticleVisuals {
            size: lerp(self.size_start, self.size_end, t),
            color: self.color_start.lerp(self.color_end, t),
            alpha: lerp(self.alpha_start, self.alpha_end, t),
        }
    }

    /// Visuals at the particle's current age.
    pub fn visuals(&self) -> ParticleVisuals {
        self.interpolated(self.normalized_age())
    }

    /// Cache key for the sprite matching `visuals`.
    pub fn surface_key(&self, visuals: &ParticleVisuals) -> SurfaceKey {
        let glow = if self.glow_enabled { self.glow_radius } else { 0.0 };
        SurfaceKey::new(self.shape, visuals.size, visuals.color, visuals.alpha, glow)
    }

    /// True while `position` lies within `[0, extent]` on both axes.
    pub fn is_inside(&self, extent: Vec2) -> bool {
        self.position.x >= 0.0
            && self.position.y >= 0.0
            && self.position.x <= extent.x
            && self.position.y <= extent.y
    }

    /// Shift the anchor by whole room extents so `position` falls inside
    /// `[0, extent)`. Axes with a non-positive extent are left alone.
    pub fn wrap_into(&mut self, extent: Vec2) {
        let shift = |p: f32, e: f32| -> f32 {
            if e > 0.0 && p.is_finite() {
                p.rem_euclid(e) - p
            } else {
                0.0
            }
        };
        let delta = Vec2::new(shift(self.position.x, extent.x), shift(self.position.y, extent.y));
        self.base_position += delta;
        self.position += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    fn swaying() -> Particle {
        let mut p = Particle::new(Vec2::new(10.0, 20.0), 5.0)
            .with_velocity(Vec2::new(30.0, -12.0))
            .with_oscillation(Oscillation {
                axis: OscillationAxis::Both,
                amplitude: 6.0,
                frequency: 2.5,
                phase: 0.7,
            });
        p.gravity = Vec2::new(0.0, 9.8);
        p
    }

    #[test]
    fn split_advance_matches_single_advance() {
        let mut split = swaying();
        let mut whole = swaying();
        split.advance(0.13);
        split.advance(0.29);
        split.advance(0.08);
        whole.advance(0.5);
        assert!(approx(split.position, whole.position));
        assert!((split.age - whole.age).abs() < 1e-6);
        assert_eq!(split.visuals(), whole.visuals());
    }

    #[test]
    fn advance_follows_closed_form() {
        let mut p = Particle::new(Vec2::ZERO, 10.0).with_velocity(Vec2::new(2.0, 1.0));
        p.advance(3.0);
        assert!(approx(p.position, Vec2::new(6.0, 3.0)));
        assert_eq!(p.base_position, Vec2::ZERO);
    }

    #[test]
    fn oscillation_only_moves_chosen_axis() {
        let mut p = Particle::new(Vec2::ZERO, 10.0).with_oscillation(Oscillation {
            axis: OscillationAxis::Y,
            amplitude: 5.0,
            frequency: 1.0,
            phase: 0.0,
        });
        p.advance(std::f32::consts::FRAC_PI_2);
        assert!(approx(p.position, Vec2::new(0.0, 5.0)));
    }

    #[test]
    fn bad_dt_is_ignored() {
        let mut p = swaying();
        let before = p.clone();
        p.advance(-1.0);
        p.advance(f32::NAN);
        p.advance(f32::INFINITY);
        assert_eq!(p.age, 0.0);
        assert!(approx(p.position, before.position));
    }

    #[test]
    fn expiry_is_monotonic() {
        let mut p = Particle::new(Vec2::ZERO, 1.0);
        let mut seen_expired = false;
        for _ in 0..30 {
            p.advance(0.05);
            if seen_expired {
                assert!(p.is_expired());
            }
            seen_expired |= p.is_expired();
            assert_eq!(p.is_expired(), p.age >= p.lifetime);
        }
        assert!(seen_expired);
    }

    #[test]
    fn interpolation_endpoints_and_bounds() {
        let mut p = Particle::new(Vec2::ZERO, 2.0);
        p.size_start = 10.0;
        p.size_end = 2.0;
        p.color_start = Rgb::new(255, 0, 40);
        p.color_end = Rgb::new(0, 255, 40);
        p.alpha_start = 200.0;
        p.alpha_end = 0.0;

        for easing in Easing::ALL {
            p.easing = easing;
            let start = p.interpolated(0.0);
            let end = p.interpolated(1.0);
            assert_eq!(start, ParticleVisuals { size: 10.0, color: p.color_start, alpha: 200.0 });
            assert_eq!(end, ParticleVisuals { size: 2.0, color: p.color_end, alpha: 0.0 });
            for i in 0..=20 {
                let v = p.interpolated(i as f32 / 20.0);
                assert!((2.0..=10.0).contains(&v.size), "{:?}", v);
                assert!((0.0..=200.0).contains(&v.alpha), "{:?}", v);
                assert_eq!(v.color.b, 40);
            }
        }
    }

    #[test]
    fn normalized_age_is_clamped() {
        let mut p = Particle::new(Vec2::ZERO, 2.0);
        assert_eq!(p.normalized_age(), 0.0);
        p.advance(1.0);
        assert_eq!(p.normalized_age(), 0.5);
        p.advance(10.0);
        assert_eq!(p.normalized_age(), 1.0);
        assert_eq!(p.visuals(), p.interpolated(1.0));
    }

    #[test]
    fn glow_only_keys_when_enabled() {
        let mut p = Particle::new(Vec2::ZERO, 1.0);
        p.glow_radius = 3.0;
        let v = p.visuals();
        assert_eq!(p.surface_key(&v).glow_radius, 0);
        p.glow_enabled = true;
        assert_eq!(p.surface_key(&v).glow_radius, 3);
    }

    #[test]
    fn inside_check_is_inclusive() {
        let extent = Vec2::new(100.0, 50.0);
        assert!(Particle::new(Vec2::new(0.0, 0.0), 1.0).is_inside(extent));
        assert!(Particle::new(Vec2::new(100.0, 50.0), 1.0).is_inside(extent));
        assert!(!Particle::new(Vec2::new(-0.1, 10.0), 1.0).is_inside(extent));
        assert!(!Particle::new(Vec2::new(10.0, 50.5), 1.0).is_inside(extent));
    }

    #[test]
    fn wrap_shifts_anchor_by_whole_extents() {
        let mut p = Particle::new(Vec2::new(90.0, 10.0), 10.0).with_velocity(Vec2::new(20.0, -30.0));
        p.advance(1.0);
        assert!(approx(p.position, Vec2::new(110.0, -20.0)));
        p.wrap_into(Vec2::new(100.0, 100.0));
        assert!(approx(p.position, Vec2::new(10.0, 80.0)));
        assert!(approx(p.base_position, Vec2::new(-10.0, 110.0)));
        // Motion continues from the wrapped anchor.
        p.advance(0.5);
        assert!(approx(p.position, Vec2::new(20.0, 65.0)));
    }
}
