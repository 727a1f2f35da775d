//! Particle primitives: the particle entity, its colours and the RNG every
//! random parameter is drawn from.

mod rng;
mod color;
mod particle;

// Re-export public types
pub use rng::Rng;
pub use color::Rgb;
pub use particle::{Oscillation, Particle, ParticleVisuals};
pub(crate) use particle::sanitize_dt;
