//! CPU particle emitter with cached glow sprites.
//!
//! A host creates a [`ParticleEmitter`], hands it an [`EmitterConfig`], and
//! each frame calls `update(dt)` followed by `render(&mut surface, offset)`.

pub mod components;
pub mod systems;
pub mod renderer;
pub mod extensions;

// Re-export key types at crate root for convenience
pub use components::emitter::{
    EmitterConfig, EmissionMode, ParticleShape, OscillationAxis, OscillationConfig,
    BoundsPolicy, RenderOrder,
};
pub use systems::effects::{Particle, ParticleVisuals, Oscillation, Rgb, Rng};
pub use systems::emitter::{ParticleEmitter, DEFAULT_SEED};
pub use systems::surface_cache::{SurfaceCache, SurfaceKey};
pub use renderer::surface::{Surface, Rgba, BlendMode};
pub use extensions::{Easing, lerp};
