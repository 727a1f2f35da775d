pub mod effects;
pub mod emitter;
pub mod surface_cache;
