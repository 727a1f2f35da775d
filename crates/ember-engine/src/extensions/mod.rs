// extensions/mod.rs
//
// Pure helpers with no dependency on emitters or surfaces.

pub mod easing;

pub use easing::{Easing, lerp};
