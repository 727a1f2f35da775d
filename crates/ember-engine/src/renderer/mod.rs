pub mod surface;

pub use surface::{BlendMode, Rgba, Surface};
