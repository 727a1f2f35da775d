// extensions/easing.rs
//
// Easing curves applied to a particle's normalized age before its visuals are
// interpolated. Every curve maps [0, 1] onto [0, 1] without overshoot, so an
// eased value always stays between the start and end values.

use serde::{Deserialize, Serialize};

/// Easing curve for size/colour/alpha interpolation over a particle's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    /// Constant rate (no easing).
    #[default]
    Linear,
    /// Slow start.
    QuadIn,
    /// Slow end.
    QuadOut,
}

impl Easing {
    /// Apply the curve to `t`, clamped to [0, 1].
    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let eased = match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
        };
        eased.clamp(0.0, 1.0)
    }

    pub const ALL: [Easing; 3] = [Easing::Linear, Easing::QuadIn, Easing::QuadOut];
}

// ── Interpolation helpers ────────────────────────────────────────────────

/// Linearly interpolate between two values. Exact at both `t = 0` and
/// `t = 1`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}
