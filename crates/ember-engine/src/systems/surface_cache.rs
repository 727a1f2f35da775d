//! Pre-rendered particle sprites, keyed by rounded visual parameters.
//!
//! Particles that look the same this frame (same shape, pixel size, colour,
//! alpha and glow) share one sprite. Keys are rounded to whole pixels and
//! whole alpha steps so float noise does not grow the cache. Fading particles
//! still walk through many keys over their life, so sprites idle for
//! `IDLE_FRAMES` frames are evicted and the entry count is capped.

use std::collections::HashMap;
use std::rc::Rc;

use crate::components::emitter::ParticleShape;
use crate::renderer::surface::{BlendMode, Paint, Rgba, Surface};
use crate::systems::effects::Rgb;

/// Maximum number of concentric glow layers drawn under a sprite.
pub const GLOW_LAYERS: u32 = 4;
/// Fraction of the particle's alpha given to the innermost glow layer.
pub const GLOW_STRENGTH: f32 = 0.35;
/// Sizes and glow radii are capped here so one bad value cannot allocate a
/// giant sprite.
pub const MAX_SPRITE_PX: u32 = 512;
/// Frames a sprite may go unused before `end_frame` evicts it.
pub const IDLE_FRAMES: u64 = 8;
/// Hard cap on cached sprites; reaching it flushes the whole cache.
pub const MAX_CACHE_ENTRIES: usize = 4096;

/// Rounded visual parameters identifying one cached sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceKey {
    pub shape: ParticleShape,
    /// Side length or diameter in whole pixels.
    pub size: u32,
    pub color: Rgb,
    pub alpha: u8,
    /// Glow halo width in whole pixels; 0 means no glow.
    pub glow_radius: u32,
}

fn round_px(v: f32) -> u32 {
    if v.is_finite() && v > 0.0 {
        v.round().min(MAX_SPRITE_PX as f32) as u32
    } else {
        0
    }
}

impl SurfaceKey {
    pub fn new(shape: ParticleShape, size: f32, color: Rgb, alpha: f32, glow_radius: f32) -> Self {
        let alpha = if alpha.is_finite() { alpha.round().clamp(0.0, 255.0) as u8 } else { 0 };
        SurfaceKey {
            shape,
            size: round_px(size),
            color,
            alpha,
            glow_radius: round_px(glow_radius),
        }
    }

    /// Side of the square sprite, glow halo included.
    pub fn side(&self) -> u32 {
        self.size + self.glow_radius * 2
    }
}

#[derive(Debug)]
struct Entry {
    surface: Rc<Surface>,
    last_used: u64,
}

/// Memoized sprite store owned by one emitter.
#[derive(Debug)]
pub struct SurfaceCache {
    entries: HashMap<SurfaceKey, Entry>,
    empty: Rc<Surface>,
    frame: u64,
    hits: u64,
    misses: u64,
}

impl Default for SurfaceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            empty: Rc::new(Surface::new(1, 1)),
            frame: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Return the sprite for `key`, rasterizing it on first request.
    /// Zero-sized keys all share one transparent 1x1 surface.
    pub fn get_or_build(&mut self, key: SurfaceKey) -> Rc<Surface> {
        if key.size == 0 {
            return Rc::clone(&self.empty);
        }
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.last_used = self.frame;
            self.hits += 1;
            return Rc::clone(&entry.surface);
        }
        self.misses += 1;
        if self.entries.len() >= MAX_CACHE_ENTRIES {
            log::debug!("surface cache full ({} sprites), flushing", self.entries.len());
            self.entries.clear();
        }
        log::trace!("surface cache miss: {:?}", key);
        let surface = Rc::new(rasterize(&key));
        self.entries.insert(
            key,
            Entry {
                surface: Rc::clone(&surface),
                last_used: self.frame,
            },
        );
        surface
    }

    /// Close the current frame: evict sprites not requested during the last
    /// `IDLE_FRAMES` frames, then advance the frame counter.
    pub fn end_frame(&mut self) {
        let frame = self.frame;
        self.entries
            .retain(|_, entry| frame - entry.last_used < IDLE_FRAMES);
        self.frame += 1;
    }

    pub fn contains(&self, key: &SurfaceKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop every cached sprite. Sprites still held elsewhere stay alive
    /// until released.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

/// Draw `shape` with the given outer extent, centred in `surface`.
fn draw_shape(surface: &mut Surface, shape: ParticleShape, extent: u32, color: Rgba, paint: Paint) {
    let side = surface.width();
    match shape {
        ParticleShape::Rectangle => {
            let origin = (side.saturating_sub(extent) / 2) as i32;
            surface.paint_rect(origin, origin, extent, extent, color, paint);
        }
        ParticleShape::Circle => {
            let center = side as f32 / 2.0;
            surface.paint_circle(center, center, extent as f32 / 2.0, color, paint);
        }
    }
}

/// Rasterize a sprite: fading glow layers (outermost first, alpha stacked)
/// under the base shape.
fn rasterize(key: &SurfaceKey) -> Surface {
    let side = key.side();
    let mut surface = Surface::new(side, side);

    if key.glow_radius > 0 && key.alpha > 0 {
        let layers = key.glow_radius.min(GLOW_LAYERS);
        for i in (1..=layers).rev() {
            let expand = key.glow_radius * i / layers;
            let falloff = 1.0 - i as f32 / (layers + 1) as f32;
            let alpha = (key.alpha as f32 * GLOW_STRENGTH * falloff).round() as u8;
            draw_shape(
                &mut surface,
                key.shape,
                key.size + 2 * expand,
                Rgba::from_rgb(key.color, alpha),
                Paint::Accumulate,
            );
        }
    }

    draw_shape(
        &mut surface,
        key.shape,
        key.size,
        Rgba::from_rgb(key.color, key.alpha),
        Paint::Blend(BlendMode::Alpha),
    );
    surface
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(shape: ParticleShape, size: f32, glow: f32) -> SurfaceKey {
        SurfaceKey::new(shape, size, Rgb::new(255, 128, 0), 255.0, glow)
    }

    #[test]
    fn key_rounds_float_noise() {
        let a = SurfaceKey::new(ParticleShape::Circle, 4.0001, Rgb::WHITE, 199.6, 1.98);
        let b = SurfaceKey::new(ParticleShape::Circle, 3.9999, Rgb::WHITE, 200.4, 2.01);
        assert_eq!(a, b);
        assert_eq!(a.size, 4);
        assert_eq!(a.alpha, 200);
        assert_eq!(a.glow_radius, 2);
        let odd = SurfaceKey::new(ParticleShape::Circle, -3.0, Rgb::WHITE, 900.0, f32::NAN);
        assert_eq!((odd.size, odd.alpha, odd.glow_radius), (0, 255, 0));
        let huge = SurfaceKey::new(ParticleShape::Circle, 1.0e9, Rgb::WHITE, 1.0, 1.0e9);
        assert_eq!(huge.side(), MAX_SPRITE_PX * 3);
    }

    #[test]
    fn identical_keys_share_a_surface() {
        let mut cache = SurfaceCache::new();
        let a = cache.get_or_build(key(ParticleShape::Rectangle, 6.0, 0.0));
        let b = cache.get_or_build(key(ParticleShape::Rectangle, 6.2, 0.0));
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn differing_keys_get_distinct_entries() {
        let mut cache = SurfaceCache::new();
        let a = cache.get_or_build(key(ParticleShape::Rectangle, 6.0, 0.0));
        let b = cache.get_or_build(key(ParticleShape::Circle, 6.0, 0.0));
        let c = cache.get_or_build(key(ParticleShape::Circle, 6.0, 2.0));
        assert!(!Rc::ptr_eq(&a, &b));
        assert!(!Rc::ptr_eq(&b, &c));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn invalidate_clears_entries() {
        let mut cache = SurfaceCache::new();
        let k = key(ParticleShape::Circle, 5.0, 1.0);
        let before = cache.get_or_build(k);
        cache.invalidate_all();
        assert!(cache.is_empty());
        assert!(!cache.contains(&k));
        let after = cache.get_or_build(k);
        assert!(!Rc::ptr_eq(&before, &after));
        assert_eq!(*before, *after);
    }

    #[test]
    fn idle_sprites_are_evicted() {
        let mut cache = SurfaceCache::new();
        let kept = key(ParticleShape::Circle, 5.0, 0.0);
        let idle = key(ParticleShape::Rectangle, 5.0, 0.0);
        cache.get_or_build(idle);
        for _ in 0..=IDLE_FRAMES {
            cache.get_or_build(kept);
            cache.end_frame();
        }
        assert!(cache.contains(&kept));
        assert!(!cache.contains(&idle));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn entry_count_is_capped() {
        let mut cache = SurfaceCache::new();
        for i in 0..=MAX_CACHE_ENTRIES {
            let k = SurfaceKey::new(ParticleShape::Rectangle, 1.0, Rgb::new(i as u8, (i >> 8) as u8, 0), 255.0, 0.0);
            cache.get_or_build(k);
            assert!(cache.len() <= MAX_CACHE_ENTRIES);
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_size_returns_transparent_pixel() {
        let mut cache = SurfaceCache::new();
        let s = cache.get_or_build(key(ParticleShape::Rectangle, 0.2, 3.0));
        assert_eq!((s.width(), s.height()), (1, 1));
        assert_eq!(s.coverage(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn rectangle_fills_whole_sprite() {
        let mut cache = SurfaceCache::new();
        let s = cache.get_or_build(key(ParticleShape::Rectangle, 4.0, 0.0));
        assert_eq!((s.width(), s.height()), (4, 4));
        assert_eq!(s.coverage(), 16);
        assert_eq!(s.pixel(0, 0), Some(Rgba::new(255, 128, 0, 255)));
    }

    #[test]
    fn circle_leaves_corners_empty() {
        let mut cache = SurfaceCache::new();
        let s = cache.get_or_build(key(ParticleShape::Circle, 8.0, 0.0));
        assert_eq!(s.pixel(0, 0).map(|p| p.a), Some(0));
        assert_eq!(s.pixel(4, 4).map(|p| p.a), Some(255));
        assert!(s.coverage() < 64);
    }

    #[test]
    fn glow_fades_outward_under_opaque_core() {
        let mut cache = SurfaceCache::new();
        let s = cache.get_or_build(key(ParticleShape::Rectangle, 4.0, 4.0));
        assert_eq!((s.width(), s.height()), (12, 12));
        // Core
        assert_eq!(s.pixel(5, 5).map(|p| p.a), Some(255));
        // Halo alpha decreases from the core edge to the sprite edge.
        let row: Vec<u8> = (0..4).map(|x| s.pixel(x, 5).map(|p| p.a).unwrap_or(0)).collect();
        assert!(row[0] > 0);
        assert!(row.windows(2).all(|w| w[0] < w[1]), "{:?}", row);
        assert!(row[3] < 255);
        assert_eq!(s.pixel(0, 5).map(|p| p.rgb()), Some(Rgb::new(255, 128, 0)));
    }
}
