//! In-memory RGBA8 surfaces.
//!
//! The same type serves as the host's render target and as the pre-rendered
//! particle sprites held by the surface cache. Colours are stored with
//! straight (non-premultiplied) alpha.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::systems::effects::Rgb;

/// Blend mode used when compositing a sprite onto a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// Standard source-over alpha blending.
    #[default]
    Alpha,
    /// Additive: dst += src * src_alpha, saturating. Brightens overlapping glow.
    Additive,
}

/// How a fill writes into the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Paint {
    Blend(BlendMode),
    /// Take the source colour and add source alpha into destination alpha.
    /// Stacks glow layers of one colour into a soft halo.
    Accumulate,
}

/// One RGBA8 pixel, laid out as four bytes for upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }

    pub const fn from_rgb(c: Rgb, a: u8) -> Self {
        Rgba { r: c.r, g: c.g, b: c.b, a }
    }

    pub fn rgb(self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }
}

#[inline]
fn unit(v: u8) -> f32 {
    v as f32 / 255.0
}

#[inline]
fn byte(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Source-over with straight alpha.
fn blend_alpha(src: Rgba, dst: Rgba) -> Rgba {
    if src.a == 255 || dst.a == 0 {
        return src;
    }
    let sa = unit(src.a);
    let da = unit(dst.a) * (1.0 - sa);
    let out_a = sa + da;
    let channel = |s: u8, d: u8| byte((unit(s) * sa + unit(d) * da) / out_a);
    Rgba {
        r: channel(src.r, dst.r),
        g: channel(src.g, dst.g),
        b: channel(src.b, dst.b),
        a: byte(out_a),
    }
}

fn blend_additive(src: Rgba, dst: Rgba) -> Rgba {
    let a = src.a as u16;
    let add = |s: u8| ((s as u16 * a + 127) / 255) as u8;
    Rgba {
        r: dst.r.saturating_add(add(src.r)),
        g: dst.g.saturating_add(add(src.g)),
        b: dst.b.saturating_add(add(src.b)),
        a: dst.a.saturating_add(src.a),
    }
}

/// RGBA8 pixel buffer for software rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pixels: Vec<Rgba>,
    width: u32,
    height: u32,
}

impl Surface {
    /// Create a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![Rgba::TRANSPARENT; width as usize * height as usize],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// True when the surface has no pixels to draw into.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Fill every pixel with one colour.
    pub fn clear(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Composite a single pixel; out-of-bounds writes are ignored.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba, mode: BlendMode) {
        self.paint_pixel(x, y, color, Paint::Blend(mode));
    }

    fn paint_pixel(&mut self, x: i32, y: i32, color: Rgba, paint: Paint) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        if color.a == 0 {
            return;
        }
        let dst = self.pixels[i];
        self.pixels[i] = match paint {
            Paint::Blend(BlendMode::Alpha) => blend_alpha(color, dst),
            Paint::Blend(BlendMode::Additive) => blend_additive(color, dst),
            Paint::Accumulate => Rgba {
                a: dst.a.saturating_add(color.a),
                ..color
            },
        };
    }

    fn paint_span(&mut self, x0: i32, x1: i32, y: i32, color: Rgba, paint: Paint) {
        if y < 0 || y >= self.height as i32 {
            return;
        }
        let x0 = x0.max(0);
        let x1 = x1.min(self.width as i32 - 1);
        for x in x0..=x1 {
            self.paint_pixel(x, y, color, paint);
        }
    }

    /// Fill an axis-aligned rectangle with its top-left corner at (x, y).
    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgba, mode: BlendMode) {
        self.paint_rect(x, y, w, h, color, Paint::Blend(mode));
    }

    pub(crate) fn paint_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgba, paint: Paint) {
        if w == 0 || h == 0 {
            return;
        }
        for row in 0..h as i32 {
            self.paint_span(x, x + w as i32 - 1, y + row, color, paint);
        }
    }

    /// Fill a circle covering every pixel whose centre lies within `radius`
    /// of (cx, cy). Works on horizontal spans, one per row.
    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba, mode: BlendMode) {
        self.paint_circle(cx, cy, radius, color, Paint::Blend(mode));
    }

    pub(crate) fn paint_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba, paint: Paint) {
        if !(radius > 0.0) {
            return;
        }
        let r2 = radius * radius;
        let y_start = (cy - radius).floor() as i32;
        let y_end = (cy + radius).ceil() as i32;
        for y in y_start..=y_end {
            let dy = y as f32 + 0.5 - cy;
            let rem = r2 - dy * dy;
            if rem < 0.0 {
                continue;
            }
            let half = rem.sqrt();
            // Pixel x is covered when |x + 0.5 - cx| <= half.
            let x0 = (cx - half - 0.5).ceil() as i32;
            let x1 = (cx + half - 0.5).floor() as i32;
            if x0 <= x1 {
                self.paint_span(x0, x1, y, color, paint);
            }
        }
    }

    /// Composite `src` with its top-left corner at (x, y). Clipped to this
    /// surface; fully transparent source pixels are skipped.
    pub fn blit(&mut self, src: &Surface, x: i32, y: i32, mode: BlendMode) {
        let dst_w = self.width as i32;
        let dst_h = self.height as i32;
        let src_w = src.width as i32;
        let src_h = src.height as i32;
        if x >= dst_w || y >= dst_h || x + src_w <= 0 || y + src_h <= 0 {
            return;
        }

        for sy in 0..src_h {
            let dy = y + sy;
            if dy < 0 || dy >= dst_h {
                continue;
            }
            for sx in 0..src_w {
                let dx = x + sx;
                if dx < 0 || dx >= dst_w {
                    continue;
                }
                let color = src.pixels[sy as usize * src.width as usize + sx as usize];
                self.paint_pixel(dx, dy, color, Paint::Blend(mode));
            }
        }
    }

    /// Raw RGBA bytes, row-major, for handing to a window or encoder.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Number of pixels with non-zero alpha.
    pub fn coverage(&self) -> usize {
        self.pixels.iter().filter(|p| p.a > 0).count()
    }
}
