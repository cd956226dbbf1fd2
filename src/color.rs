//! 8-bit RGBA color and channel arithmetic.
//!
//! Colors coming from the shape model are straight (non-premultiplied) alpha;
//! everything handed to the surface is premultiplied. The fixed-point helpers
//! here are the ones the blenders and paint generators share.

use crate::basics::{uround, CoverType, COVER_MASK};

// ============================================================================
// Rgba8
// ============================================================================

/// RGBA color with u8 components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BASE_SHIFT: u32 = 8;
    pub const BASE_SCALE: u32 = 1 << Self::BASE_SHIFT;
    pub const BASE_MASK: u32 = Self::BASE_SCALE - 1;
    pub const BASE_MSB: u32 = 1 << (Self::BASE_SHIFT - 1);

    pub const TRANSPARENT: Rgba8 = Rgba8 { r: 0, g: 0, b: 0, a: 0 };
    pub const WHITE: Rgba8 = Rgba8 { r: 255, g: 255, b: 255, a: 255 };
    pub const BLACK: Rgba8 = Rgba8 { r: 0, g: 0, b: 0, a: 255 };

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn new_opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    #[inline]
    pub fn is_opaque(&self) -> bool {
        self.a as u32 == Self::BASE_MASK
    }

    /// Fixed-point multiply, exact over [0, 255].
    #[inline]
    pub fn multiply(a: u8, b: u8) -> u8 {
        let t: u32 = a as u32 * b as u32 + Self::BASE_MSB;
        (((t >> Self::BASE_SHIFT) + t) >> Self::BASE_SHIFT) as u8
    }

    /// Multiply a color component by a cover.
    #[inline]
    pub fn mult_cover(a: u8, cover: CoverType) -> u8 {
        Self::multiply(a, cover)
    }

    /// Interpolate p to q by a, assuming q is premultiplied by a.
    #[inline]
    pub fn prelerp(p: u8, q: u8, a: u8) -> u8 {
        p.wrapping_add(q).wrapping_sub(Self::multiply(p, a))
    }

    /// Interpolate p to q by a.
    #[inline]
    pub fn lerp(p: u8, q: u8, a: u8) -> u8 {
        let t = (q as i32 - p as i32) * a as i32 + Self::BASE_MSB as i32 - (p > q) as i32;
        (p as i32 + (((t >> Self::BASE_SHIFT) + t) >> Self::BASE_SHIFT)) as u8
    }

    /// Scale RGB by alpha in place.
    pub fn premultiply(&mut self) -> &mut Self {
        if self.a as u32 != Self::BASE_MASK {
            if self.a == 0 {
                self.r = 0;
                self.g = 0;
                self.b = 0;
            } else {
                self.r = Self::multiply(self.r, self.a);
                self.g = Self::multiply(self.g, self.a);
                self.b = Self::multiply(self.b, self.a);
            }
        }
        self
    }

    /// Premultiplied copy.
    #[inline]
    pub fn premultiplied(mut self) -> Self {
        self.premultiply();
        self
    }

    /// Undo premultiplication in place.
    pub fn demultiply(&mut self) -> &mut Self {
        if self.a as u32 != Self::BASE_MASK {
            if self.a == 0 {
                self.r = 0;
                self.g = 0;
                self.b = 0;
            } else {
                let a = self.a as u32;
                self.r = ((self.r as u32 * Self::BASE_MASK + a / 2) / a).min(255) as u8;
                self.g = ((self.g as u32 * Self::BASE_MASK + a / 2) / a).min(255) as u8;
                self.b = ((self.b as u32 * Self::BASE_MASK + a / 2) / a).min(255) as u8;
            }
        }
        self
    }

    /// Clamp color channels so none exceeds alpha.
    ///
    /// Decoded images sometimes carry RGB above alpha; such samples must be
    /// made valid premultiplied values before compositing.
    #[inline]
    pub fn clamp_to_alpha(&mut self) -> &mut Self {
        self.r = self.r.min(self.a);
        self.g = self.g.min(self.a);
        self.b = self.b.min(self.a);
        self
    }

    /// Scale all four channels by a coverage value (premultiplied colors only).
    #[inline]
    pub fn scaled_by_cover(&self, cover: CoverType) -> Self {
        if cover as u32 == COVER_MASK {
            return *self;
        }
        Self {
            r: Self::mult_cover(self.r, cover),
            g: Self::mult_cover(self.g, cover),
            b: Self::mult_cover(self.b, cover),
            a: Self::mult_cover(self.a, cover),
        }
    }

    /// Linear interpolation toward `c` by `k` in [0, 1], rounded per channel.
    ///
    /// `k == 0.0` and `k == 1.0` reproduce the end points exactly.
    pub fn gradient(&self, c: &Rgba8, k: f64) -> Rgba8 {
        let mix = |p: u8, q: u8| -> u8 {
            let v = p as f64 + (q as f64 - p as f64) * k;
            uround(v.clamp(0.0, 255.0)) as u8
        };
        Rgba8 {
            r: mix(self.r, c.r),
            g: mix(self.g, c.g),
            b: mix(self.b, c.b),
            a: mix(self.a, c.a),
        }
    }

    /// Interpolation toward `c` carried out in linear light.
    ///
    /// Alpha is interpolated linearly; RGB channels are converted from sRGB,
    /// blended, and converted back.
    pub fn gradient_linear_rgb(&self, c: &Rgba8, k: f64) -> Rgba8 {
        let mix = |p: u8, q: u8| -> u8 {
            let lp = srgb_to_linear(p as f64 / 255.0);
            let lq = srgb_to_linear(q as f64 / 255.0);
            let v = linear_to_srgb(lp + (lq - lp) * k);
            uround((v * 255.0).clamp(0.0, 255.0)) as u8
        };
        let a = self.a as f64 + (c.a as f64 - self.a as f64) * k;
        Rgba8 {
            r: mix(self.r, c.r),
            g: mix(self.g, c.g),
            b: mix(self.b, c.b),
            a: uround(a.clamp(0.0, 255.0)) as u8,
        }
    }
}

// ============================================================================
// sRGB transfer functions
// ============================================================================

/// Map an sRGB-encoded channel in [0, 1] to linear light.
#[inline]
pub fn srgb_to_linear(s: f64) -> f64 {
    if s <= 0.04045 {
        s / 12.92
    } else {
        ((s + 0.055) / 1.055).powf(2.4)
    }
}

/// Map a linear-light channel in [0, 1] back to sRGB encoding.
#[inline]
pub fn linear_to_srgb(s: f64) -> f64 {
    if s <= 0.003_130_8 {
        12.92 * s
    } else {
        1.055 * s.powf(1.0 / 2.4) - 0.055
    }
}

// ============================================================================
// Tests
// ============================================================================
