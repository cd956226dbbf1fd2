//! Gradient span generator and gradient functions.
//!
//! A gradient function maps a point in gradient space to a scalar distance;
//! spread adaptors fold that distance for the reflect and repeat modes and
//! `SpanGradient` turns it into a lookup table index for each pixel.

use crate::basics::iround;
use crate::color::Rgba8;
use crate::gradient_lut::ColorFunction;
use crate::paint::SpanGenerator;
use crate::span_interpolator_linear::{SpanInterpolatorLinear, SUBPIXEL_SHIFT};

// ============================================================================
// Constants
// ============================================================================

pub const GRADIENT_SUBPIXEL_SHIFT: i32 = 4;
pub const GRADIENT_SUBPIXEL_SCALE: i32 = 1 << GRADIENT_SUBPIXEL_SHIFT;

/// Downscale shift from interpolator subpixel to gradient subpixel.
const DOWNSCALE_SHIFT: i32 = SUBPIXEL_SHIFT as i32 - GRADIENT_SUBPIXEL_SHIFT;

// ============================================================================
// GradientFunction trait
// ============================================================================

/// Maps a point `(x, y)` in gradient subpixels to a distance. `d` is the
/// gradient length in the same units.
pub trait GradientFunction {
    fn calculate(&self, x: i32, y: i32, d: i32) -> i32;
}

/// Linear gradient along the x axis.
pub struct GradientX;

impl GradientFunction for GradientX {
    #[inline]
    fn calculate(&self, x: i32, _y: i32, _d: i32) -> i32 {
        x
    }
}

/// Distance from the origin.
pub struct GradientRadial;

impl GradientFunction for GradientRadial {
    #[inline]
    fn calculate(&self, x: i32, y: i32, _d: i32) -> i32 {
        let (x, y) = (x as f64, y as f64);
        iround((x * x + y * y).sqrt())
    }
}

// ============================================================================
// Radial gradient with focal point
// ============================================================================

/// Radial gradient whose zero point is moved to `(fx, fy)` inside the circle
/// of radius `r` around the origin.
pub struct GradientRadialFocus {
    r: i32,
    fx: i32,
    fy: i32,
    r2: f64,
    mul: f64,
}

impl GradientRadialFocus {
    /// Radius and focal point in gradient space units.
    pub fn new(r: f64, fx: f64, fy: f64) -> Self {
        let mut s = Self {
            r: iround(r * GRADIENT_SUBPIXEL_SCALE as f64),
            fx: iround(fx * GRADIENT_SUBPIXEL_SCALE as f64),
            fy: iround(fy * GRADIENT_SUBPIXEL_SCALE as f64),
            r2: 0.0,
            mul: 0.0,
        };
        s.update_values();
        s
    }

    pub fn radius(&self) -> f64 {
        self.r as f64 / GRADIENT_SUBPIXEL_SCALE as f64
    }

    pub fn focus_x(&self) -> f64 {
        self.fx as f64 / GRADIENT_SUBPIXEL_SCALE as f64
    }

    fn update_values(&mut self) {
        // A focal point on the circle makes the divisor zero; pull it one
        // subpixel toward the centre.
        self.r2 = (self.r as f64) * (self.r as f64);
        let mut d = self.r2 - self.focus_sq();
        if d == 0.0 {
            self.fx -= self.fx.signum();
            self.fy -= self.fy.signum();
            d = self.r2 - self.focus_sq();
        }
        self.mul = if d == 0.0 { 0.0 } else { self.r as f64 / d };
    }

    #[inline]
    fn focus_sq(&self) -> f64 {
        (self.fx as f64) * (self.fx as f64) + (self.fy as f64) * (self.fy as f64)
    }
}

impl GradientFunction for GradientRadialFocus {
    fn calculate(&self, x: i32, y: i32, _d: i32) -> i32 {
        let dx = x as f64 - self.fx as f64;
        let dy = y as f64 - self.fy as f64;
        let d2 = dx * self.fy as f64 - dy * self.fx as f64;
        let d3 = self.r2 * (dx * dx + dy * dy) - d2 * d2;
        iround((dx * self.fx as f64 + dy * self.fy as f64 + d3.abs().sqrt()) * self.mul)
    }
}

// ============================================================================
// Spread adaptors
// ============================================================================

/// Pad spread: the raw distance, clamped to the table by `SpanGradient`.
pub struct GradientPadAdaptor<G> {
    gradient: G,
}

impl<G: GradientFunction> GradientPadAdaptor<G> {
    pub fn new(gradient: G) -> Self {
        Self { gradient }
    }
}

impl<G: GradientFunction> GradientFunction for GradientPadAdaptor<G> {
    #[inline]
    fn calculate(&self, x: i32, y: i32, d: i32) -> i32 {
        self.gradient.calculate(x, y, d)
    }
}

/// Repeat spread: distance modulo the gradient length.
pub struct GradientRepeatAdaptor<G> {
    gradient: G,
}

impl<G: GradientFunction> GradientRepeatAdaptor<G> {
    pub fn new(gradient: G) -> Self {
        Self { gradient }
    }
}

impl<G: GradientFunction> GradientFunction for GradientRepeatAdaptor<G> {
    #[inline]
    fn calculate(&self, x: i32, y: i32, d: i32) -> i32 {
        self.gradient.calculate(x, y, d).rem_euclid(d.max(1))
    }
}

/// Reflect spread: distance folded as a triangle wave.
pub struct GradientReflectAdaptor<G> {
    gradient: G,
}

impl<G: GradientFunction> GradientReflectAdaptor<G> {
    pub fn new(gradient: G) -> Self {
        Self { gradient }
    }
}

impl<G: GradientFunction> GradientFunction for GradientReflectAdaptor<G> {
    #[inline]
    fn calculate(&self, x: i32, y: i32, d: i32) -> i32 {
        let d = d.max(1);
        let d2 = d << 1;
        let ret = self.gradient.calculate(x, y, d).rem_euclid(d2);
        if ret >= d {
            d2 - ret
        } else {
            ret
        }
    }
}

// ============================================================================
// SpanGradient
// ============================================================================

/// Gradient span generator.
///
/// Pixels are mapped into gradient space by the interpolator, measured by
/// the gradient function and looked up in the color function over the
/// distance range `[d1, d2]`.
pub struct SpanGradient<G, F> {
    interpolator: SpanInterpolatorLinear,
    gradient_function: G,
    color_function: F,
    d1: i32,
    d2: i32,
}

impl<G: GradientFunction, F: ColorFunction> SpanGradient<G, F> {
    pub fn new(
        interpolator: SpanInterpolatorLinear,
        gradient_function: G,
        color_function: F,
        d1: f64,
        d2: f64,
    ) -> Self {
        Self {
            interpolator,
            gradient_function,
            color_function,
            d1: iround(d1 * GRADIENT_SUBPIXEL_SCALE as f64),
            d2: iround(d2 * GRADIENT_SUBPIXEL_SCALE as f64),
        }
    }

    pub fn color_function(&self) -> &F {
        &self.color_function
    }

    pub fn d1(&self) -> f64 {
        self.d1 as f64 / GRADIENT_SUBPIXEL_SCALE as f64
    }

    pub fn d2(&self) -> f64 {
        self.d2 as f64 / GRADIENT_SUBPIXEL_SCALE as f64
    }
}

impl<G, F> SpanGenerator for SpanGradient<G, F>
where
    G: GradientFunction,
    F: ColorFunction,
{
    fn generate(&mut self, span: &mut [Rgba8], x: i32, y: i32, len: u32) {
        let dd = (self.d2 as i64 - self.d1 as i64).max(1);
        let color_size = self.color_function.size() as i64;
        self.interpolator.begin(x as f64 + 0.5, y as f64 + 0.5, len);
        for pixel in span.iter_mut().take(len as usize) {
            let (ix, iy) = self.interpolator.coordinates();
            let d = self.gradient_function.calculate(
                ix >> DOWNSCALE_SHIFT,
                iy >> DOWNSCALE_SHIFT,
                self.d2,
            );
            let d = (((d as i64 - self.d1 as i64) * color_size) / dd).clamp(0, color_size - 1);
            *pixel = self.color_function.get(d as usize);
            self.interpolator.next();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
