//! Foundation types, constants, and rounding helpers.
//!
//! Shared by every other module: coverage and subpixel constants, the fill
//! rule, integer/pixel rectangles, and twips/pixel unit conversion.

// ============================================================================
// Rounding and conversion functions
// ============================================================================

/// Round a double to the nearest integer (round half away from zero).
#[inline]
pub fn iround(v: f64) -> i32 {
    if v < 0.0 {
        (v - 0.5) as i32
    } else {
        (v + 0.5) as i32
    }
}

/// Round a non-negative double to the nearest unsigned integer.
#[inline]
pub fn uround(v: f64) -> u32 {
    (v + 0.5) as u32
}

/// Floor a double toward negative infinity.
#[inline]
pub fn ifloor(v: f64) -> i32 {
    let i = v as i32;
    i - (i as f64 > v) as i32
}

// ============================================================================
// Coverage constants
// ============================================================================

pub type CoverType = u8;

pub const COVER_SHIFT: u32 = 8;
pub const COVER_SIZE: u32 = 1 << COVER_SHIFT;
pub const COVER_MASK: u32 = COVER_SIZE - 1;
pub const COVER_NONE: CoverType = 0;
pub const COVER_FULL: CoverType = COVER_MASK as CoverType;

// ============================================================================
// Subpixel constants
// ============================================================================

/// Number of fractional bits kept by the rasterizer for vertex coordinates.
pub const POLY_SUBPIXEL_SHIFT: u32 = 8;
pub const POLY_SUBPIXEL_SCALE: u32 = 1 << POLY_SUBPIXEL_SHIFT;
pub const POLY_SUBPIXEL_MASK: u32 = POLY_SUBPIXEL_SCALE - 1;

// ============================================================================
// Units
// ============================================================================

/// Stored geometry is in twips: 1/20 of a pixel.
pub const TWIPS_PER_PIXEL: i32 = 20;

#[inline]
pub fn twips_to_pixels(t: i32) -> f64 {
    t as f64 / TWIPS_PER_PIXEL as f64
}

#[inline]
pub fn pixels_to_twips(p: f64) -> i32 {
    iround(p * TWIPS_PER_PIXEL as f64)
}

// ============================================================================
// Filling rule
// ============================================================================

/// Policy deciding whether a point is inside a set of crossing edges.
///
/// `EvenOdd` is used for regular shapes, `NonZero` for glyph outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FillingRule {
    NonZero,
    #[default]
    EvenOdd,
}

// ============================================================================
// Points
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointD {
    pub x: f64,
    pub y: f64,
}

impl PointD {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Squared distance between two points.
#[inline]
pub fn calc_sq_distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    dx * dx + dy * dy
}

/// Distance between two points.
#[inline]
pub fn calc_distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    calc_sq_distance(x1, y1, x2, y2).sqrt()
}

/// Signed area of the triangle (x1,y1)-(x2,y2)-(x,y), doubled.
#[inline]
pub fn cross_product(x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) -> f64 {
    (x - x2) * (y2 - y1) - (y - y2) * (x2 - x1)
}

// ============================================================================
// Rect
// ============================================================================

/// A rectangle defined by two inclusive corner points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect<T: Copy> {
    pub x1: T,
    pub y1: T,
    pub x2: T,
    pub y2: T,
}

impl<T: Copy + PartialOrd> Rect<T> {
    pub fn new(x1: T, y1: T, x2: T, y2: T) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Swap corners so that x1 <= x2 and y1 <= y2.
    pub fn normalize(&mut self) -> &Self {
        if self.x1 > self.x2 {
            core::mem::swap(&mut self.x1, &mut self.x2);
        }
        if self.y1 > self.y2 {
            core::mem::swap(&mut self.y1, &mut self.y2);
        }
        self
    }

    /// Clip to the intersection with `r`. Returns `true` if the result is non-empty.
    pub fn clip(&mut self, r: &Self) -> bool {
        if self.x2 > r.x2 {
            self.x2 = r.x2;
        }
        if self.y2 > r.y2 {
            self.y2 = r.y2;
        }
        if self.x1 < r.x1 {
            self.x1 = r.x1;
        }
        if self.y1 < r.y1 {
            self.y1 = r.y1;
        }
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    pub fn is_valid(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    pub fn hit_test(&self, x: T, y: T) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }
}

pub type RectI = Rect<i32>;

impl RectI {
    /// Inclusive pixel rectangle covering a whole `width` x `height` surface.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32 - 1, height as i32 - 1)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iround() {
        assert_eq!(iround(0.4), 0);
        assert_eq!(iround(0.5), 1);
        assert_eq!(iround(-0.5), -1);
        assert_eq!(iround(-1.4), -1);
    }

    #[test]
    fn test_ifloor() {
        assert_eq!(ifloor(1.7), 1);
        assert_eq!(ifloor(-1.2), -2);
        assert_eq!(ifloor(-2.0), -2);
    }

    #[test]
    fn test_twips_conversion() {
        assert!((twips_to_pixels(20) - 1.0).abs() < 1e-12);
        assert!((twips_to_pixels(-30) + 1.5).abs() < 1e-12);
        assert_eq!(pixels_to_twips(2.5), 50);
    }

    #[test]
    fn test_rect_clip() {
        let mut r = RectI::new(-5, -5, 50, 50);
        assert!(r.clip(&RectI::full(20, 10)));
        assert_eq!(r, RectI::new(0, 0, 19, 9));

        let mut outside = RectI::new(30, 30, 40, 40);
        assert!(!outside.clip(&RectI::full(20, 10)));
    }

    #[test]
    fn test_rect_normalize_and_hit() {
        let mut r = Rect::new(10.0, 8.0, 2.0, 1.0);
        r.normalize();
        assert_eq!(r, Rect::new(2.0, 1.0, 10.0, 8.0));
        assert!(r.hit_test(5.0, 5.0));
        assert!(!r.hit_test(11.0, 5.0));
    }

    #[test]
    fn test_cross_product_sign() {
        // Turning toward +y versus toward -y
        assert!(cross_product(0.0, 0.0, 10.0, 0.0, 10.0, 10.0) < 0.0);
        assert!(cross_product(0.0, 0.0, 10.0, 0.0, 10.0, -10.0) > 0.0);
    }

    #[test]
    fn test_default_fill_rule() {
        assert_eq!(FillingRule::default(), FillingRule::EvenOdd);
    }
}
