//! 16.16 fixed-point affine matrix in twips.
//!
//! All coefficient products are carried out in `i64` and truncated back to
//! `i32` explicitly. Values that exceed the 32-bit range wrap modulo 2^32
//! through an unsigned cast, matching legacy players, instead of relying on
//! signed overflow.

use crate::geometry::{Point, SwfRect};
use crate::trans_affine::TransAffine;

/// 16.16 fixed-point multiply with rounding.
#[inline]
pub fn fixed16_mul(a: i32, b: i32) -> i32 {
    ((a as i64 * b as i64 + 0x8000) >> 16) as i32
}

/// Convert a double to 16.16, wrapping modulo 2^32 when out of range.
#[inline]
pub fn double_to_fixed16(v: f64) -> i32 {
    truncate_to_i32(v * 65536.0)
}

#[inline]
fn truncate_to_i32(v: f64) -> i32 {
    if !v.is_finite() {
        return 0;
    }
    (v as i64) as u32 as i32
}

#[inline]
fn wrap_sum(parts: &[i64]) -> i32 {
    parts.iter().fold(0u64, |acc, &p| acc.wrapping_add(p as u64)) as u32 as i32
}

// ============================================================================
// SwfMatrix
// ============================================================================

/// Affine matrix `x' = a*x + c*y + tx`, `y' = b*x + d*y + ty`.
///
/// `a`..`d` are 16.16 fixed point, `tx`/`ty` are twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwfMatrix {
    pub a: i32,
    pub b: i32,
    pub c: i32,
    pub d: i32,
    pub tx: i32,
    pub ty: i32,
}

impl Default for SwfMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl SwfMatrix {
    pub const IDENTITY: SwfMatrix = SwfMatrix {
        a: 65536,
        b: 0,
        c: 0,
        d: 65536,
        tx: 0,
        ty: 0,
    };

    pub const fn new(a: i32, b: i32, c: i32, d: i32, tx: i32, ty: i32) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    pub fn translation(tx: i32, ty: i32) -> Self {
        Self {
            tx,
            ty,
            ..Self::IDENTITY
        }
    }

    pub fn scaling(x: f64, y: f64) -> Self {
        let mut m = Self::IDENTITY;
        m.set_scale_rotation(x, y, 0.0);
        m
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn set_identity(&mut self) {
        *self = Self::IDENTITY;
    }

    /// `self = self * m`: the result applies `m` first, then the old `self`.
    pub fn concatenate(&mut self, m: &SwfMatrix) -> &mut Self {
        let a = fixed16_mul(self.a, m.a) as i64 + fixed16_mul(self.c, m.b) as i64;
        let b = fixed16_mul(self.b, m.a) as i64 + fixed16_mul(self.d, m.b) as i64;
        let c = fixed16_mul(self.a, m.c) as i64 + fixed16_mul(self.c, m.d) as i64;
        let d = fixed16_mul(self.b, m.c) as i64 + fixed16_mul(self.d, m.d) as i64;
        let tx = wrap_sum(&[
            fixed16_mul(self.a, m.tx) as i64,
            fixed16_mul(self.c, m.ty) as i64,
            self.tx as i64,
        ]);
        let ty = wrap_sum(&[
            fixed16_mul(self.b, m.tx) as i64,
            fixed16_mul(self.d, m.ty) as i64,
            self.ty as i64,
        ]);
        self.a = wrap_sum(&[a]);
        self.b = wrap_sum(&[b]);
        self.c = wrap_sum(&[c]);
        self.d = wrap_sum(&[d]);
        self.tx = tx;
        self.ty = ty;
        self
    }

    /// Non-mutating [`concatenate`](Self::concatenate).
    pub fn concatenated(&self, m: &SwfMatrix) -> SwfMatrix {
        let mut r = *self;
        r.concatenate(m);
        r
    }

    /// Concatenate a translation applied before `self`.
    pub fn concatenate_translation(&mut self, x: i32, y: i32) -> &mut Self {
        self.tx = wrap_sum(&[
            self.tx as i64,
            fixed16_mul(self.a, x) as i64,
            fixed16_mul(self.c, y) as i64,
        ]);
        self.ty = wrap_sum(&[
            self.ty as i64,
            fixed16_mul(self.b, x) as i64,
            fixed16_mul(self.d, y) as i64,
        ]);
        self
    }

    /// Concatenate a scale applied before `self`.
    pub fn concatenate_scale(&mut self, x: f64, y: f64) -> &mut Self {
        let fx = double_to_fixed16(x);
        let fy = double_to_fixed16(y);
        self.a = fixed16_mul(self.a, fx);
        self.b = fixed16_mul(self.b, fx);
        self.c = fixed16_mul(self.c, fy);
        self.d = fixed16_mul(self.d, fy);
        self
    }

    /// Invert in place. A zero determinant resets to identity.
    pub fn invert(&mut self) -> &mut Self {
        let det = self.a as i64 * self.d as i64 - self.b as i64 * self.c as i64;
        if det == 0 {
            self.set_identity();
            return self;
        }
        let dd = 65536.0 * 65536.0 / det as f64;

        let t0 = truncate_to_i32(self.d as f64 * dd);
        self.d = truncate_to_i32(self.a as f64 * dd);
        self.c = truncate_to_i32(-(self.c as f64) * dd);
        self.b = truncate_to_i32(-(self.b as f64) * dd);

        let t4 = -(fixed16_mul(self.tx, t0) as i64 + fixed16_mul(self.ty, self.c) as i64);
        let ty = -(fixed16_mul(self.tx, self.b) as i64 + fixed16_mul(self.ty, self.d) as i64);
        self.a = t0;
        self.tx = wrap_sum(&[t4]);
        self.ty = wrap_sum(&[ty]);
        self
    }

    /// Non-mutating [`invert`](Self::invert).
    pub fn inverted(&self) -> SwfMatrix {
        let mut r = *self;
        r.invert();
        r
    }

    /// Transform a point in twips.
    pub fn transform(&self, p: Point) -> Point {
        Point {
            x: wrap_sum(&[
                fixed16_mul(self.a, p.x) as i64,
                fixed16_mul(self.c, p.y) as i64,
                self.tx as i64,
            ]),
            y: wrap_sum(&[
                fixed16_mul(self.b, p.x) as i64,
                fixed16_mul(self.d, p.y) as i64,
                self.ty as i64,
            ]),
        }
    }

    /// Map a point through the inverse of this matrix.
    pub fn inverse_transform(&self, p: Point) -> Point {
        self.inverted().transform(p)
    }

    /// Transform all four corners and re-bound. Null rects stay null.
    pub fn transform_rect(&self, r: &SwfRect) -> SwfRect {
        if r.is_null() {
            return *r;
        }
        let corners = [
            Point::new(r.x_min, r.y_min),
            Point::new(r.x_max, r.y_min),
            Point::new(r.x_max, r.y_max),
            Point::new(r.x_min, r.y_max),
        ];
        let mut out = SwfRect::null();
        for p in corners {
            out.expand_to_point(self.transform(p));
        }
        out
    }

    /// The four linear coefficients as doubles.
    #[inline]
    pub fn coefficients(&self) -> (f64, f64, f64, f64) {
        (
            self.a as f64 / 65536.0,
            self.b as f64 / 65536.0,
            self.c as f64 / 65536.0,
            self.d as f64 / 65536.0,
        )
    }

    pub fn get_x_scale(&self) -> f64 {
        let (a, b) = (self.a as f64, self.b as f64);
        (a * a + b * b).sqrt() / 65536.0
    }

    pub fn get_y_scale(&self) -> f64 {
        let (c, d) = (self.c as f64, self.d as f64);
        (c * c + d * d).sqrt() / 65536.0
    }

    /// Rotation of the x axis, in radians.
    pub fn get_rotation(&self) -> f64 {
        (self.b as f64).atan2(self.a as f64)
    }

    pub fn set_scale_rotation(&mut self, x_scale: f64, y_scale: f64, angle: f64) -> &mut Self {
        let (sin, cos) = angle.sin_cos();
        self.a = double_to_fixed16(x_scale * cos);
        self.c = double_to_fixed16(y_scale * -sin);
        self.b = double_to_fixed16(x_scale * sin);
        self.d = double_to_fixed16(y_scale * cos);
        self
    }

    pub fn set_x_scale(&mut self, x_scale: f64) -> &mut Self {
        let rot_x = (self.b as f64).atan2(self.a as f64);
        self.a = double_to_fixed16(x_scale * rot_x.cos());
        self.b = double_to_fixed16(x_scale * rot_x.sin());
        self
    }

    pub fn set_y_scale(&mut self, y_scale: f64) -> &mut Self {
        let rot_y = (-(self.c as f64)).atan2(self.d as f64);
        self.c = double_to_fixed16(y_scale * rot_y.sin()).wrapping_neg();
        self.d = double_to_fixed16(y_scale * rot_y.cos());
        self
    }

    /// Replace the rotation, keeping scale and skew.
    pub fn set_rotation(&mut self, rotation: f64) -> &mut Self {
        let rot_x = (self.b as f64).atan2(self.a as f64);
        let rot_y = (-(self.c as f64)).atan2(self.d as f64);
        let scale_x = self.get_x_scale();
        let scale_y = self.get_y_scale();
        self.a = double_to_fixed16(scale_x * rotation.cos());
        self.b = double_to_fixed16(scale_x * rotation.sin());
        self.c = double_to_fixed16(scale_y * (rot_y - rot_x + rotation).sin()).wrapping_neg();
        self.d = double_to_fixed16(scale_y * (rot_y - rot_x + rotation).cos());
        self
    }

    /// Set to the component-wise interpolation between `m1` and `m2`.
    pub fn set_lerp(&mut self, m1: &SwfMatrix, m2: &SwfMatrix, t: f64) -> &mut Self {
        let lerp = |x: i32, y: i32| -> i32 {
            truncate_to_i32((x as f64 + (y as f64 - x as f64) * t).round())
        };
        self.a = lerp(m1.a, m2.a);
        self.b = lerp(m1.b, m2.b);
        self.c = lerp(m1.c, m2.c);
        self.d = lerp(m1.d, m2.d);
        self.tx = lerp(m1.tx, m2.tx);
        self.ty = lerp(m1.ty, m2.ty);
        self
    }

    /// Convert to a floating-point affine that still maps twips to twips.
    pub fn to_affine(&self) -> TransAffine {
        let (a, b, c, d) = self.coefficients();
        TransAffine::new_custom(a, b, c, d, self.tx as f64, self.ty as f64)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SwfMatrix {
        let mut m = SwfMatrix::IDENTITY;
        m.set_scale_rotation(1.5, 0.75, 0.3);
        m.tx = 400;
        m.ty = -120;
        m
    }

    fn close(a: &SwfMatrix, b: &SwfMatrix, tol: i32) -> bool {
        (a.a - b.a).abs() <= tol
            && (a.b - b.b).abs() <= tol
            && (a.c - b.c).abs() <= tol
            && (a.d - b.d).abs() <= tol
            && (a.tx - b.tx).abs() <= tol
            && (a.ty - b.ty).abs() <= tol
    }

    #[test]
    fn test_fixed16_mul() {
        assert_eq!(fixed16_mul(65536, 65536), 65536);
        assert_eq!(fixed16_mul(32768, 100), 50);
        assert_eq!(fixed16_mul(-65536, 3), -3);
        // Wide intermediate: no overflow on large operands
        assert_eq!(fixed16_mul(i32::MAX, 65536), i32::MAX);
    }

    #[test]
    fn test_identity_is_unit() {
        let m = sample();
        assert_eq!(m.concatenated(&SwfMatrix::IDENTITY), m);
        assert_eq!(SwfMatrix::IDENTITY.concatenated(&m), m);
    }

    #[test]
    fn test_concatenate_applies_other_first() {
        let mut m = SwfMatrix::translation(100, 0);
        m.concatenate(&SwfMatrix::scaling(2.0, 2.0));
        // Scale first, then translate
        assert_eq!(m.transform(Point::new(10, 10)), Point::new(120, 20));
    }

    #[test]
    fn test_concatenate_associative() {
        let m1 = sample();
        let mut m2 = SwfMatrix::scaling(0.5, 2.0);
        m2.tx = 33;
        m2.ty = 77;
        let m3 = SwfMatrix::translation(-250, 60);

        let left = m1.concatenated(&m2).concatenated(&m3);
        let right = m1.concatenated(&m2.concatenated(&m3));
        assert!(close(&left, &right, 4), "{left:?} vs {right:?}");
    }

    #[test]
    fn test_invert_roundtrip() {
        let m = sample();
        let back = m.inverted().inverted();
        assert!(close(&m, &back, 8), "{m:?} vs {back:?}");

        let p = Point::new(1000, -2000);
        let q = m.inverted().transform(m.transform(p));
        assert!((q.x - p.x).abs() <= 2 && (q.y - p.y).abs() <= 2);
    }

    #[test]
    fn test_invert_degenerate_is_identity() {
        let mut m = SwfMatrix::new(65536, 131072, 32768, 65536, 50, 50);
        m.invert();
        assert!(m.is_identity());

        let mut zero = SwfMatrix::new(0, 0, 0, 0, 10, 10);
        zero.invert();
        assert!(zero.is_identity());
    }

    #[test]
    fn test_transform_rect() {
        let m = SwfMatrix::scaling(2.0, 3.0);
        let r = m.transform_rect(&SwfRect::new(-10, -10, 10, 20));
        assert_eq!(r, SwfRect::new(-20, -30, 20, 60));
        assert!(m.transform_rect(&SwfRect::null()).is_null());
    }

    #[test]
    fn test_scale_rotation_decomposition() {
        let mut m = SwfMatrix::IDENTITY;
        m.set_scale_rotation(2.0, 3.0, std::f64::consts::FRAC_PI_4);
        assert!((m.get_x_scale() - 2.0).abs() < 1e-4);
        assert!((m.get_y_scale() - 3.0).abs() < 1e-4);
        assert!((m.get_rotation() - std::f64::consts::FRAC_PI_4).abs() < 1e-4);

        m.set_rotation(0.0);
        assert!(m.get_rotation().abs() < 1e-4);
        assert!((m.get_x_scale() - 2.0).abs() < 1e-4);

        m.set_x_scale(4.0);
        m.set_y_scale(0.5);
        assert!((m.get_x_scale() - 4.0).abs() < 1e-4);
        assert!((m.get_y_scale() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_concatenate_translation_and_scale() {
        let mut m = SwfMatrix::scaling(2.0, 2.0);
        m.concatenate_translation(10, 5);
        assert_eq!(m.transform(Point::new(0, 0)), Point::new(20, 10));

        let mut s = SwfMatrix::IDENTITY;
        s.concatenate_scale(0.5, 4.0);
        assert_eq!(s.transform(Point::new(100, 100)), Point::new(50, 400));
    }

    #[test]
    fn test_set_lerp_endpoints() {
        let m1 = sample();
        let m2 = SwfMatrix::translation(-900, 4000);
        let mut m = SwfMatrix::IDENTITY;
        m.set_lerp(&m1, &m2, 0.0);
        assert_eq!(m, m1);
        m.set_lerp(&m1, &m2, 1.0);
        assert_eq!(m, m2);
        m.set_lerp(&m1, &m2, 0.5);
        assert_eq!(m.tx, (m1.tx + m2.tx) / 2);
    }

    #[test]
    fn test_translation_wraps_without_panic() {
        let m = SwfMatrix::translation(i32::MAX, 0);
        let p = m.transform(Point::new(1, 0));
        assert_eq!(p.x, i32::MIN);
    }

    #[test]
    fn test_to_affine() {
        let m = SwfMatrix::new(65536 * 2, 0, 0, 65536, 40, 60);
        let a = m.to_affine();
        let (mut x, mut y) = (1.0, 1.0);
        a.transform(&mut x, &mut y);
        assert!((x - 42.0).abs() < 1e-9);
        assert!((y - 61.0).abs() < 1e-9);
    }
}
