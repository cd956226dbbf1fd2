//! Per-channel color transform.
//!
//! Four 8.8 fixed-point multipliers and four additive terms, one pair per
//! RGBA channel. Arithmetic widens to `i32` so products never overflow.

use crate::color::Rgba8;

/// Color transform `out = clamp((in * mult >> 8) + add, 0, 255)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwfCxForm {
    pub ra: i16,
    pub ga: i16,
    pub ba: i16,
    pub aa: i16,
    pub rb: i16,
    pub gb: i16,
    pub bb: i16,
    pub ab: i16,
}

impl Default for SwfCxForm {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[inline]
fn mul8(a: i16, b: i16) -> i16 {
    ((a as i32 * b as i32) >> 8) as i16
}

#[inline]
fn add_scaled(add: i16, mult: i16, other_add: i16) -> i16 {
    (add as i32 + ((mult as i32 * other_add as i32) >> 8)) as i16
}

#[inline]
fn apply(input: u8, mult: i16, add: i16) -> u8 {
    let v = ((input as i16 as i32 * mult as i32) >> 8) + add as i32;
    v.clamp(0, 255) as u8
}

impl SwfCxForm {
    pub const IDENTITY: SwfCxForm = SwfCxForm {
        ra: 256,
        ga: 256,
        ba: 256,
        aa: 256,
        rb: 0,
        gb: 0,
        bb: 0,
        ab: 0,
    };

    /// Multipliers only, in 8.8 fixed point.
    pub fn with_mult(r: i16, g: i16, b: i16, a: i16) -> Self {
        Self {
            ra: r,
            ga: g,
            ba: b,
            aa: a,
            ..Self::IDENTITY
        }
    }

    /// Additive terms only.
    pub fn with_add(r: i16, g: i16, b: i16, a: i16) -> Self {
        Self {
            rb: r,
            gb: g,
            bb: b,
            ab: a,
            ..Self::IDENTITY
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// True when every transformed color ends with zero alpha.
    pub fn is_invisible(&self) -> bool {
        // Largest reachable alpha is 255 * max(aa, 0) >> 8 plus ab.
        let max_alpha = ((255 * self.aa.max(0) as i32) >> 8) + self.ab as i32;
        max_alpha <= 0
    }

    /// Compose with `other` applied first.
    pub fn concatenate(&mut self, other: &SwfCxForm) -> &mut Self {
        self.rb = add_scaled(self.rb, self.ra, other.rb);
        self.gb = add_scaled(self.gb, self.ga, other.gb);
        self.bb = add_scaled(self.bb, self.ba, other.bb);
        self.ab = add_scaled(self.ab, self.aa, other.ab);

        self.ra = mul8(self.ra, other.ra);
        self.ga = mul8(self.ga, other.ga);
        self.ba = mul8(self.ba, other.ba);
        self.aa = mul8(self.aa, other.aa);
        self
    }

    /// Non-mutating [`concatenate`](Self::concatenate).
    pub fn concatenated(&self, other: &SwfCxForm) -> SwfCxForm {
        let mut r = *self;
        r.concatenate(other);
        r
    }

    /// Transform each channel independently.
    pub fn transform(&self, r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8, u8) {
        (
            apply(r, self.ra, self.rb),
            apply(g, self.ga, self.gb),
            apply(b, self.ba, self.bb),
            apply(a, self.aa, self.ab),
        )
    }

    pub fn transform_rgba(&self, c: Rgba8) -> Rgba8 {
        let (r, g, b, a) = self.transform(c.r, c.g, c.b, c.a);
        Rgba8::new(r, g, b, a)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_preserves_every_color() {
        let cx = SwfCxForm::default();
        assert!(cx.is_identity());
        for v in [0u8, 1, 17, 127, 128, 200, 254, 255] {
            let c = Rgba8::new(v, 255 - v, v / 2, v);
            assert_eq!(cx.transform_rgba(c), c);
        }
    }

    #[test]
    fn test_transform_clamps() {
        let cx = SwfCxForm {
            rb: 100,
            gb: -300,
            ..SwfCxForm::with_mult(512, 256, 0, 128)
        };
        let out = cx.transform_rgba(Rgba8::new(200, 50, 255, 255));
        assert_eq!(out.r, 255);
        assert_eq!(out.g, 0);
        assert_eq!(out.b, 0);
        assert_eq!(out.a, 127);
    }

    #[test]
    fn test_concatenate_applies_other_first() {
        let outer = SwfCxForm::with_mult(128, 256, 256, 256);
        let inner = SwfCxForm::with_add(100, 0, 0, 0);
        let combined = outer.concatenated(&inner);

        let c = Rgba8::new(50, 0, 0, 255);
        let step = outer.transform_rgba(inner.transform_rgba(c));
        assert_eq!(combined.transform_rgba(c), step);
        assert_eq!(step.r, 75);
    }

    #[test]
    fn test_concatenate_identity() {
        let cx = SwfCxForm {
            ab: -20,
            ..SwfCxForm::with_mult(300, 200, 100, 256)
        };
        assert_eq!(cx.concatenated(&SwfCxForm::IDENTITY), cx);
        assert_eq!(SwfCxForm::IDENTITY.concatenated(&cx), cx);
    }

    #[test]
    fn test_invisible() {
        assert!(SwfCxForm::with_mult(256, 256, 256, 0).is_invisible());
        assert!(!SwfCxForm::IDENTITY.is_invisible());
        let faded = SwfCxForm {
            ab: -255,
            ..SwfCxForm::IDENTITY
        };
        assert!(faded.is_invisible());
    }
}
