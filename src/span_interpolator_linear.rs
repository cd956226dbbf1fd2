//! Linear span interpolator.
//!
//! Maps destination pixels into paint space (gradient or bitmap coordinates)
//! through an affine transform. Only the two span end points are transformed;
//! pixels in between are stepped with integer DDAs.

use crate::basics::iround;
use crate::dda_line::Dda2LineInterpolator;
use crate::trans_affine::TransAffine;

/// Subpixel precision of interpolated coordinates.
pub const SUBPIXEL_SHIFT: u32 = 8;
pub const SUBPIXEL_SCALE: i32 = 1 << SUBPIXEL_SHIFT;

// Keeps end point differences inside i32.
const COORD_LIMIT: f64 = (i32::MAX / 4) as f64;

#[inline]
fn to_subpixel(v: f64) -> i32 {
    let v = v * SUBPIXEL_SCALE as f64;
    if v.is_nan() {
        return 0;
    }
    iround(v.clamp(-COORD_LIMIT, COORD_LIMIT))
}

pub struct SpanInterpolatorLinear {
    trans: TransAffine,
    li_x: Dda2LineInterpolator,
    li_y: Dda2LineInterpolator,
}

impl SpanInterpolatorLinear {
    pub fn new(trans: TransAffine) -> Self {
        Self {
            trans,
            li_x: Dda2LineInterpolator::new_forward(0, 0, 1),
            li_y: Dda2LineInterpolator::new_forward(0, 0, 1),
        }
    }

    /// Start a span of `len` pixels at `(x, y)`.
    pub fn begin(&mut self, x: f64, y: f64, len: u32) {
        let (mut tx, mut ty) = (x, y);
        self.trans.transform(&mut tx, &mut ty);
        let x1 = to_subpixel(tx);
        let y1 = to_subpixel(ty);

        let (mut tx, mut ty) = (x + len as f64, y);
        self.trans.transform(&mut tx, &mut ty);
        let x2 = to_subpixel(tx);
        let y2 = to_subpixel(ty);

        self.li_x = Dda2LineInterpolator::new_forward(x1, x2, len as i32);
        self.li_y = Dda2LineInterpolator::new_forward(y1, y2, len as i32);
    }

    #[inline]
    pub fn next(&mut self) {
        self.li_x.inc();
        self.li_y.inc();
    }

    /// Current coordinates in subpixel units.
    #[inline]
    pub fn coordinates(&self) -> (i32, i32) {
        (self.li_x.y(), self.li_y.y())
    }
}

// ============================================================================
// Tests
// ============================================================================
