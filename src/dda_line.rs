//! Integer line interpolation.
//!
//! Steps an integer value from `y1` to `y2` over a fixed number of steps,
//! distributing the rounding error Bresenham-style. Span interpolators use
//! it to walk transformed coordinates along a scanline.

/// Integer DDA interpolator with remainder tracking.
#[derive(Debug, Clone)]
pub struct Dda2LineInterpolator {
    cnt: i32,
    lft: i32,
    rem: i32,
    mod_val: i32,
    y: i32,
}

impl Dda2LineInterpolator {
    /// Forward-adjusted line from `y1` to `y2` over `count` steps.
    pub fn new_forward(y1: i32, y2: i32, count: i32) -> Self {
        let cnt = count.max(1);
        let mut lft = (y2 - y1) / cnt;
        let mut rem = (y2 - y1) % cnt;
        let mut mod_val = rem;

        if mod_val <= 0 {
            mod_val += cnt;
            rem += cnt;
            lft -= 1;
        }
        mod_val -= cnt;

        Self {
            cnt,
            lft,
            rem,
            mod_val,
            y: y1,
        }
    }

    #[inline]
    pub fn inc(&mut self) {
        self.mod_val += self.rem;
        self.y += self.lft;
        if self.mod_val > 0 {
            self.mod_val -= self.cnt;
            self.y += 1;
        }
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.y
    }
}

// ============================================================================
// Tests
// ============================================================================
