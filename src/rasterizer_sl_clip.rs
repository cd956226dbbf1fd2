//! Viewport clipping in front of the cell rasterizer.
//!
//! Segments are clipped against the surface box in 24.8 fixed point. Parts
//! left or right of the box are not dropped but projected onto the box edge,
//! so the winding of shapes extending past the surface stays intact.

use crate::basics::{iround, Rect, POLY_SUBPIXEL_SCALE};

/// Cell accumulator fed by the clipper, in 24.8 fixed point.
pub trait CellLine {
    fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32);
}

/// Largest fixed point coordinate magnitude. Differences of two saturated
/// coordinates still fit in an `i32`.
pub const POLY_MAX_COORD: i32 = (1 << 30) - 1;

/// Convert a pixel coordinate to 24.8 fixed point, saturating at
/// [`POLY_MAX_COORD`]. NaN maps to zero.
#[inline]
pub fn upscale(v: f64) -> i32 {
    let limit = POLY_MAX_COORD as f64;
    let v = v * POLY_SUBPIXEL_SCALE as f64;
    if v.is_nan() {
        return 0;
    }
    iround(v.clamp(-limit, limit))
}

#[inline]
fn mul_div(a: i32, b: i32, c: i32) -> i32 {
    iround(a as f64 * b as f64 / c as f64)
}

#[inline]
fn clipping_flags(x: i32, y: i32, clip_box: &Rect<i32>) -> u32 {
    (x > clip_box.x2) as u32
        | (((y > clip_box.y2) as u32) << 1)
        | (((x < clip_box.x1) as u32) << 2)
        | (((y < clip_box.y1) as u32) << 3)
}

#[inline]
fn clipping_flags_y(y: i32, clip_box: &Rect<i32>) -> u32 {
    (((y > clip_box.y2) as u32) << 1) | (((y < clip_box.y1) as u32) << 3)
}

// ============================================================================
// RasterizerSlClip
// ============================================================================

pub struct RasterizerSlClip {
    clip_box: Rect<i32>,
    x1: i32,
    y1: i32,
    f1: u32,
    clipping: bool,
}

impl RasterizerSlClip {
    pub fn new() -> Self {
        Self {
            clip_box: Rect::new(0, 0, 0, 0),
            x1: 0,
            y1: 0,
            f1: 0,
            clipping: false,
        }
    }

    pub fn reset_clipping(&mut self) {
        self.clipping = false;
    }

    /// Set the clipping rectangle in 24.8 fixed point.
    pub fn clip_box(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.clip_box = Rect::new(x1, y1, x2, y2);
        self.clip_box.normalize();
        self.clipping = true;
    }

    /// Current pen position in 24.8 fixed point.
    #[inline]
    pub fn position(&self) -> (i32, i32) {
        (self.x1, self.y1)
    }

    pub fn move_to(&mut self, x1: i32, y1: i32) {
        self.x1 = x1;
        self.y1 = y1;
        if self.clipping {
            self.f1 = clipping_flags(x1, y1, &self.clip_box);
        }
    }

    /// Clip the segment from the pen to `(x2, y2)` and emit what remains.
    pub fn line_to<R: CellLine>(&mut self, ras: &mut R, x2: i32, y2: i32) {
        if !self.clipping {
            ras.line(self.x1, self.y1, x2, y2);
            self.x1 = x2;
            self.y1 = y2;
            return;
        }

        let f2 = clipping_flags(x2, y2, &self.clip_box);

        // Invisible by Y on the same side
        if (self.f1 & 10) == (f2 & 10) && (self.f1 & 10) != 0 {
            self.x1 = x2;
            self.y1 = y2;
            self.f1 = f2;
            return;
        }

        let (x1, y1, f1) = (self.x1, self.y1, self.f1);
        let cb = self.clip_box;

        match ((f1 & 5) << 1) | (f2 & 5) {
            0 => {
                self.line_clip_y(ras, x1, y1, x2, y2, f1, f2);
            }
            1 => {
                // x2 > clip.x2
                let y3 = y1 + mul_div(cb.x2 - x1, y2 - y1, x2 - x1);
                let f3 = clipping_flags_y(y3, &cb);
                self.line_clip_y(ras, x1, y1, cb.x2, y3, f1, f3);
                self.line_clip_y(ras, cb.x2, y3, cb.x2, y2, f3, f2);
            }
            2 => {
                // x1 > clip.x2
                let y3 = y1 + mul_div(cb.x2 - x1, y2 - y1, x2 - x1);
                let f3 = clipping_flags_y(y3, &cb);
                self.line_clip_y(ras, cb.x2, y1, cb.x2, y3, f1, f3);
                self.line_clip_y(ras, cb.x2, y3, x2, y2, f3, f2);
            }
            3 => {
                self.line_clip_y(ras, cb.x2, y1, cb.x2, y2, f1, f2);
            }
            4 => {
                // x2 < clip.x1
                let y3 = y1 + mul_div(cb.x1 - x1, y2 - y1, x2 - x1);
                let f3 = clipping_flags_y(y3, &cb);
                self.line_clip_y(ras, x1, y1, cb.x1, y3, f1, f3);
                self.line_clip_y(ras, cb.x1, y3, cb.x1, y2, f3, f2);
            }
            6 => {
                // x1 > clip.x2 && x2 < clip.x1
                let y3 = y1 + mul_div(cb.x2 - x1, y2 - y1, x2 - x1);
                let y4 = y1 + mul_div(cb.x1 - x1, y2 - y1, x2 - x1);
                let f3 = clipping_flags_y(y3, &cb);
                let f4 = clipping_flags_y(y4, &cb);
                self.line_clip_y(ras, cb.x2, y1, cb.x2, y3, f1, f3);
                self.line_clip_y(ras, cb.x2, y3, cb.x1, y4, f3, f4);
                self.line_clip_y(ras, cb.x1, y4, cb.x1, y2, f4, f2);
            }
            8 => {
                // x1 < clip.x1
                let y3 = y1 + mul_div(cb.x1 - x1, y2 - y1, x2 - x1);
                let f3 = clipping_flags_y(y3, &cb);
                self.line_clip_y(ras, cb.x1, y1, cb.x1, y3, f1, f3);
                self.line_clip_y(ras, cb.x1, y3, x2, y2, f3, f2);
            }
            9 => {
                // x1 < clip.x1 && x2 > clip.x2
                let y3 = y1 + mul_div(cb.x1 - x1, y2 - y1, x2 - x1);
                let y4 = y1 + mul_div(cb.x2 - x1, y2 - y1, x2 - x1);
                let f3 = clipping_flags_y(y3, &cb);
                let f4 = clipping_flags_y(y4, &cb);
                self.line_clip_y(ras, cb.x1, y1, cb.x1, y3, f1, f3);
                self.line_clip_y(ras, cb.x1, y3, cb.x2, y4, f3, f4);
                self.line_clip_y(ras, cb.x2, y4, cb.x2, y2, f4, f2);
            }
            12 => {
                self.line_clip_y(ras, cb.x1, y1, cb.x1, y2, f1, f2);
            }
            _ => {}
        }
        self.f1 = f2;
        self.x1 = x2;
        self.y1 = y2;
    }

    #[allow(clippy::too_many_arguments)]
    fn line_clip_y<R: CellLine>(
        &self,
        ras: &mut R,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        f1: u32,
        f2: u32,
    ) {
        let f1 = f1 & 10;
        let f2 = f2 & 10;
        if (f1 | f2) == 0 {
            ras.line(x1, y1, x2, y2);
        } else if f1 != f2 {
            let cb = &self.clip_box;
            let (mut tx1, mut ty1, mut tx2, mut ty2) = (x1, y1, x2, y2);
            if f1 & 8 != 0 {
                tx1 = x1 + mul_div(cb.y1 - y1, x2 - x1, y2 - y1);
                ty1 = cb.y1;
            }
            if f1 & 2 != 0 {
                tx1 = x1 + mul_div(cb.y2 - y1, x2 - x1, y2 - y1);
                ty1 = cb.y2;
            }
            if f2 & 8 != 0 {
                tx2 = x1 + mul_div(cb.y1 - y1, x2 - x1, y2 - y1);
                ty2 = cb.y1;
            }
            if f2 & 2 != 0 {
                tx2 = x1 + mul_div(cb.y2 - y1, x2 - x1, y2 - y1);
                ty2 = cb.y2;
            }
            ras.line(tx1, ty1, tx2, ty2);
        }
    }
}

impl Default for RasterizerSlClip {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        lines: Vec<(i32, i32, i32, i32)>,
    }

    impl CellLine for Recorder {
        fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
            self.lines.push((x1, y1, x2, y2));
        }
    }

    #[test]
    fn test_no_clipping_passes_through() {
        let mut clip = RasterizerSlClip::new();
        let mut rec = Recorder::default();
        clip.move_to(-500, -500);
        clip.line_to(&mut rec, 500, 500);
        assert_eq!(rec.lines, vec![(-500, -500, 500, 500)]);
        assert_eq!(clip.position(), (500, 500));
    }

    #[test]
    fn test_left_of_box_projects_onto_edge() {
        let mut clip = RasterizerSlClip::new();
        clip.clip_box(0, 0, 1000, 1000);
        let mut rec = Recorder::default();
        clip.move_to(-100, 100);
        clip.line_to(&mut rec, -100, 900);
        // Kept as a vertical line on x = 0 so winding is preserved
        assert_eq!(rec.lines, vec![(0, 100, 0, 900)]);
    }

    #[test]
    fn test_above_box_is_dropped() {
        let mut clip = RasterizerSlClip::new();
        clip.clip_box(0, 0, 1000, 1000);
        let mut rec = Recorder::default();
        clip.move_to(100, -300);
        clip.line_to(&mut rec, 900, -100);
        assert!(rec.lines.is_empty());
    }

    #[test]
    fn test_crossing_right_edge_splits() {
        let mut clip = RasterizerSlClip::new();
        clip.clip_box(0, 0, 1000, 1000);
        let mut rec = Recorder::default();
        clip.move_to(500, 0);
        clip.line_to(&mut rec, 1500, 1000);
        assert_eq!(rec.lines, vec![(500, 0, 1000, 500), (1000, 500, 1000, 1000)]);
    }

    #[test]
    fn test_upscale() {
        assert_eq!(upscale(1.0), 256);
        assert_eq!(upscale(-0.5), -128);
    }

    #[test]
    fn test_upscale_saturates() {
        assert_eq!(upscale(1e12), POLY_MAX_COORD);
        assert_eq!(upscale(-1e12), -POLY_MAX_COORD);
        assert_eq!(upscale(f64::INFINITY), POLY_MAX_COORD);
        assert_eq!(upscale(f64::NAN), 0);
    }

    #[test]
    fn test_extreme_segment_is_clipped() {
        let mut clip = RasterizerSlClip::new();
        clip.clip_box(0, 0, 1000, 1000);
        let mut rec = Recorder::default();
        clip.move_to(upscale(-1e15), upscale(-1e15));
        clip.line_to(&mut rec, upscale(1e15), upscale(1e15));
        clip.line_to(&mut rec, upscale(-1e15), upscale(1e15));
        assert!(!rec.lines.is_empty());
        for &(x1, y1, x2, y2) in &rec.lines {
            assert!((0..=1000).contains(&x1) && (0..=1000).contains(&x2));
            assert!((0..=1000).contains(&y1) && (0..=1000).contains(&y2));
        }
    }
}
