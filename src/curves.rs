//! Quadratic Bezier flattening.
//!
//! Shape edges are quadratic only. Curves are flattened in pixel space by
//! recursive de Casteljau subdivision, so the tolerance follows the output
//! resolution rather than the twip coordinates of the model.

use crate::basics::{calc_sq_distance, PointD};
use crate::geometry::Path;
use crate::trans_affine::TransAffine;

// ============================================================================
// Constants
// ============================================================================

const CURVE_COLLINEARITY_EPSILON: f64 = 1e-30;
const CURVE_RECURSION_LIMIT: u32 = 32;

// ============================================================================
// Curve3Div
// ============================================================================

/// Recursive subdivision quadratic Bezier flattener.
pub struct Curve3Div {
    approximation_scale: f64,
    distance_tolerance_square: f64,
    points: Vec<PointD>,
}

impl Curve3Div {
    pub fn new() -> Self {
        Self {
            approximation_scale: 1.0,
            distance_tolerance_square: 0.0,
            points: Vec::new(),
        }
    }

    pub fn new_with_points(x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) -> Self {
        let mut c = Self::new();
        c.init(x1, y1, x2, y2, x3, y3);
        c
    }

    /// Flatten the curve from `(x1, y1)` through control `(x2, y2)` to
    /// `(x3, y3)`. Both end points are included in [`points`](Self::points).
    pub fn init(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        self.points.clear();
        self.distance_tolerance_square = 0.5 / self.approximation_scale;
        self.distance_tolerance_square *= self.distance_tolerance_square;
        self.points.push(PointD::new(x1, y1));
        self.recursive_bezier(x1, y1, x2, y2, x3, y3, 0);
        self.points.push(PointD::new(x3, y3));
    }

    pub fn set_approximation_scale(&mut self, s: f64) {
        self.approximation_scale = if s > 0.0 { s } else { 1.0 };
    }

    pub fn approximation_scale(&self) -> f64 {
        self.approximation_scale
    }

    pub fn points(&self) -> &[PointD] {
        &self.points
    }

    #[allow(clippy::too_many_arguments)]
    fn recursive_bezier(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x3: f64,
        y3: f64,
        level: u32,
    ) {
        if level > CURVE_RECURSION_LIMIT {
            return;
        }

        let x12 = (x1 + x2) / 2.0;
        let y12 = (y1 + y2) / 2.0;
        let x23 = (x2 + x3) / 2.0;
        let y23 = (y2 + y3) / 2.0;
        let x123 = (x12 + x23) / 2.0;
        let y123 = (y12 + y23) / 2.0;

        let dx = x3 - x1;
        let dy = y3 - y1;
        let d = ((x2 - x3) * dy - (y2 - y3) * dx).abs();

        if d > CURVE_COLLINEARITY_EPSILON {
            if d * d <= self.distance_tolerance_square * (dx * dx + dy * dy) {
                self.points.push(PointD::new(x123, y123));
                return;
            }
        } else {
            // Collinear
            let da = dx * dx + dy * dy;
            let d_val = if da == 0.0 {
                calc_sq_distance(x1, y1, x2, y2)
            } else {
                let t = ((x2 - x1) * dx + (y2 - y1) * dy) / da;
                if t > 0.0 && t < 1.0 {
                    // 1---2---3
                    return;
                }
                if t <= 0.0 {
                    calc_sq_distance(x2, y2, x1, y1)
                } else {
                    calc_sq_distance(x2, y2, x3, y3)
                }
            };
            if d_val < self.distance_tolerance_square {
                self.points.push(PointD::new(x2, y2));
                return;
            }
        }

        self.recursive_bezier(x1, y1, x12, y12, x123, y123, level + 1);
        self.recursive_bezier(x123, y123, x23, y23, x3, y3, level + 1);
    }
}

impl Default for Curve3Div {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Path flattening
// ============================================================================

/// Flatten a twip-space path into a pixel-space polyline through `mtx`.
///
/// The first point is the transformed start; consecutive duplicates are
/// dropped.
pub fn flatten_path(path: &Path, mtx: &TransAffine, approximation_scale: f64) -> Vec<PointD> {
    let mut out = Vec::with_capacity(path.edges.len() + 1);
    let xf = |x: i32, y: i32| -> PointD {
        let (mut px, mut py) = (x as f64, y as f64);
        mtx.transform(&mut px, &mut py);
        PointD::new(px, py)
    };
    let push = |out: &mut Vec<PointD>, p: PointD| {
        if out.last().map_or(true, |l: &PointD| l.x != p.x || l.y != p.y) {
            out.push(p);
        }
    };

    let mut prev = xf(path.start.x, path.start.y);
    out.push(prev);
    let mut curve = Curve3Div::new();
    curve.set_approximation_scale(approximation_scale);
    for e in &path.edges {
        let anchor = xf(e.anchor.x, e.anchor.y);
        if e.is_straight() {
            push(&mut out, anchor);
        } else {
            let ctrl = xf(e.control.x, e.control.y);
            curve.init(prev.x, prev.y, ctrl.x, ctrl.y, anchor.x, anchor.y);
            for p in &curve.points()[1..] {
                push(&mut out, *p);
            }
        }
        prev = anchor;
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_curve3_endpoints() {
        let c = Curve3Div::new_with_points(0.0, 0.0, 50.0, 100.0, 100.0, 0.0);
        let pts = c.points();
        assert!(pts.len() > 3);
        assert!((pts[0].x).abs() < EPS && (pts[0].y).abs() < EPS);
        let last = pts[pts.len() - 1];
        assert!((last.x - 100.0).abs() < EPS && last.y.abs() < EPS);
    }

    #[test]
    fn test_curve3_points_on_curve() {
        let c = Curve3Div::new_with_points(0.0, 0.0, 50.0, 100.0, 100.0, 0.0);
        // Every produced point lies close to the parabola y = 2x - x²/50
        for p in c.points() {
            let expected = 2.0 * p.x - p.x * p.x / 50.0;
            assert!((p.y - expected).abs() < 0.6, "{:?} off curve", p);
        }
    }

    #[test]
    fn test_finer_scale_more_points() {
        let mut coarse = Curve3Div::new();
        coarse.init(0.0, 0.0, 50.0, 100.0, 100.0, 0.0);
        let mut fine = Curve3Div::new();
        fine.set_approximation_scale(10.0);
        fine.init(0.0, 0.0, 50.0, 100.0, 100.0, 0.0);
        assert!(fine.points().len() > coarse.points().len());
    }

    #[test]
    fn test_flatten_straight_path() {
        let mut p = Path::new(0, 0, 0, 1, 0, false);
        p.draw_line_to(200, 0);
        p.draw_line_to(200, 0);
        p.draw_line_to(200, 200);
        let m = TransAffine::new_scaling(0.05, 0.05);
        let pts = flatten_path(&p, &m, 1.0);
        assert_eq!(pts.len(), 3);
        assert!((pts[1].x - 10.0).abs() < EPS);
        assert!((pts[2].y - 10.0).abs() < EPS);
    }

    #[test]
    fn test_flatten_curved_path() {
        let mut p = Path::new(0, 0, 0, 1, 0, false);
        p.draw_curve_to(1000, 2000, 2000, 0);
        let m = TransAffine::new_scaling(0.05, 0.05);
        let pts = flatten_path(&p, &m, 1.0);
        assert!(pts.len() > 2);
        let last = pts[pts.len() - 1];
        assert!((last.x - 100.0).abs() < EPS);
        assert!(last.y.abs() < EPS);
    }
}
