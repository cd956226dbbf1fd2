//! Outline stroking.
//!
//! Turns a flattened pixel-space polyline into polygons that, filled with
//! the non-zero rule, cover the stroke. Open polylines yield one polygon
//! (start cap, one side, end cap, other side); closed polylines yield an
//! outer and an inner ring of opposite orientation.

use std::f64::consts::PI;

use crate::basics::{calc_distance, cross_product, PointD};
use crate::styles::{CapStyle, JoinStyle, LineStyle};
use crate::swf_matrix::SwfMatrix;

/// Points closer than this are merged before stroking.
const VERTEX_DIST_EPSILON: f64 = 1e-14;
const INTERSECTION_EPSILON: f64 = 1.0e-30;

/// Stroke width in pixels for `style` drawn through `world`.
///
/// Hairlines are one pixel wide whatever the transform. Strokes that do not
/// scale keep their twip width; scaled strokes never get thinner than a
/// pixel.
pub fn stroke_width(style: &LineStyle, world: &SwfMatrix, pixel_scale: f64) -> f64 {
    let thickness = style.thickness as f64;
    if style.thickness == 0 {
        return 1.0;
    }
    if !style.scales_thickness() {
        return thickness * pixel_scale;
    }
    let scale = (world.get_x_scale() + world.get_y_scale()) / 2.0;
    (thickness * scale * pixel_scale).max(1.0)
}

/// Move points onto pixel centres.
pub fn snap_to_pixels(points: &mut [PointD]) {
    for p in points {
        p.x = p.x.floor() + 0.5;
        p.y = p.y.floor() + 0.5;
    }
}

fn calc_intersection(
    ax: f64,
    ay: f64,
    bx: f64,
    by: f64,
    cx: f64,
    cy: f64,
    dx: f64,
    dy: f64,
) -> Option<(f64, f64)> {
    let num = (ay - cy) * (dx - cx) - (ax - cx) * (dy - cy);
    let den = (bx - ax) * (dy - cy) - (by - ay) * (dx - cx);
    if den.abs() < INTERSECTION_EPSILON {
        return None;
    }
    let r = num / den;
    Some((ax + r * (bx - ax), ay + r * (by - ay)))
}

// ============================================================================
// Vertex sequence
// ============================================================================

/// A vertex with the distance to its successor.
#[derive(Debug, Clone, Copy)]
struct VertexDist {
    x: f64,
    y: f64,
    dist: f64,
}

/// Drop coincident points and fill in segment lengths.
fn vertex_sequence(points: &[PointD], closed: bool) -> Vec<VertexDist> {
    let mut out: Vec<VertexDist> = Vec::with_capacity(points.len());
    for p in points {
        if let Some(last) = out.last() {
            if calc_distance(last.x, last.y, p.x, p.y) <= VERTEX_DIST_EPSILON {
                continue;
            }
        }
        out.push(VertexDist {
            x: p.x,
            y: p.y,
            dist: 0.0,
        });
    }
    if closed {
        while out.len() > 1 {
            let (first, last) = (out[0], out[out.len() - 1]);
            if calc_distance(last.x, last.y, first.x, first.y) > VERTEX_DIST_EPSILON {
                break;
            }
            out.pop();
        }
    }
    let n = out.len();
    for i in 0..n {
        let next = out[(i + 1) % n];
        out[i].dist = calc_distance(out[i].x, out[i].y, next.x, next.y);
    }
    out
}

// ============================================================================
// Stroker
// ============================================================================

/// Cap and join geometry for one line style.
#[derive(Debug, Clone)]
pub struct Stroker {
    /// Half the stroke width.
    width: f64,
    width_eps: f64,
    miter_limit: f64,
    inner_miter_limit: f64,
    approx_scale: f64,
    start_cap: CapStyle,
    end_cap: CapStyle,
    join: JoinStyle,
}

impl Stroker {
    pub fn new(width: f64) -> Self {
        let half = width.abs() * 0.5;
        Self {
            width: half,
            width_eps: half / 1024.0,
            miter_limit: 4.0,
            inner_miter_limit: 1.01,
            approx_scale: 1.0,
            start_cap: CapStyle::Round,
            end_cap: CapStyle::Round,
            join: JoinStyle::Round,
        }
    }

    /// A stroker for `style` at `width` pixels.
    pub fn from_line_style(style: &LineStyle, width: f64, approx_scale: f64) -> Self {
        let mut s = Self::new(width);
        s.start_cap = style.start_cap;
        s.end_cap = style.end_cap;
        s.join = style.join;
        s.miter_limit = style.miter_limit.max(1.0);
        s.set_approximation_scale(approx_scale);
        s
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width * 2.0
    }

    pub fn set_caps(&mut self, start: CapStyle, end: CapStyle) {
        self.start_cap = start;
        self.end_cap = end;
    }

    pub fn set_join(&mut self, join: JoinStyle) {
        self.join = join;
    }

    pub fn set_miter_limit(&mut self, limit: f64) {
        self.miter_limit = limit;
    }

    pub fn set_approximation_scale(&mut self, s: f64) {
        self.approx_scale = if s > 0.0 { s } else { 1.0 };
    }

    /// Stroke a polyline into polygons to fill with the non-zero rule.
    pub fn stroke(&self, points: &[PointD], closed: bool) -> Vec<Vec<PointD>> {
        let v = vertex_sequence(points, closed);
        let closed = closed && v.len() >= 3;
        let n = v.len();
        let mut out = Vec::new();
        if n < 2 {
            if let (Some(p), true) = (v.first(), self.start_cap != CapStyle::None) {
                out.push(self.dot(p.x, p.y));
            }
            return out;
        }

        let mut vc = Vec::new();
        if closed {
            let mut outer = Vec::new();
            for i in 0..n {
                let (prev, curr, next) = (v[(i + n - 1) % n], v[i], v[(i + 1) % n]);
                self.calc_join(&mut vc, &prev, &curr, &next, prev.dist, curr.dist);
                outer.extend_from_slice(&vc);
            }
            let mut inner = Vec::new();
            for i in (0..n).rev() {
                let (prev, curr, next) = (v[(i + n - 1) % n], v[i], v[(i + 1) % n]);
                self.calc_join(&mut vc, &next, &curr, &prev, curr.dist, prev.dist);
                inner.extend_from_slice(&vc);
            }
            out.push(outer);
            out.push(inner);
            return out;
        }

        let mut poly = Vec::new();
        self.calc_cap(&mut vc, &v[0], &v[1], v[0].dist, self.start_cap);
        poly.extend_from_slice(&vc);
        for i in 1..n - 1 {
            self.calc_join(&mut vc, &v[i - 1], &v[i], &v[i + 1], v[i - 1].dist, v[i].dist);
            poly.extend_from_slice(&vc);
        }
        self.calc_cap(&mut vc, &v[n - 1], &v[n - 2], v[n - 2].dist, self.end_cap);
        poly.extend_from_slice(&vc);
        for i in (1..n - 1).rev() {
            self.calc_join(&mut vc, &v[i + 1], &v[i], &v[i - 1], v[i].dist, v[i - 1].dist);
            poly.extend_from_slice(&vc);
        }
        out.push(poly);
        out
    }

    /// Angular step for arcs at the current width.
    fn arc_step(&self) -> f64 {
        (self.width / (self.width + 0.125 / self.approx_scale)).acos() * 2.0
    }

    /// Zero-length stroke: a disc, or a square for square caps.
    fn dot(&self, x: f64, y: f64) -> Vec<PointD> {
        let w = self.width;
        if self.start_cap == CapStyle::Square {
            return vec![
                PointD::new(x - w, y - w),
                PointD::new(x + w, y - w),
                PointD::new(x + w, y + w),
                PointD::new(x - w, y + w),
            ];
        }
        let n = ((2.0 * PI / self.arc_step()) as usize).max(8);
        let n = n + n % 2;
        (0..n)
            .map(|i| {
                let a = i as f64 * 2.0 * PI / n as f64;
                PointD::new(x + a.cos() * w, y + a.sin() * w)
            })
            .collect()
    }

    fn calc_cap(
        &self,
        vc: &mut Vec<PointD>,
        v0: &VertexDist,
        v1: &VertexDist,
        len: f64,
        cap: CapStyle,
    ) {
        vc.clear();
        let dx1 = (v1.y - v0.y) / len * self.width;
        let dy1 = (v1.x - v0.x) / len * self.width;

        if cap != CapStyle::Round {
            let (dx2, dy2) = if cap == CapStyle::Square {
                (dy1, dx1)
            } else {
                (0.0, 0.0)
            };
            vc.push(PointD::new(v0.x - dx1 - dx2, v0.y + dy1 - dy2));
            vc.push(PointD::new(v0.x + dx1 - dx2, v0.y - dy1 - dy2));
            return;
        }

        let n = (PI / self.arc_step()) as i32;
        let da = PI / (n + 1) as f64;
        vc.push(PointD::new(v0.x - dx1, v0.y + dy1));
        let mut a1 = dy1.atan2(-dx1) + da;
        for _ in 0..n {
            vc.push(PointD::new(
                v0.x + a1.cos() * self.width,
                v0.y + a1.sin() * self.width,
            ));
            a1 += da;
        }
        vc.push(PointD::new(v0.x + dx1, v0.y - dy1));
    }

    fn calc_join(
        &self,
        vc: &mut Vec<PointD>,
        v0: &VertexDist,
        v1: &VertexDist,
        v2: &VertexDist,
        len1: f64,
        len2: f64,
    ) {
        let dx1 = self.width * (v1.y - v0.y) / len1;
        let dy1 = self.width * (v1.x - v0.x) / len1;
        let dx2 = self.width * (v2.y - v1.y) / len2;
        let dy2 = self.width * (v2.x - v1.x) / len2;
        let offsets = [dx1, dy1, dx2, dy2];

        vc.clear();

        let cp = cross_product(v0.x, v0.y, v1.x, v1.y, v2.x, v2.y);
        if cp > 0.0 {
            // Inner corner: miter, falling back to a bevel past the limit.
            let limit = (len1.min(len2) / self.width).max(self.inner_miter_limit);
            self.calc_miter(vc, v0, v1, v2, offsets, JoinStyle::Bevel, limit, 0.0);
            return;
        }

        let dx = (dx1 + dx2) / 2.0;
        let dy = (dy1 + dy2) / 2.0;
        let dbevel = (dx * dx + dy * dy).sqrt();

        // Nearly straight: a single point is enough.
        if self.join != JoinStyle::Miter
            && self.approx_scale * (self.width - dbevel) < self.width_eps
        {
            match calc_intersection(
                v0.x + dx1,
                v0.y - dy1,
                v1.x + dx1,
                v1.y - dy1,
                v1.x + dx2,
                v1.y - dy2,
                v2.x + dx2,
                v2.y - dy2,
            ) {
                Some((ix, iy)) => vc.push(PointD::new(ix, iy)),
                None => vc.push(PointD::new(v1.x + dx1, v1.y - dy1)),
            }
            return;
        }

        match self.join {
            JoinStyle::Miter => {
                self.calc_miter(
                    vc,
                    v0,
                    v1,
                    v2,
                    offsets,
                    JoinStyle::Miter,
                    self.miter_limit,
                    dbevel,
                );
            }
            JoinStyle::Round => self.calc_arc(vc, v1.x, v1.y, dx1, -dy1, dx2, -dy2),
            JoinStyle::Bevel => {
                vc.push(PointD::new(v1.x + dx1, v1.y - dy1));
                vc.push(PointD::new(v1.x + dx2, v1.y - dy2));
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn calc_arc(&self, vc: &mut Vec<PointD>, x: f64, y: f64, dx1: f64, dy1: f64, dx2: f64, dy2: f64) {
        let mut a1 = dy1.atan2(dx1);
        let mut a2 = dy2.atan2(dx2);
        if a1 > a2 {
            a2 += 2.0 * PI;
        }
        let n = ((a2 - a1) / self.arc_step()) as i32;
        let da = (a2 - a1) / (n + 1) as f64;

        vc.push(PointD::new(x + dx1, y + dy1));
        a1 += da;
        for _ in 0..n {
            vc.push(PointD::new(x + a1.cos() * self.width, y + a1.sin() * self.width));
            a1 += da;
        }
        vc.push(PointD::new(x + dx2, y + dy2));
    }

    /// Miter join; `fallback` decides what happens past `limit`: `Bevel`
    /// cuts the corner at the offset points, `Miter` clips the spike.
    #[allow(clippy::too_many_arguments)]
    fn calc_miter(
        &self,
        vc: &mut Vec<PointD>,
        v0: &VertexDist,
        v1: &VertexDist,
        v2: &VertexDist,
        [dx1, dy1, dx2, dy2]: [f64; 4],
        fallback: JoinStyle,
        limit: f64,
        dbevel: f64,
    ) {
        let lim = self.width * limit;
        let mut within_limit = false;
        let intersection = calc_intersection(
            v0.x + dx1,
            v0.y - dy1,
            v1.x + dx1,
            v1.y - dy1,
            v1.x + dx2,
            v1.y - dy2,
            v2.x + dx2,
            v2.y - dy2,
        );
        let mut di = 1.0;
        if let Some((xi, yi)) = intersection {
            di = calc_distance(v1.x, v1.y, xi, yi);
            if di <= lim {
                vc.push(PointD::new(xi, yi));
                within_limit = true;
            }
        } else {
            // Collinear segments: the offset point is the join when the
            // path does not fold back on itself.
            let x2 = v1.x + dx1;
            let y2 = v1.y - dy1;
            if (cross_product(v0.x, v0.y, v1.x, v1.y, x2, y2) < 0.0)
                == (cross_product(v1.x, v1.y, v2.x, v2.y, x2, y2) < 0.0)
            {
                vc.push(PointD::new(x2, y2));
                within_limit = true;
            }
        }
        if within_limit {
            return;
        }

        match (fallback, intersection) {
            (JoinStyle::Miter, Some((xi, yi))) => {
                let x1 = v1.x + dx1;
                let y1 = v1.y - dy1;
                let x2 = v1.x + dx2;
                let y2 = v1.y - dy2;
                let k = (lim - dbevel) / (di - dbevel);
                vc.push(PointD::new(x1 + (xi - x1) * k, y1 + (yi - y1) * k));
                vc.push(PointD::new(x2 + (xi - x2) * k, y2 + (yi - y2) * k));
            }
            (JoinStyle::Miter, None) => {
                vc.push(PointD::new(v1.x + dx1 + dy1 * limit, v1.y - dy1 + dx1 * limit));
                vc.push(PointD::new(v1.x + dx2 - dy2 * limit, v1.y - dy2 - dx2 * limit));
            }
            _ => {
                vc.push(PointD::new(v1.x + dx1, v1.y - dy1));
                vc.push(PointD::new(v1.x + dx2, v1.y - dy2));
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(v: &[(f64, f64)]) -> Vec<PointD> {
        v.iter().map(|&(x, y)| PointD::new(x, y)).collect()
    }

    fn bbox(poly: &[PointD]) -> (f64, f64, f64, f64) {
        poly.iter().fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(x1, y1, x2, y2), p| (x1.min(p.x), y1.min(p.y), x2.max(p.x), y2.max(p.y)),
        )
    }

    fn signed_area(poly: &[PointD]) -> f64 {
        let n = poly.len();
        (0..n)
            .map(|i| {
                let (a, b) = (poly[i], poly[(i + 1) % n]);
                a.x * b.y - b.x * a.y
            })
            .sum::<f64>()
            / 2.0
    }

    #[test]
    fn test_stroke_width_rules() {
        let world = SwfMatrix::scaling(2.0, 2.0);
        let mut style = LineStyle::new(0, crate::color::Rgba8::BLACK);
        assert_eq!(stroke_width(&style, &world, 0.05), 1.0);

        style.thickness = 40;
        assert!((stroke_width(&style, &world, 0.05) - 4.0).abs() < 1e-3);

        style.scale_horizontally = false;
        style.scale_vertically = false;
        assert!((stroke_width(&style, &world, 0.05) - 2.0).abs() < 1e-9);

        style.scale_horizontally = true;
        style.thickness = 2;
        assert_eq!(stroke_width(&style, &SwfMatrix::IDENTITY, 0.05), 1.0);
    }

    #[test]
    fn test_horizontal_butt_line_extent() {
        let mut s = Stroker::new(4.0);
        s.set_caps(CapStyle::None, CapStyle::None);
        let polys = s.stroke(&pts(&[(0.0, 10.0), (20.0, 10.0)]), false);
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].len(), 4);
        let (x1, y1, x2, y2) = bbox(&polys[0]);
        assert!((x1 - 0.0).abs() < 1e-9 && (x2 - 20.0).abs() < 1e-9);
        assert!((y1 - 8.0).abs() < 1e-9 && (y2 - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_square_cap_extends_by_half_width() {
        let mut s = Stroker::new(4.0);
        s.set_caps(CapStyle::Square, CapStyle::Square);
        let polys = s.stroke(&pts(&[(0.0, 0.0), (10.0, 0.0)]), false);
        let (x1, _, x2, _) = bbox(&polys[0]);
        assert!((x1 + 2.0).abs() < 1e-9);
        assert!((x2 - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_cap_adds_vertices() {
        let butt = {
            let mut s = Stroker::new(10.0);
            s.set_caps(CapStyle::None, CapStyle::None);
            s.stroke(&pts(&[(0.0, 0.0), (50.0, 0.0)]), false)
        };
        let round = Stroker::new(10.0).stroke(&pts(&[(0.0, 0.0), (50.0, 0.0)]), false);
        assert!(round[0].len() > butt[0].len());
        let (x1, _, x2, _) = bbox(&round[0]);
        assert!(x1 < -4.0 && x2 > 54.0);
    }

    #[test]
    fn test_closed_square_gives_opposite_rings() {
        let mut s = Stroker::new(2.0);
        s.set_join(JoinStyle::Miter);
        let square = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]);
        let polys = s.stroke(&square, true);
        assert_eq!(polys.len(), 2);
        let (x1, y1, x2, y2) = bbox(&polys[0]);
        let (ix1, iy1, ix2, iy2) = bbox(&polys[1]);
        // One ring grows outward, the other shrinks inward.
        let outer_first = x2 - x1 > ix2 - ix1;
        let (o, i) = if outer_first {
            ((x1, y1, x2, y2), (ix1, iy1, ix2, iy2))
        } else {
            ((ix1, iy1, ix2, iy2), (x1, y1, x2, y2))
        };
        assert!((o.0 + 1.0).abs() < 1e-9 && (o.3 - 11.0).abs() < 1e-9);
        assert!((i.0 - 1.0).abs() < 1e-9 && (i.3 - 9.0).abs() < 1e-9);
        assert!(signed_area(&polys[0]) * signed_area(&polys[1]) < 0.0);
    }

    #[test]
    fn test_miter_limit_clips_sharp_corner() {
        let sharp = pts(&[(0.0, 0.0), (100.0, 0.0), (0.0, 5.0)]);
        let mut s = Stroker::new(4.0);
        s.set_join(JoinStyle::Miter);
        s.set_miter_limit(100.0);
        let unclipped = bbox(&s.stroke(&sharp, false)[0]);
        s.set_miter_limit(2.0);
        let clipped = bbox(&s.stroke(&sharp, false)[0]);
        assert!(clipped.2 < unclipped.2);
        assert!(clipped.2 <= 100.0 + 2.0 * 2.0 + 1e-6);
    }

    #[test]
    fn test_degenerate_input() {
        let s = Stroker::new(4.0);
        assert!(s.stroke(&[], false).is_empty());
        let dot = s.stroke(&pts(&[(5.0, 5.0), (5.0, 5.0)]), false);
        assert_eq!(dot.len(), 1);
        let (x1, _, x2, _) = bbox(&dot[0]);
        assert!((x2 - x1 - 4.0).abs() < 1e-6);

        let mut none = Stroker::new(4.0);
        none.set_caps(CapStyle::None, CapStyle::None);
        assert!(none.stroke(&pts(&[(5.0, 5.0)]), false).is_empty());
    }

    #[test]
    fn test_snap_to_pixels() {
        let mut p = pts(&[(1.2, 3.9), (-0.3, 0.0)]);
        snap_to_pixels(&mut p);
        assert_eq!((p[0].x, p[0].y), (1.5, 3.5));
        assert_eq!((p[1].x, p[1].y), (-0.5, 0.5));
    }
}
