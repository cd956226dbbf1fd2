//! Shape geometry model: edges, paths, subshapes and bounds, all in twips.
//!
//! A [`Shape`] owns ordered [`Subshape`]s; each subshape owns its own fill
//! and line style tables and the [`Path`]s referencing them through 1-based
//! indices (0 meaning "none"). The model is plain data: rendering code only
//! reads it and builds whatever per-draw structures it needs.

use crate::styles::{FillStyle, LineStyle};
use crate::swf_matrix::SwfMatrix;

// ============================================================================
// Point
// ============================================================================

/// Integer point in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared distance to `other`, in twips², as a double.
    #[inline]
    pub fn square_distance(&self, other: &Point) -> f64 {
        let dx = other.x as f64 - self.x as f64;
        let dy = other.y as f64 - self.y as f64;
        dx * dx + dy * dy
    }
}

// ============================================================================
// SwfRect
// ============================================================================

/// Axis-aligned rectangle in twips, or the null rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwfRect {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl Default for SwfRect {
    fn default() -> Self {
        Self::null()
    }
}

impl SwfRect {
    pub const fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// The empty rectangle; expanding it by a point yields that point.
    pub const fn null() -> Self {
        Self {
            x_min: i32::MAX,
            y_min: i32::MAX,
            x_max: i32::MIN,
            y_max: i32::MIN,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.x_min > self.x_max || self.y_min > self.y_max
    }

    pub fn width(&self) -> i32 {
        if self.is_null() {
            0
        } else {
            self.x_max.saturating_sub(self.x_min)
        }
    }

    pub fn height(&self) -> i32 {
        if self.is_null() {
            0
        } else {
            self.y_max.saturating_sub(self.y_min)
        }
    }

    pub fn expand_to_point(&mut self, p: Point) {
        self.x_min = self.x_min.min(p.x);
        self.y_min = self.y_min.min(p.y);
        self.x_max = self.x_max.max(p.x);
        self.y_max = self.y_max.max(p.y);
    }

    /// Expand to contain the axis-aligned square enclosing a circle.
    pub fn expand_to_circle(&mut self, p: Point, radius: i32) {
        self.x_min = self.x_min.min(p.x.saturating_sub(radius));
        self.y_min = self.y_min.min(p.y.saturating_sub(radius));
        self.x_max = self.x_max.max(p.x.saturating_add(radius));
        self.y_max = self.y_max.max(p.y.saturating_add(radius));
    }

    pub fn expand_to_rect(&mut self, r: &SwfRect) {
        if r.is_null() {
            return;
        }
        self.expand_to_point(Point::new(r.x_min, r.y_min));
        self.expand_to_point(Point::new(r.x_max, r.y_max));
    }

    pub fn contains_point(&self, p: Point) -> bool {
        !self.is_null()
            && p.x >= self.x_min
            && p.x <= self.x_max
            && p.y >= self.y_min
            && p.y <= self.y_max
    }

    pub fn intersects(&self, other: &SwfRect) -> bool {
        !self.is_null()
            && !other.is_null()
            && self.x_min <= other.x_max
            && other.x_min <= self.x_max
            && self.y_min <= other.y_max
            && other.y_min <= self.y_max
    }

    /// Interpolate each bound scalar. A null end point makes the result take
    /// whichever side `t` is closer to.
    pub fn set_lerp(&mut self, a: &SwfRect, b: &SwfRect, t: f64) {
        if a.is_null() || b.is_null() {
            *self = if t < 0.5 { *a } else { *b };
            return;
        }
        self.x_min = lerp_twips(a.x_min, b.x_min, t);
        self.y_min = lerp_twips(a.y_min, b.y_min, t);
        self.x_max = lerp_twips(a.x_max, b.x_max, t);
        self.y_max = lerp_twips(a.y_max, b.y_max, t);
    }
}

/// Interpolate two twip values, rounding to the nearest twip.
#[inline]
pub fn lerp_twips(a: i32, b: i32, t: f64) -> i32 {
    let v = a as f64 + (b as f64 - a as f64) * t;
    v.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

// ============================================================================
// Edge
// ============================================================================

/// One segment: a quadratic Bezier from the previous anchor through `control`
/// to `anchor`, or a straight line when both points coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Edge {
    pub control: Point,
    pub anchor: Point,
}

impl Edge {
    pub const fn new(cx: i32, cy: i32, ax: i32, ay: i32) -> Self {
        Self {
            control: Point::new(cx, cy),
            anchor: Point::new(ax, ay),
        }
    }

    pub const fn straight(ax: i32, ay: i32) -> Self {
        Self::new(ax, ay, ax, ay)
    }

    #[inline]
    pub fn is_straight(&self) -> bool {
        self.control == self.anchor
    }

    pub fn transform(&mut self, m: &SwfMatrix) {
        self.anchor = m.transform(self.anchor);
        self.control = m.transform(self.control);
    }

    /// Squared distance from `p` to the segment `a`-`b`.
    pub fn square_distance_pt_seg(p: Point, a: Point, b: Point) -> f64 {
        let (px, py) = (p.x as f64, p.y as f64);
        let (ax, ay) = (a.x as f64, a.y as f64);
        let (dx, dy) = (b.x as f64 - ax, b.y as f64 - ay);
        let len2 = dx * dx + dy * dy;
        if len2 == 0.0 {
            return p.square_distance(&a);
        }
        let u = (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0);
        let qx = ax + u * dx;
        let qy = ay + u * dy;
        (px - qx) * (px - qx) + (py - qy) * (py - qy)
    }

    /// Point at parameter `t` on the quadratic curve `a`, `c`, `b`.
    pub fn point_on_curve(a: Point, c: Point, b: Point, t: f64) -> (f64, f64) {
        let mt = 1.0 - t;
        let x = mt * mt * a.x as f64 + 2.0 * mt * t * c.x as f64 + t * t * b.x as f64;
        let y = mt * mt * a.y as f64 + 2.0 * mt * t * c.y as f64 + t * t * b.y as f64;
        (x, y)
    }
}

/// Segment count used when approximating curves for hit testing.
const HIT_TEST_CURVE_SEGMENTS: usize = 10;

// ============================================================================
// Path
// ============================================================================

/// A run of edges starting at `start`, sharing one fill pair and line style.
///
/// `left_fill`/`right_fill`/`line` are 1-based indices into the owning
/// subshape's style tables, 0 meaning the side is unfilled or unstroked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    pub start: Point,
    pub left_fill: u32,
    pub right_fill: u32,
    pub line: u32,
    pub edges: Vec<Edge>,
    /// Whether this path starts a new logical subshape.
    pub new_shape: bool,
}

impl Path {
    pub fn new(x: i32, y: i32, left_fill: u32, right_fill: u32, line: u32, new_shape: bool) -> Self {
        Self {
            start: Point::new(x, y),
            left_fill,
            right_fill,
            line,
            edges: Vec::new(),
            new_shape,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether either side of the path is filled.
    #[inline]
    pub fn has_fill(&self) -> bool {
        self.left_fill > 0 || self.right_fill > 0
    }

    /// Final anchor, or the start point for an empty path.
    pub fn end_point(&self) -> Point {
        self.edges.last().map_or(self.start, |e| e.anchor)
    }

    pub fn draw_line_to(&mut self, x: i32, y: i32) {
        self.edges.push(Edge::straight(x, y));
    }

    pub fn draw_curve_to(&mut self, cx: i32, cy: i32, ax: i32, ay: i32) {
        self.edges.push(Edge::new(cx, cy, ax, ay));
    }

    /// An empty path counts as closed.
    pub fn is_closed(&self) -> bool {
        self.edges.last().map_or(true, |e| e.anchor == self.start)
    }

    /// Append a straight edge back to the start if the path is open.
    pub fn close(&mut self) {
        if !self.is_closed() {
            self.edges.push(Edge::straight(self.start.x, self.start.y));
        }
    }

    pub fn transform(&mut self, m: &SwfMatrix) {
        self.start = m.transform(self.start);
        for e in &mut self.edges {
            e.transform(m);
        }
    }

    /// Grow `r` by every anchor and control point.
    ///
    /// A non-zero `thickness` widens each point by the stroke radius: the full
    /// thickness for format versions before 8, half of it afterwards.
    pub fn expand_bounds(&self, r: &mut SwfRect, thickness: u32, swf_version: u8) {
        if self.edges.is_empty() {
            return;
        }
        if thickness > 0 {
            let radius = if swf_version < 8 {
                thickness
            } else {
                thickness / 2
            } as i32;
            r.expand_to_circle(self.start, radius);
            for e in &self.edges {
                r.expand_to_circle(e.anchor, radius);
                r.expand_to_circle(e.control, radius);
            }
        } else {
            r.expand_to_point(self.start);
            for e in &self.edges {
                r.expand_to_point(e.anchor);
                r.expand_to_point(e.control);
            }
        }
    }

    /// Whether any part of the outline lies within `sq_dist` (squared twips)
    /// of `p`. Curves are approximated by straight segments.
    pub fn within_square_distance(&self, p: Point, sq_dist: f64) -> bool {
        let mut prev = self.start;
        for e in &self.edges {
            if e.is_straight() {
                if Edge::square_distance_pt_seg(p, prev, e.anchor) <= sq_dist {
                    return true;
                }
            } else {
                let mut p0 = prev;
                for i in 1..=HIT_TEST_CURVE_SEGMENTS {
                    let t = i as f64 / HIT_TEST_CURVE_SEGMENTS as f64;
                    let (x, y) = Edge::point_on_curve(prev, e.control, e.anchor, t);
                    let p1 = Point::new(x.round() as i32, y.round() as i32);
                    if Edge::square_distance_pt_seg(p, p0, p1) <= sq_dist {
                        return true;
                    }
                    p0 = p1;
                }
            }
            prev = e.anchor;
        }
        false
    }

    /// Visit the path as straight segments, approximating curves.
    fn for_each_segment(&self, mut f: impl FnMut((f64, f64), (f64, f64))) {
        let mut prev = self.start;
        for e in &self.edges {
            if e.is_straight() {
                f(
                    (prev.x as f64, prev.y as f64),
                    (e.anchor.x as f64, e.anchor.y as f64),
                );
            } else {
                let mut p0 = (prev.x as f64, prev.y as f64);
                for i in 1..=HIT_TEST_CURVE_SEGMENTS {
                    let t = i as f64 / HIT_TEST_CURVE_SEGMENTS as f64;
                    let p1 = Edge::point_on_curve(prev, e.control, e.anchor, t);
                    f(p0, p1);
                    p0 = p1;
                }
            }
            prev = e.anchor;
        }
    }
}

// ============================================================================
// Subshape
// ============================================================================

/// A set of paths with their own fill and line style tables.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Subshape {
    pub fill_styles: Vec<FillStyle>,
    pub line_styles: Vec<LineStyle>,
    pub paths: Vec<Path>,
    /// Cached bounds; null until computed or supplied.
    pub bounds: SwfRect,
}

impl Subshape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fill style and returns its 1-based index.
    pub fn add_fill_style(&mut self, style: FillStyle) -> u32 {
        self.fill_styles.push(style);
        self.fill_styles.len() as u32
    }

    /// Adds a line style and returns its 1-based index.
    pub fn add_line_style(&mut self, style: LineStyle) -> u32 {
        self.line_styles.push(style);
        self.line_styles.len() as u32
    }

    pub fn add_path(&mut self, path: Path) {
        self.paths.push(path);
    }

    pub fn current_path_mut(&mut self) -> Option<&mut Path> {
        self.paths.last_mut()
    }

    /// Fill style for a 1-based reference.
    pub fn fill_style(&self, index: u32) -> Option<&FillStyle> {
        index
            .checked_sub(1)
            .and_then(|i| self.fill_styles.get(i as usize))
    }

    /// Line style for a 1-based reference.
    pub fn line_style(&self, index: u32) -> Option<&LineStyle> {
        index
            .checked_sub(1)
            .and_then(|i| self.line_styles.get(i as usize))
    }

    /// Reset style references beyond the style tables to 0.
    ///
    /// Returns the number of references that were changed.
    pub fn sanitize_styles(&mut self) -> usize {
        let fills = self.fill_styles.len() as u32;
        let lines = self.line_styles.len() as u32;
        let mut fixed = 0;
        for (i, p) in self.paths.iter_mut().enumerate() {
            if p.left_fill > fills {
                log::warn!(
                    "Path {i}: left fill style {} out of range (have {fills}), using none",
                    p.left_fill
                );
                p.left_fill = 0;
                fixed += 1;
            }
            if p.right_fill > fills {
                log::warn!(
                    "Path {i}: right fill style {} out of range (have {fills}), using none",
                    p.right_fill
                );
                p.right_fill = 0;
                fixed += 1;
            }
            if p.line > lines {
                log::warn!(
                    "Path {i}: line style {} out of range (have {lines}), using none",
                    p.line
                );
                p.line = 0;
                fixed += 1;
            }
        }
        fixed
    }

    /// Recompute the cached bounds from the paths.
    ///
    /// A line reference without a line style table is accepted (glyphs use
    /// one) and contributes no thickness.
    pub fn compute_bounds(&mut self, swf_version: u8) -> SwfRect {
        let mut bounds = SwfRect::null();
        for p in &self.paths {
            let thickness = self.line_style(p.line).map_or(0, |ls| ls.thickness);
            p.expand_bounds(&mut bounds, thickness as u32, swf_version);
        }
        self.bounds = bounds;
        bounds
    }

    /// Even-odd (or non-zero) inside test plus stroke proximity, in local twips.
    pub fn point_test(&self, p: Point, world: &SwfMatrix, even_odd: bool) -> bool {
        let (px, py) = (p.x as f64, p.y as f64);
        let mut counter = 0i32;
        for path in &self.paths {
            if !path.has_fill() {
                continue;
            }
            path.for_each_segment(|(x0, y0), (x1, y1)| {
                if (y0 <= py) == (y1 <= py) {
                    return;
                }
                let cross_x = x0 + (py - y0) * (x1 - x0) / (y1 - y0);
                if cross_x >= px {
                    return;
                }
                // Downward edges have the left fill on the ray side; upward
                // edges the right fill.
                let (inside, outside) = if y1 > y0 {
                    (path.left_fill, path.right_fill)
                } else {
                    (path.right_fill, path.left_fill)
                };
                if inside > 0 {
                    counter += 1;
                }
                if outside > 0 {
                    counter -= 1;
                }
            });
        }
        let filled = if even_odd {
            counter % 2 != 0
        } else {
            counter != 0
        };
        if filled {
            return true;
        }

        for path in &self.paths {
            let Some(ls) = self.line_style(path.line) else {
                continue;
            };
            let mut thickness = ls.thickness as f64;
            if thickness == 0.0 {
                // Hairlines are one pixel wide at any scale.
                thickness = 20.0;
            } else if !ls.scale_horizontally && !ls.scale_vertically {
                thickness *= world.get_x_scale().max(world.get_y_scale());
            }
            let sq = thickness * thickness / 4.0;
            if path.within_square_distance(p, sq) {
                return true;
            }
        }
        false
    }
}

// ============================================================================
// Shape
// ============================================================================

/// A complete shape definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape {
    pub subshapes: Vec<Subshape>,
    /// Producer-supplied bounds; null means "derive from subshapes".
    pub bounds: SwfRect,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    /// A shape with one subshape.
    pub fn from_subshape(subshape: Subshape) -> Self {
        Self {
            subshapes: vec![subshape],
            bounds: SwfRect::null(),
        }
    }

    pub fn add_subshape(&mut self, subshape: Subshape) {
        self.subshapes.push(subshape);
    }

    pub fn set_bounds(&mut self, bounds: SwfRect) {
        self.bounds = bounds;
    }

    /// Supplied bounds, or the union of the subshape bounds.
    ///
    /// Subshapes whose cached bounds are still null are measured on the fly
    /// without line thickness.
    pub fn bounds(&self) -> SwfRect {
        if !self.bounds.is_null() {
            return self.bounds;
        }
        let mut r = SwfRect::null();
        for s in &self.subshapes {
            if s.bounds.is_null() {
                for p in &s.paths {
                    p.expand_bounds(&mut r, 0, 0);
                }
            } else {
                r.expand_to_rect(&s.bounds);
            }
        }
        r
    }

    /// Recompute all subshape bounds and the shape bounds.
    pub fn compute_bounds(&mut self, swf_version: u8) -> SwfRect {
        let mut r = SwfRect::null();
        for s in &mut self.subshapes {
            r.expand_to_rect(&s.compute_bounds(swf_version));
        }
        self.bounds = r;
        r
    }

    /// Clamp out-of-range style references in every subshape.
    pub fn sanitize_styles(&mut self) -> usize {
        self.subshapes.iter_mut().map(Subshape::sanitize_styles).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.subshapes.iter().all(|s| s.paths.iter().all(Path::is_empty))
    }

    /// Hit test a point given in the shape's own twips.
    ///
    /// `world` is the shape's world matrix; it only sizes non-scaling strokes.
    pub fn point_test_local(&self, x: i32, y: i32, world: &SwfMatrix) -> bool {
        let p = Point::new(x, y);
        if !self.bounds().contains_point(p) && !self.has_strokes() {
            return false;
        }
        self.subshapes.iter().any(|s| s.point_test(p, world, true))
    }

    fn has_strokes(&self) -> bool {
        self.subshapes
            .iter()
            .any(|s| s.paths.iter().any(|p| p.line > 0))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba8;

    fn square(x0: i32, y0: i32, size: i32, left: u32, right: u32) -> Path {
        let mut p = Path::new(x0, y0, left, right, 0, false);
        p.draw_line_to(x0 + size, y0);
        p.draw_line_to(x0 + size, y0 + size);
        p.draw_line_to(x0, y0 + size);
        p.draw_line_to(x0, y0);
        p
    }

    #[test]
    fn test_rect_null_and_expand() {
        let mut r = SwfRect::null();
        assert!(r.is_null());
        assert_eq!(r.width(), 0);
        r.expand_to_point(Point::new(10, -5));
        assert!(!r.is_null());
        assert_eq!(r, SwfRect::new(10, -5, 10, -5));
        r.expand_to_circle(Point::new(0, 0), 3);
        assert_eq!(r, SwfRect::new(-3, -5, 10, 3));
    }

    #[test]
    fn test_rect_intersects_and_contains() {
        let a = SwfRect::new(0, 0, 100, 100);
        assert!(a.intersects(&SwfRect::new(50, 50, 150, 150)));
        assert!(!a.intersects(&SwfRect::new(101, 0, 150, 10)));
        assert!(!a.intersects(&SwfRect::null()));
        assert!(a.contains_point(Point::new(100, 0)));
        assert!(!SwfRect::null().contains_point(Point::new(0, 0)));
    }

    #[test]
    fn test_rect_lerp() {
        let a = SwfRect::new(0, 0, 100, 100);
        let b = SwfRect::new(100, 200, 300, 400);
        let mut r = SwfRect::null();
        r.set_lerp(&a, &b, 0.0);
        assert_eq!(r, a);
        r.set_lerp(&a, &b, 1.0);
        assert_eq!(r, b);
        r.set_lerp(&a, &b, 0.5);
        assert_eq!(r, SwfRect::new(50, 100, 200, 250));
    }

    #[test]
    fn test_edge_straight() {
        assert!(Edge::straight(5, 5).is_straight());
        assert!(!Edge::new(0, 5, 5, 5).is_straight());
    }

    #[test]
    fn test_distance_pt_seg() {
        let d = Edge::square_distance_pt_seg(Point::new(5, 5), Point::new(0, 0), Point::new(10, 0));
        assert!((d - 25.0).abs() < 1e-9);
        // Beyond the end clamps to the end point
        let d = Edge::square_distance_pt_seg(Point::new(13, 4), Point::new(0, 0), Point::new(10, 0));
        assert!((d - 25.0).abs() < 1e-9);
        // Degenerate segment
        let d = Edge::square_distance_pt_seg(Point::new(3, 4), Point::new(0, 0), Point::new(0, 0));
        assert!((d - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_on_curve_ends() {
        let a = Point::new(0, 0);
        let c = Point::new(50, 100);
        let b = Point::new(100, 0);
        assert_eq!(Edge::point_on_curve(a, c, b, 0.0), (0.0, 0.0));
        assert_eq!(Edge::point_on_curve(a, c, b, 1.0), (100.0, 0.0));
        assert_eq!(Edge::point_on_curve(a, c, b, 0.5), (50.0, 50.0));
    }

    #[test]
    fn test_path_close() {
        let mut p = Path::new(0, 0, 0, 1, 0, false);
        assert!(p.is_closed());
        p.draw_line_to(100, 0);
        p.draw_line_to(100, 100);
        assert!(!p.is_closed());
        p.close();
        assert!(p.is_closed());
        assert_eq!(p.len(), 3);
        // Closing again is a no-op
        p.close();
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn test_path_transform() {
        let mut p = Path::new(10, 10, 0, 1, 0, false);
        p.draw_curve_to(20, 0, 30, 10);
        p.transform(&SwfMatrix::translation(5, -5));
        assert_eq!(p.start, Point::new(15, 5));
        assert_eq!(p.edges[0], Edge::new(25, -5, 35, 5));
    }

    #[test]
    fn test_expand_bounds_thickness_by_version() {
        let p = square(0, 0, 100, 0, 1);
        let mut r = SwfRect::null();
        p.expand_bounds(&mut r, 20, 6);
        assert_eq!(r, SwfRect::new(-20, -20, 120, 120));
        let mut r = SwfRect::null();
        p.expand_bounds(&mut r, 20, 8);
        assert_eq!(r, SwfRect::new(-10, -10, 110, 110));
        let mut r = SwfRect::null();
        Path::new(5, 5, 0, 1, 0, false).expand_bounds(&mut r, 20, 8);
        assert!(r.is_null());
    }

    #[test]
    fn test_within_square_distance() {
        let p = square(0, 0, 100, 0, 1);
        assert!(p.within_square_distance(Point::new(50, 3), 16.0));
        assert!(!p.within_square_distance(Point::new(50, 50), 16.0));

        let mut curve = Path::new(0, 0, 0, 0, 1, false);
        curve.draw_curve_to(50, 100, 100, 0);
        assert!(curve.within_square_distance(Point::new(50, 50), 4.0));
        assert!(!curve.within_square_distance(Point::new(50, 0), 4.0));
    }

    #[test]
    fn test_sanitize_styles() {
        let mut s = Subshape::new();
        s.add_fill_style(FillStyle::solid(Rgba8::BLACK));
        s.add_path(square(0, 0, 10, 3, 1));
        let mut bad_line = square(0, 0, 10, 0, 0);
        bad_line.line = 2;
        s.add_path(bad_line);
        assert_eq!(s.sanitize_styles(), 2);
        assert_eq!(s.paths[0].left_fill, 0);
        assert_eq!(s.paths[0].right_fill, 1);
        assert_eq!(s.paths[1].line, 0);
    }

    #[test]
    fn test_style_lookup_is_one_based() {
        let mut s = Subshape::new();
        let idx = s.add_fill_style(FillStyle::solid(Rgba8::WHITE));
        assert_eq!(idx, 1);
        assert!(s.fill_style(0).is_none());
        assert!(s.fill_style(1).is_some());
        assert!(s.fill_style(2).is_none());
    }

    #[test]
    fn test_compute_bounds_with_line() {
        let mut s = Subshape::new();
        s.add_line_style(LineStyle::new(40, Rgba8::BLACK));
        let mut p = square(0, 0, 100, 0, 0);
        p.line = 1;
        s.add_path(p);
        let mut shape = Shape::from_subshape(s);
        assert_eq!(shape.bounds(), SwfRect::new(0, 0, 100, 100));
        let b = shape.compute_bounds(8);
        assert_eq!(b, SwfRect::new(-20, -20, 120, 120));
        assert_eq!(shape.bounds(), b);
    }

    #[test]
    fn test_point_test_fill() {
        let mut s = Subshape::new();
        s.add_fill_style(FillStyle::solid(Rgba8::BLACK));
        s.add_path(square(0, 0, 100, 0, 1));
        let shape = Shape::from_subshape(s);
        let m = SwfMatrix::IDENTITY;
        assert!(shape.point_test_local(50, 50, &m));
        assert!(!shape.point_test_local(150, 50, &m));
        assert!(!shape.point_test_local(-1, 50, &m));
    }

    #[test]
    fn test_point_test_hole_even_odd() {
        let mut s = Subshape::new();
        s.add_fill_style(FillStyle::solid(Rgba8::BLACK));
        s.add_path(square(0, 0, 300, 0, 1));
        // Inner square drawn the same way: even-odd makes it a hole
        s.add_path(square(100, 100, 100, 0, 1));
        let shape = Shape::from_subshape(s);
        let m = SwfMatrix::IDENTITY;
        assert!(shape.point_test_local(50, 50, &m));
        assert!(!shape.point_test_local(150, 150, &m));
    }

    #[test]
    fn test_point_test_stroke() {
        let mut s = Subshape::new();
        s.add_line_style(LineStyle::new(40, Rgba8::BLACK));
        let mut p = Path::new(0, 0, 0, 0, 1, false);
        p.draw_line_to(1000, 0);
        s.add_path(p);
        let shape = Shape::from_subshape(s);
        let m = SwfMatrix::IDENTITY;
        assert!(shape.point_test_local(500, 15, &m));
        assert!(!shape.point_test_local(500, 25, &m));
    }

    #[test]
    fn test_shape_is_empty() {
        let mut s = Subshape::new();
        s.add_path(Path::new(0, 0, 0, 1, 0, false));
        assert!(Shape::from_subshape(s).is_empty());
        assert!(Shape::new().is_empty());
    }
}
