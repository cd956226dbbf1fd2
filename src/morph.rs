//! Morph shape interpolation.
//!
//! A morph pairs a start and an end shape of matching topology. Every
//! coordinate, color and matrix is interpolated independently; geometry is
//! rounded to whole twips. Mismatched topology from a malformed producer
//! degrades instead of failing: missing edges collapse onto the
//! counterpart's last point and missing paths or styles are taken from
//! whichever side has them.

use crate::geometry::{lerp_twips, Edge, Path, Point, Shape, Subshape, SwfRect};
use crate::styles::{BitmapFill, FillStyle, GradientFill, GradientRecord, LineStyle};
use crate::swf_matrix::SwfMatrix;

#[inline]
fn lerp_f64(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

#[inline]
fn lerp_u8(a: u8, b: u8, t: f64) -> u8 {
    lerp_f64(a as f64, b as f64, t).round().clamp(0.0, 255.0) as u8
}

fn lerp_point(a: Point, b: Point, t: f64) -> Point {
    Point::new(lerp_twips(a.x, b.x, t), lerp_twips(a.y, b.y, t))
}

fn lerp_matrix(a: &SwfMatrix, b: &SwfMatrix, t: f64) -> SwfMatrix {
    let mut m = SwfMatrix::IDENTITY;
    m.set_lerp(a, b, t);
    m
}

// ============================================================================
// Styles
// ============================================================================

fn lerp_records(a: &[GradientRecord], b: &[GradientRecord], t: f64) -> Vec<GradientRecord> {
    if a.len() != b.len() {
        log::warn!(
            "Morph gradient stop counts differ ({} vs {})",
            a.len(),
            b.len()
        );
    }
    let n = a.len().max(b.len());
    (0..n)
        .filter_map(|i| {
            let ra = a.get(i).or(a.last())?;
            let rb = b.get(i).or(b.last())?;
            Some(GradientRecord::new(
                lerp_u8(ra.ratio, rb.ratio, t),
                ra.color.gradient(&rb.color, t),
            ))
        })
        .collect()
}

fn lerp_gradient(a: &GradientFill, b: &GradientFill, t: f64) -> GradientFill {
    let mut g = GradientFill::new(
        a.kind,
        lerp_matrix(&a.matrix, &b.matrix, t),
        lerp_records(&a.records, &b.records, t),
    )
    .with_spread(a.spread)
    .with_interpolation(a.interpolation);
    g.set_focal_point(lerp_f64(a.focal_point, b.focal_point, t));
    g
}

fn lerp_bitmap(a: &BitmapFill, b: &BitmapFill, t: f64) -> BitmapFill {
    BitmapFill {
        matrix: lerp_matrix(&a.matrix, &b.matrix, t),
        ..a.clone()
    }
}

/// Interpolate two fill styles of the same kind.
///
/// Kinds that differ cannot be blended; the nearer end is used.
pub fn lerp_fill_style(a: &FillStyle, b: &FillStyle, t: f64) -> FillStyle {
    match (a, b) {
        (FillStyle::Solid(sa), FillStyle::Solid(sb)) => {
            FillStyle::solid(sa.color.gradient(&sb.color, t))
        }
        (FillStyle::Gradient(ga), FillStyle::Gradient(gb)) => {
            FillStyle::gradient(lerp_gradient(ga, gb, t))
        }
        (FillStyle::Bitmap(ba), FillStyle::Bitmap(bb)) => {
            FillStyle::Bitmap(lerp_bitmap(ba, bb, t))
        }
        _ => {
            log::warn!("Morph between different fill kinds");
            if t < 0.5 {
                a.clone()
            } else {
                b.clone()
            }
        }
    }
}

/// Interpolate width, color and miter limit; flags come from the start.
pub fn lerp_line_style(a: &LineStyle, b: &LineStyle, t: f64) -> LineStyle {
    let thickness = lerp_f64(a.thickness as f64, b.thickness as f64, t)
        .round()
        .clamp(0.0, u16::MAX as f64) as u16;
    LineStyle {
        thickness,
        color: a.color.gradient(&b.color, t),
        miter_limit: lerp_f64(a.miter_limit, b.miter_limit, t),
        ..*a
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Edge `i` of `path`, or a zero-length edge at its last point.
fn edge_or_degenerate(path: &Path, i: usize) -> Edge {
    path.edges.get(i).copied().unwrap_or_else(|| {
        let p = path.end_point();
        Edge::straight(p.x, p.y)
    })
}

/// Interpolate start point and every edge; style references come from `a`.
pub fn lerp_path(a: &Path, b: &Path, t: f64) -> Path {
    if a.edges.len() != b.edges.len() {
        log::warn!(
            "Morph path edge counts differ ({} vs {})",
            a.edges.len(),
            b.edges.len()
        );
    }
    let start = lerp_point(a.start, b.start, t);
    let mut out = Path::new(
        start.x,
        start.y,
        a.left_fill,
        a.right_fill,
        a.line,
        a.new_shape,
    );
    let n = a.edges.len().max(b.edges.len());
    out.edges = (0..n)
        .map(|i| {
            let ea = edge_or_degenerate(a, i);
            let eb = edge_or_degenerate(b, i);
            Edge {
                control: lerp_point(ea.control, eb.control, t),
                anchor: lerp_point(ea.anchor, eb.anchor, t),
            }
        })
        .collect();
    out
}

fn lerp_bounds(a: &SwfRect, b: &SwfRect, t: f64) -> SwfRect {
    let mut r = SwfRect::null();
    r.set_lerp(a, b, t);
    r
}

/// Pair up `a` and `b`, falling back to whichever side has an element.
fn zip_longest<'a, T>(
    a: &'a [T],
    b: &'a [T],
) -> impl Iterator<Item = (&'a T, &'a T)> + 'a {
    (0..a.len().max(b.len())).filter_map(move |i| match (a.get(i), b.get(i)) {
        (Some(x), Some(y)) => Some((x, y)),
        (Some(x), None) => Some((x, x)),
        (None, Some(y)) => Some((y, y)),
        (None, None) => None,
    })
}

pub fn lerp_subshape(a: &Subshape, b: &Subshape, t: f64) -> Subshape {
    if a.paths.len() != b.paths.len() {
        log::warn!(
            "Morph path counts differ ({} vs {})",
            a.paths.len(),
            b.paths.len()
        );
    }
    Subshape {
        fill_styles: zip_longest(&a.fill_styles, &b.fill_styles)
            .map(|(x, y)| lerp_fill_style(x, y, t))
            .collect(),
        line_styles: zip_longest(&a.line_styles, &b.line_styles)
            .map(|(x, y)| lerp_line_style(x, y, t))
            .collect(),
        paths: zip_longest(&a.paths, &b.paths)
            .map(|(x, y)| lerp_path(x, y, t))
            .collect(),
        bounds: lerp_bounds(&a.bounds, &b.bounds, t),
    }
}

// ============================================================================
// Morph
// ============================================================================

/// Start and end shapes of a morph.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Morph {
    pub start: Shape,
    pub end: Shape,
}

impl Morph {
    pub fn new(start: Shape, end: Shape) -> Self {
        Self { start, end }
    }

    /// Shape at `t` in [0, 1]; out-of-range values are clamped.
    pub fn at(&self, t: f64) -> Shape {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if self.start.subshapes.len() != self.end.subshapes.len() {
            log::warn!(
                "Morph subshape counts differ ({} vs {})",
                self.start.subshapes.len(),
                self.end.subshapes.len()
            );
        }
        Shape {
            subshapes: zip_longest(&self.start.subshapes, &self.end.subshapes)
                .map(|(a, b)| lerp_subshape(a, b, t))
                .collect(),
            bounds: lerp_bounds(&self.start.bounds, &self.end.bounds, t),
        }
    }

    /// Shape at a 16-bit morph ratio, 65535 being the end shape.
    pub fn at_ratio(&self, ratio: u16) -> Shape {
        self.at(ratio as f64 / u16::MAX as f64)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba8;
    use crate::styles::GradientKind;

    fn shape(offset: i32, color: Rgba8, ratio: u8, thickness: u16) -> Shape {
        let mut sub = Subshape::new();
        sub.add_fill_style(FillStyle::solid(color));
        sub.add_fill_style(FillStyle::gradient(GradientFill::new(
            GradientKind::Linear,
            SwfMatrix::translation(offset, 0),
            vec![
                GradientRecord::new(0, Rgba8::BLACK),
                GradientRecord::new(ratio, Rgba8::WHITE),
            ],
        )));
        sub.add_line_style(LineStyle::new(thickness, color));
        let mut p = Path::new(offset, 0, 0, 1, 1, false);
        p.draw_line_to(offset + 100, 0);
        p.draw_curve_to(offset + 150, 50, offset + 100, 100);
        p.close();
        sub.add_path(p);
        let mut s = Shape::from_subshape(sub);
        s.set_bounds(SwfRect::new(offset, 0, offset + 150, 100));
        s
    }

    fn morph() -> Morph {
        Morph::new(
            shape(0, Rgba8::new_opaque(255, 0, 0), 200, 20),
            shape(1001, Rgba8::new_opaque(0, 0, 255), 255, 41),
        )
    }

    #[test]
    fn test_end_points_exact() {
        let m = morph();
        assert_eq!(m.at(0.0), m.start);
        assert_eq!(m.at(1.0), m.end);
        assert_eq!(m.at_ratio(u16::MAX), m.end);
        assert_eq!(m.at(-3.0), m.start);
        assert_eq!(m.at(f64::NAN), m.start);
    }

    #[test]
    fn test_midpoint_rounds() {
        let mid = m_at_half();
        let sub = &mid.subshapes[0];
        assert_eq!(sub.paths[0].start, Point::new(501, 0));
        assert_eq!(sub.paths[0].edges[1], Edge::new(651, 50, 601, 100));
        assert_eq!(sub.line_styles[0].thickness, 31);
        assert_eq!(mid.bounds, SwfRect::new(501, 0, 651, 100));
        match &sub.fill_styles[0] {
            FillStyle::Solid(s) => assert_eq!(s.color, Rgba8::new_opaque(128, 0, 128)),
            other => panic!("unexpected {other:?}"),
        }
        match &sub.fill_styles[1] {
            FillStyle::Gradient(g) => {
                assert_eq!(g.records[1].ratio, 228);
                assert_eq!(g.matrix.tx, 501);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    fn m_at_half() -> Shape {
        morph().at(0.5)
    }

    #[test]
    fn test_missing_edges_degenerate() {
        let mut a = Path::new(0, 0, 0, 1, 0, false);
        a.draw_line_to(100, 0);
        let mut b = Path::new(0, 0, 0, 1, 0, false);
        b.draw_line_to(200, 0);
        b.draw_line_to(200, 200);
        let p = lerp_path(&a, &b, 0.5);
        assert_eq!(p.edges.len(), 2);
        assert_eq!(p.edges[0], Edge::straight(150, 0));
        // The start path's missing edge sits at (100, 0).
        assert_eq!(p.edges[1], Edge::straight(150, 100));
    }

    #[test]
    fn test_mismatched_kinds_pick_nearer() {
        let solid = FillStyle::solid(Rgba8::WHITE);
        let bitmap = FillStyle::Bitmap(BitmapFill::new(
            crate::styles::BitmapKind::Tiled,
            None,
            SwfMatrix::IDENTITY,
        ));
        assert_eq!(lerp_fill_style(&solid, &bitmap, 0.2), solid);
        assert_eq!(lerp_fill_style(&solid, &bitmap, 0.8), bitmap);
    }

    #[test]
    fn test_bitmap_lerps_matrix_only() {
        let a = BitmapFill::new(
            crate::styles::BitmapKind::Clipped,
            Some(crate::bitmap::BitmapId(3)),
            SwfMatrix::translation(0, 0),
        );
        let b = BitmapFill::new(
            crate::styles::BitmapKind::Tiled,
            Some(crate::bitmap::BitmapId(9)),
            SwfMatrix::translation(100, 40),
        );
        match lerp_fill_style(&FillStyle::Bitmap(a), &FillStyle::Bitmap(b), 0.25) {
            FillStyle::Bitmap(f) => {
                assert_eq!(f.kind, crate::styles::BitmapKind::Clipped);
                assert_eq!(f.bitmap, Some(crate::bitmap::BitmapId(3)));
                assert_eq!((f.matrix.tx, f.matrix.ty), (25, 10));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
