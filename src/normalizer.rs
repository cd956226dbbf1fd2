//! Path normalization for single-sided fill consumers.
//!
//! Shape paths carry a fill on either side. Tessellating consumers want
//! closed polygons with the fill on one side only, so every filled path is
//! rewritten to be right-filled (reversing it where needed) and then chained
//! with its neighbours into per-style contours.

use crate::geometry::{Edge, Path, Point, Subshape};

// ============================================================================
// Reversal
// ============================================================================

/// The same outline walked backwards.
///
/// The start becomes the old end point, edges come in reverse order with
/// each curve keeping its control point, and the fill sides swap.
pub fn reverse_path(path: &Path) -> Path {
    let mut out = Path::new(
        path.end_point().x,
        path.end_point().y,
        path.right_fill,
        path.left_fill,
        path.line,
        path.new_shape,
    );
    out.edges.reserve(path.edges.len());
    for i in (0..path.edges.len()).rev() {
        let e = &path.edges[i];
        let target = if i == 0 {
            path.start
        } else {
            path.edges[i - 1].anchor
        };
        let control = if e.is_straight() { target } else { e.control };
        out.edges.push(Edge {
            control,
            anchor: target,
        });
    }
    out
}

// ============================================================================
// Normalization
// ============================================================================

/// Rewrite `paths` so every filled path has only a right fill.
///
/// Returns the right-filled paths and, separately, paths with no fill at
/// all (they only matter for stroking).
pub fn normalize_paths(paths: &[Path]) -> (Vec<Path>, Vec<Path>) {
    let mut filled = Vec::with_capacity(paths.len());
    let mut outlines = Vec::new();
    for path in paths {
        match (path.left_fill, path.right_fill) {
            (0, 0) => outlines.push(path.clone()),
            (_, 0) => filled.push(reverse_path(path)),
            (0, _) => filled.push(path.clone()),
            (_, _) => {
                let mut right = path.clone();
                right.left_fill = 0;
                filled.push(right);
                let mut left = reverse_path(path);
                left.left_fill = 0;
                filled.push(left);
            }
        }
    }
    (filled, outlines)
}

/// Index of the first unused path in `paths` starting at `point`.
pub fn find_connecting_path(paths: &[Path], used: &[bool], point: Point) -> Option<usize> {
    paths
        .iter()
        .zip(used)
        .position(|(p, &u)| !u && p.start == point)
}

// ============================================================================
// Contours
// ============================================================================

/// Chained right-filled paths sharing one fill style.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    /// 1-based fill style index.
    pub fill: u32,
    pub paths: Vec<Path>,
}

impl Contour {
    pub fn start(&self) -> Point {
        self.paths.first().map_or_else(Point::default, |p| p.start)
    }

    pub fn end_point(&self) -> Point {
        self.paths.last().map_or_else(Point::default, |p| p.end_point())
    }

    pub fn is_closed(&self) -> bool {
        self.start() == self.end_point()
    }

    /// Merge the chain into one path, closing it with a straight edge
    /// unless `no_close` is set.
    pub fn to_path(&self, no_close: bool) -> Path {
        let start = self.start();
        let line = self.paths.first().map_or(0, |p| p.line);
        let mut out = Path::new(start.x, start.y, 0, self.fill, line, false);
        for p in &self.paths {
            out.edges.extend_from_slice(&p.edges);
        }
        if !no_close {
            out.close();
        }
        out
    }
}

/// Group right-filled paths by fill style and chain them end to start.
///
/// A chain stops when it returns to its own start or when nothing connects
/// to its end; the latter is kept as an open contour.
pub fn get_contours(paths: &[Path]) -> Vec<Contour> {
    let mut fills: Vec<u32> = paths.iter().map(|p| p.right_fill).filter(|&f| f > 0).collect();
    fills.sort_unstable();
    fills.dedup();

    let mut contours = Vec::new();
    for fill in fills {
        let group: Vec<Path> = paths
            .iter()
            .filter(|p| p.right_fill == fill && !p.is_empty())
            .cloned()
            .collect();
        let mut used = vec![false; group.len()];
        for head in 0..group.len() {
            if used[head] {
                continue;
            }
            used[head] = true;
            let start = group[head].start;
            let mut end = group[head].end_point();
            let mut chain = vec![group[head].clone()];
            while end != start {
                match find_connecting_path(&group, &used, end) {
                    Some(i) => {
                        used[i] = true;
                        end = group[i].end_point();
                        chain.push(group[i].clone());
                    }
                    None => {
                        log::debug!(
                            "Open contour for fill {} ending at ({}, {})",
                            fill,
                            end.x,
                            end.y
                        );
                        break;
                    }
                }
            }
            contours.push(Contour { fill, paths: chain });
        }
    }
    contours
}

/// A subshape rewritten as per-style contours plus stroke-only paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedSubshape {
    pub contours: Vec<Contour>,
    pub outlines: Vec<Path>,
}

pub fn normalize_subshape(subshape: &Subshape) -> NormalizedSubshape {
    let (filled, outlines) = normalize_paths(&subshape.paths);
    NormalizedSubshape {
        contours: get_contours(&filled),
        outlines,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn curvy() -> Path {
        let mut p = Path::new(0, 0, 1, 2, 1, false);
        p.draw_line_to(100, 0);
        p.draw_curve_to(150, 50, 100, 100);
        p.draw_line_to(0, 100);
        p
    }

    /// Rectangle split vertically in two fills: edges shared on x = 100.
    fn split_rect() -> Vec<Path> {
        let mut outer = Path::new(0, 0, 0, 1, 0, false);
        outer.draw_line_to(100, 0);
        let mut left_bottom = Path::new(100, 100, 0, 1, 0, false);
        left_bottom.draw_line_to(0, 100);
        left_bottom.draw_line_to(0, 0);
        let mut shared = Path::new(100, 0, 2, 1, 0, false);
        shared.draw_line_to(100, 100);
        let mut right = Path::new(100, 0, 0, 2, 0, false);
        right.draw_line_to(200, 0);
        right.draw_line_to(200, 100);
        right.draw_line_to(100, 100);
        vec![outer, left_bottom, shared, reverse_path(&right)]
    }

    #[test]
    fn test_reverse_twice_is_identity() {
        let p = curvy();
        let r = reverse_path(&p);
        assert_eq!(r.start, Point::new(0, 100));
        assert_eq!(r.end_point(), Point::new(0, 0));
        assert_eq!((r.left_fill, r.right_fill), (2, 1));
        assert_eq!(r.edges[1], Edge::new(150, 50, 100, 0));
        assert!(r.edges[0].is_straight());
        assert_eq!(reverse_path(&r), p);
    }

    #[test]
    fn test_two_sided_path_splits() {
        let p = curvy();
        let (filled, outlines) = normalize_paths(std::slice::from_ref(&p));
        assert!(outlines.is_empty());
        assert_eq!(filled.len(), 2);
        assert_eq!((filled[0].left_fill, filled[0].right_fill), (0, 2));
        assert_eq!((filled[1].left_fill, filled[1].right_fill), (0, 1));
        assert_eq!(filled[0].edges, p.edges);
        // Walking the copy backwards gives the original outline back.
        let mut back = reverse_path(&filled[1]);
        back.left_fill = p.left_fill;
        back.right_fill = p.right_fill;
        assert_eq!(back, p);
    }

    #[test]
    fn test_left_only_and_unfilled() {
        let mut left = Path::new(0, 0, 3, 0, 0, false);
        left.draw_line_to(10, 0);
        let mut line = Path::new(0, 0, 0, 0, 1, false);
        line.draw_line_to(0, 10);
        let (filled, outlines) = normalize_paths(&[left, line.clone()]);
        assert_eq!(filled.len(), 1);
        assert_eq!((filled[0].left_fill, filled[0].right_fill), (0, 3));
        assert_eq!(filled[0].start, Point::new(10, 0));
        assert_eq!(outlines, vec![line]);
    }

    #[test]
    fn test_contours_close_per_fill() {
        let (filled, _) = normalize_paths(&split_rect());
        let contours = get_contours(&filled);
        assert_eq!(contours.len(), 2);
        for c in &contours {
            assert!(c.is_closed(), "fill {} not closed", c.fill);
        }
        assert_eq!(contours[0].fill, 1);
        assert_eq!(contours[0].paths.len(), 3);
        assert_eq!(contours[1].fill, 2);
        assert_eq!(contours[1].paths.len(), 2);
    }

    #[test]
    fn test_open_contour_kept() {
        let mut p = Path::new(0, 0, 0, 1, 0, false);
        p.draw_line_to(10, 0);
        p.draw_line_to(10, 10);
        let contours = get_contours(&[p]);
        assert_eq!(contours.len(), 1);
        assert!(!contours[0].is_closed());

        let closed = contours[0].to_path(false);
        assert!(closed.is_closed());
        assert_eq!(closed.edges.len(), 3);
        let open = contours[0].to_path(true);
        assert_eq!(open.edges.len(), 2);
        assert_eq!((open.left_fill, open.right_fill), (0, 1));
    }

    #[test]
    fn test_normalize_subshape() {
        let mut sub = Subshape::new();
        for p in split_rect() {
            sub.add_path(p);
        }
        let mut stroke = Path::new(0, 0, 0, 0, 1, false);
        stroke.draw_line_to(5, 5);
        sub.add_path(stroke);
        let n = normalize_subshape(&sub);
        assert_eq!(n.contours.len(), 2);
        assert_eq!(n.outlines.len(), 1);
    }
}
