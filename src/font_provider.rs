//! Device font glyphs using `ttf-parser`.
//!
//! A [`FontProvider`] turns glyph outlines of a TrueType/OpenType face into
//! the same [`Shape`] model embedded glyphs use. Coordinates are scaled to a
//! 1024 unit EM square with y pointing down. The face is loaded once with
//! [`FontProvider::init`] and shared between clones of the provider.

use std::sync::{Arc, Mutex, TryLockError};

use crate::color::Rgba8;
use crate::error::{RenderError, Result};
use crate::geometry::{Path, Shape, Subshape};
use crate::styles::FillStyle;

/// EM square size of produced glyph shapes.
pub const EM_UNITS: f64 = 1024.0;

/// Bounds computation follows this file format version.
const GLYPH_SWF_VERSION: u8 = 6;

/// A device glyph outline with its advance, both in EM units.
#[derive(Debug, Clone)]
pub struct Glyph {
    pub shape: Shape,
    pub advance: f64,
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
}

/// Shared handle to a lazily initialized font face.
#[derive(Clone, Default)]
pub struct FontProvider {
    face: Arc<Mutex<Option<FontFace>>>,
}

impl FontProvider {
    /// A provider with no face; glyph lookups fail until [`init`](Self::init).
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a face from raw font bytes, replacing any previous face.
    ///
    /// `index` selects the face in a font collection.
    pub fn init(&self, data: Vec<u8>, index: u32) -> Result<()> {
        let units = ttf_parser::Face::parse(&data, index)
            .map_err(|e| RenderError::FontParse(e.to_string()))?
            .units_per_em();
        let mut guard = self
            .face
            .lock()
            .map_err(|_| RenderError::FontUnavailable)?;
        *guard = Some(FontFace { data, index });
        log::debug!("Font face {index} loaded, {units} units per EM");
        Ok(())
    }

    /// Drop the loaded face.
    pub fn close(&self) {
        match self.face.lock() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.face.try_lock(), Ok(guard) if guard.is_some())
    }

    /// Outline of the glyph mapped to `code`.
    ///
    /// Returns `None` when no face is loaded, the face is busy or poisoned,
    /// or the code has no glyph. Glyphs without an outline, such as a space,
    /// come back with an empty shape and their advance.
    pub fn glyph(&self, code: u32) -> Option<Glyph> {
        let guard = match self.face.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                log::warn!("Font provider busy, glyph {code:#x} unavailable");
                return None;
            }
            Err(TryLockError::Poisoned(_)) => {
                log::error!("Font provider poisoned, glyph {code:#x} unavailable");
                return None;
            }
        };
        let Some(font) = guard.as_ref() else {
            log::debug!("No device font loaded, glyph {code:#x} unavailable");
            return None;
        };
        let face = match ttf_parser::Face::parse(&font.data, font.index) {
            Ok(face) => face,
            Err(e) => {
                log::error!("Device font no longer parses: {e}");
                return None;
            }
        };

        let ch = char::from_u32(code)?;
        let Some(id) = face.glyph_index(ch) else {
            log::debug!("Device font has no glyph for {ch:?}");
            return None;
        };
        let scale = EM_UNITS / face.units_per_em() as f64;
        let advance = face.glyph_hor_advance(id).map_or(0.0, |a| a as f64 * scale);

        let mut walker = OutlineWalker::new(scale);
        face.outline_glyph(id, &mut walker);
        Some(Glyph {
            shape: walker.finish(),
            advance,
        })
    }
}

impl std::fmt::Debug for FontProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontProvider")
            .field("available", &self.is_available())
            .finish()
    }
}

// ============================================================================
// OutlineWalker
// ============================================================================

/// Builds glyph paths filled on the left with style 1.
struct OutlineWalker {
    subshape: Subshape,
    scale: f64,
}

impl OutlineWalker {
    fn new(scale: f64) -> Self {
        let mut subshape = Subshape::new();
        subshape.add_fill_style(FillStyle::solid(Rgba8::WHITE));
        Self { subshape, scale }
    }

    #[inline]
    fn sx(&self, v: f32) -> i32 {
        (v as f64 * self.scale) as i32
    }

    #[inline]
    fn sy(&self, v: f32) -> i32 {
        -((v as f64 * self.scale) as i32)
    }

    fn close_current(&mut self) {
        if let Some(p) = self.subshape.current_path_mut() {
            p.close();
        }
    }

    fn finish(mut self) -> Shape {
        self.close_current();
        self.subshape.paths.retain(|p| !p.is_empty());
        let mut shape = Shape::from_subshape(self.subshape);
        shape.compute_bounds(GLYPH_SWF_VERSION);
        shape
    }
}

impl ttf_parser::OutlineBuilder for OutlineWalker {
    fn move_to(&mut self, x: f32, y: f32) {
        self.close_current();
        let path = Path::new(self.sx(x), self.sy(y), 1, 0, 0, false);
        self.subshape.add_path(path);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = (self.sx(x), self.sy(y));
        if let Some(p) = self.subshape.current_path_mut() {
            p.draw_line_to(x, y);
        }
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (cx, cy) = (self.sx(x1), self.sy(y1));
        let (x, y) = (self.sx(x), self.sy(y));
        if let Some(p) = self.subshape.current_path_mut() {
            p.draw_curve_to(cx, cy, x, y);
        }
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        // One quadratic through the midpoint of both control points.
        let mx = x1 + (x2 - x1) * 0.5;
        let my = y1 + (y2 - y1) * 0.5;
        self.quad_to(mx, my, x, y);
    }

    fn close(&mut self) {
        self.close_current();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Edge, Point};
    use ttf_parser::OutlineBuilder;

    #[test]
    fn test_uninitialized_provider() {
        let fonts = FontProvider::new();
        assert!(!fonts.is_available());
        assert!(fonts.glyph('A' as u32).is_none());
    }

    #[test]
    fn test_init_rejects_garbage() {
        let fonts = FontProvider::new();
        let err = fonts.init(vec![0, 1, 2, 3], 0).unwrap_err();
        assert!(matches!(err, RenderError::FontParse(_)));
        assert!(!fonts.is_available());
    }

    #[test]
    fn test_busy_provider_does_not_block() {
        let fonts = FontProvider::new();
        let shared = fonts.clone();
        let _held = fonts.face.lock().unwrap();
        assert!(shared.glyph('A' as u32).is_none());
        assert!(!shared.is_available());
    }

    #[test]
    fn test_walker_flips_y_and_scales() {
        let mut w = OutlineWalker::new(0.5);
        w.move_to(0.0, 0.0);
        w.line_to(100.0, 0.0);
        w.line_to(100.0, 200.0);
        w.close();
        let shape = w.finish();

        let sub = &shape.subshapes[0];
        assert_eq!(sub.paths.len(), 1);
        let p = &sub.paths[0];
        assert_eq!((p.left_fill, p.right_fill, p.line), (1, 0, 0));
        assert_eq!(p.end_point(), Point::new(0, 0));
        assert_eq!(p.edges[1].anchor, Point::new(50, -100));
        assert!(p.is_closed());
        assert_eq!(sub.fill_style(1), Some(&FillStyle::solid(Rgba8::WHITE)));
    }

    #[test]
    fn test_cubic_becomes_midpoint_quad() {
        let mut w = OutlineWalker::new(1.0);
        w.move_to(0.0, 0.0);
        w.curve_to(10.0, 20.0, 30.0, 40.0, 50.0, 0.0);
        let shape = w.finish();
        let p = &shape.subshapes[0].paths[0];
        assert_eq!(p.edges[0], Edge::new(20, -30, 50, 0));
        // Closed back to the start.
        assert_eq!(p.edges.len(), 2);
    }

    #[test]
    fn test_each_contour_is_a_path() {
        let mut w = OutlineWalker::new(1.0);
        w.move_to(0.0, 0.0);
        w.line_to(10.0, 0.0);
        w.line_to(10.0, 10.0);
        w.move_to(2.0, 2.0);
        w.line_to(4.0, 2.0);
        w.line_to(4.0, 4.0);
        let shape = w.finish();
        let paths = &shape.subshapes[0].paths;
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.is_closed()));
        assert!(!shape.bounds().is_null());
    }
}
