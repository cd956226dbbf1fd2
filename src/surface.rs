//! Premultiplied RGBA render target.
//!
//! Four bytes per pixel in R, G, B, A order with color channels already
//! scaled by alpha. Blending is source-over on premultiplied values, with
//! per-pixel coverage folded into the source first.

use crate::basics::{CoverType, RectI};
use crate::color::Rgba8;
use crate::error::{try_resize, RenderError, Result};

const BPP: usize = 4;

/// Source-over blend of a premultiplied color with coverage.
#[inline]
fn blend_pix(p: &mut [u8], c: &Rgba8, cover: CoverType) {
    let c = c.scaled_by_cover(cover);
    if c.is_opaque() {
        p[0] = c.r;
        p[1] = c.g;
        p[2] = c.b;
        p[3] = c.a;
    } else if c.a > 0 {
        p[0] = Rgba8::prelerp(p[0], c.r, c.a);
        p[1] = Rgba8::prelerp(p[1], c.g, c.a);
        p[2] = Rgba8::prelerp(p[2], c.b, c.a);
        p[3] = Rgba8::prelerp(p[3], c.a, c.a);
    }
}

pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    /// A transparent surface of `width` x `height` pixels.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(BPP))
            .filter(|&n| n > 0)
            .ok_or(RenderError::InvalidSurface { width, height })?;
        let mut data = Vec::new();
        try_resize(&mut data, len, 0)?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whole surface as a rectangle.
    pub fn bounds(&self) -> RectI {
        RectI::full(self.width, self.height)
    }

    /// Raw premultiplied RGBA bytes, row by row.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: i32, y: i32) -> Rgba8 {
        if !self.inside(x, y) {
            return Rgba8::TRANSPARENT;
        }
        let off = self.offset(x, y);
        let p = &self.data[off..off + BPP];
        Rgba8::new(p[0], p[1], p[2], p[3])
    }

    pub fn clear(&mut self, c: Rgba8) {
        let c = c.premultiplied();
        for p in self.data.chunks_exact_mut(BPP) {
            p.copy_from_slice(&[c.r, c.g, c.b, c.a]);
        }
    }

    /// Fill a rectangle (inclusive bounds) with `c`, clipped to the surface.
    pub fn clear_rect(&mut self, rect: &RectI, c: Rgba8) {
        let mut r = *rect;
        if !r.clip(&self.bounds()) {
            return;
        }
        let c = c.premultiplied();
        for y in r.y1..=r.y2 {
            let start = self.offset(r.x1, y);
            let end = self.offset(r.x2, y) + BPP;
            for p in self.data[start..end].chunks_exact_mut(BPP) {
                p.copy_from_slice(&[c.r, c.g, c.b, c.a]);
            }
        }
    }

    /// Blend one color over a span with per-pixel coverage.
    pub fn blend_solid_hspan(&mut self, x: i32, y: i32, c: &Rgba8, covers: &[CoverType]) {
        let Some((x, skip, len)) = self.clip_span(x, y, covers.len()) else {
            return;
        };
        let start = self.offset(x, y);
        let row = &mut self.data[start..start + len * BPP];
        for (p, &cover) in row.chunks_exact_mut(BPP).zip(&covers[skip..skip + len]) {
            blend_pix(p, c, cover);
        }
    }

    /// Blend per-pixel colors over a span with per-pixel coverage.
    pub fn blend_color_hspan(&mut self, x: i32, y: i32, colors: &[Rgba8], covers: &[CoverType]) {
        let n = colors.len().min(covers.len());
        let Some((x, skip, len)) = self.clip_span(x, y, n) else {
            return;
        };
        let start = self.offset(x, y);
        let row = &mut self.data[start..start + len * BPP];
        for ((p, c), &cover) in row
            .chunks_exact_mut(BPP)
            .zip(&colors[skip..skip + len])
            .zip(&covers[skip..skip + len])
        {
            blend_pix(p, c, cover);
        }
    }

    #[inline]
    fn inside(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> usize {
        (y as usize * self.width as usize + x as usize) * BPP
    }

    /// Clip a span to the row: start x, entries skipped, visible length.
    fn clip_span(&self, x: i32, y: i32, len: usize) -> Option<(i32, usize, usize)> {
        if y < 0 || y as u32 >= self.height || len == 0 {
            return None;
        }
        let x0 = x as i64;
        let x1 = (x0 + len as i64).min(self.width as i64);
        let start = x0.max(0);
        if start >= x1 {
            return None;
        }
        Some((start as i32, (start - x0) as usize, (x1 - start) as usize))
    }
}

// ============================================================================
// Tests
// ============================================================================
