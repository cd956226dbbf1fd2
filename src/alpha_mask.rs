//! Nested clip masks.
//!
//! Each mask layer is a one byte per pixel coverage buffer the size of the
//! surface. While a mask is being submitted, shapes are drawn into the top
//! layer as plain coverage, clipped by the layer below so nested masks
//! intersect. Afterwards the top layer modulates the coverage of every
//! normal draw.

use crate::basics::{CoverType, COVER_FULL, COVER_SHIFT};
use crate::error::{try_resize, RenderError, Result};

// ============================================================================
// AlphaMask
// ============================================================================

/// Gray8 coverage buffer.
pub struct AlphaMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl AlphaMask {
    /// A fully uncovered mask.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(RenderError::Allocation { bytes: usize::MAX })?;
        let mut data = Vec::new();
        try_resize(&mut data, len, 0)?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Coverage at `(x, y)`; outside the buffer nothing is covered.
    pub fn pixel(&self, x: i32, y: i32) -> u8 {
        if x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height {
            self.data[y as usize * self.width as usize + x as usize]
        } else {
            0
        }
    }

    /// Multiply a span of coverage values by the mask, starting at `(x, y)`.
    pub fn combine_hspan(&self, x: i32, y: i32, dst: &mut [CoverType]) {
        if y < 0 || y as u32 >= self.height {
            dst.fill(0);
            return;
        }
        let row = y as usize * self.width as usize;
        for (i, d) in dst.iter_mut().enumerate() {
            let px = x as i64 + i as i64;
            if px < 0 || px >= self.width as i64 {
                *d = 0;
                continue;
            }
            let m = self.data[row + px as usize] as u32;
            *d = ((COVER_FULL as u32 + *d as u32 * m) >> COVER_SHIFT) as u8;
        }
    }

    /// Add coverage for a span: `v = v + cover * (255 - v)`.
    pub fn blend_hspan(&mut self, x: i32, y: i32, covers: &[CoverType]) {
        if y < 0 || y as u32 >= self.height {
            return;
        }
        let row = y as usize * self.width as usize;
        for (i, &cover) in covers.iter().enumerate() {
            let px = x as i64 + i as i64;
            if px < 0 || px >= self.width as i64 {
                continue;
            }
            let v = &mut self.data[row + px as usize];
            *v = crate::color::Rgba8::lerp(*v, 255, cover);
        }
    }
}

// ============================================================================
// MaskStack
// ============================================================================

/// Stack of mask layers with submit state.
///
/// A layer that can't be created is still pushed, as a placeholder covering
/// nothing, so pushes and pops stay paired and everything drawn under it is
/// hidden until it is disabled.
pub struct MaskStack {
    width: u32,
    height: u32,
    /// `None` is a placeholder layer.
    layers: Vec<Option<AlphaMask>>,
    max_depth: usize,
    submitting: bool,
}

impl MaskStack {
    pub fn new(width: u32, height: u32, max_depth: usize) -> Self {
        Self {
            width,
            height,
            layers: Vec::new(),
            max_depth,
            submitting: false,
        }
    }

    /// Push a new, uncovered layer and direct subsequent draws into it.
    ///
    /// On error a placeholder is pushed instead and submission still
    /// starts, so the matching end and disable calls stay balanced.
    pub fn begin_submit(&mut self) -> Result<()> {
        self.submitting = true;
        if self.layers.len() >= self.max_depth {
            self.layers.push(None);
            return Err(RenderError::MaskDepth {
                limit: self.max_depth,
            });
        }
        if matches!(self.layers.last(), Some(None)) {
            // Intersecting with nothing is nothing.
            self.layers.push(None);
            return Ok(());
        }
        match AlphaMask::new(self.width, self.height) {
            Ok(layer) => {
                self.layers.push(Some(layer));
                Ok(())
            }
            Err(e) => {
                self.layers.push(None);
                Err(e)
            }
        }
    }

    /// Stop drawing into the mask; it now clips normal draws.
    pub fn end_submit(&mut self) {
        if !self.submitting {
            log::warn!("end_submit_mask without a matching begin_submit_mask");
        }
        self.submitting = false;
    }

    /// Pop the top layer. Popping an empty stack is ignored.
    pub fn disable(&mut self) {
        if self.layers.pop().is_none() {
            log::warn!("disable_mask called with no active mask");
        }
        self.submitting = false;
    }

    /// Drop every layer, returning how many were still active.
    pub fn clear(&mut self) -> usize {
        let n = self.layers.len();
        self.layers.clear();
        self.submitting = false;
        n
    }

    #[inline]
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// True when the top layer is a placeholder, so normal draws show
    /// nothing.
    #[inline]
    pub fn hides_everything(&self) -> bool {
        !self.submitting && matches!(self.layers.last(), Some(None))
    }

    /// Mask applied to normal draws.
    pub fn active(&self) -> Option<&AlphaMask> {
        if self.submitting {
            return None;
        }
        self.layers.last()?.as_ref()
    }

    /// Layer being submitted and the layer clipping it, if any. `None` when
    /// not submitting or when the result would cover nothing anyway.
    pub fn submit_target(&mut self) -> Option<(&mut AlphaMask, Option<&AlphaMask>)> {
        if !self.submitting {
            return None;
        }
        let (top, rest) = self.layers.split_last_mut()?;
        let below = match rest.last() {
            Some(layer) => Some(layer.as_ref()?),
            None => None,
        };
        Some((top.as_mut()?, below))
    }
}

// ============================================================================
// Tests
// ============================================================================
