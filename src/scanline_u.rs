//! Unpacked scanline container.
//!
//! Stores one coverage byte per pixel in a flat array with spans indexing
//! into it. The compound rasterizer fills one of these per style and per
//! scanline; paint and mask code then walk its spans.

// ============================================================================
// Scanline trait
// ============================================================================

/// Receiver of coverage produced by a rasterizer sweep.
pub trait Scanline {
    /// Prepare for a new scanline, clearing all span data.
    fn reset_spans(&mut self);

    /// Add a single cell at position `x` with coverage `cover`.
    fn add_cell(&mut self, x: i32, cover: u32);

    /// Add a horizontal span of `len` pixels starting at `x`, all with `cover`.
    fn add_span(&mut self, x: i32, len: u32, cover: u32);

    /// Finalize the scanline at the given Y coordinate.
    fn finalize(&mut self, y: i32);

    /// Number of spans in this scanline (0 means empty).
    fn num_spans(&self) -> u32;

    /// The Y coordinate of this scanline.
    fn y(&self) -> i32;
}

// ============================================================================
// ScanlineSpan
// ============================================================================

/// A horizontal run within a scanline. `cover_offset` indexes the covers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanlineSpan {
    pub x: i32,
    pub len: i32,
    pub cover_offset: usize,
}

// ============================================================================
// ScanlineU8
// ============================================================================

/// Unpacked scanline with per-pixel u8 coverage.
///
/// Usage protocol:
/// 1. `reset(min_x, max_x)` sizes the buffers for the rasterizer's x range
/// 2. `add_cell()` / `add_span()` with monotonically increasing x
/// 3. `finalize(y)`
/// 4. iterate [`spans`](Self::spans) with [`covers`](Self::covers)
/// 5. `reset_spans()` before the next scanline
pub struct ScanlineU8 {
    min_x: i32,
    last_x: i32,
    y_val: i32,
    covers: Vec<u8>,
    spans: Vec<ScanlineSpan>,
    // Index of the current span; spans start at 1, 0 is a sentinel.
    cur_span: usize,
}

const NO_LAST_X: i32 = 0x7FFF_FFF0;

impl ScanlineU8 {
    pub fn new() -> Self {
        Self {
            min_x: 0,
            last_x: NO_LAST_X,
            y_val: 0,
            covers: Vec::new(),
            spans: Vec::new(),
            cur_span: 0,
        }
    }

    /// Prepare for a new sweep covering `min_x..=max_x`.
    pub fn reset(&mut self, min_x: i32, max_x: i32) {
        let max_len = (max_x - min_x + 2).max(2) as usize;
        if max_len > self.spans.len() {
            self.spans.resize(max_len, ScanlineSpan::default());
            self.covers.resize(max_len, 0);
        }
        self.last_x = NO_LAST_X;
        self.min_x = min_x;
        self.cur_span = 0;
    }

    /// Active spans in increasing x.
    pub fn spans(&self) -> &[ScanlineSpan] {
        &self.spans[1..=self.cur_span]
    }

    /// Coverage array the spans index into.
    pub fn covers(&self) -> &[u8] {
        &self.covers
    }

    /// Coverage of one span.
    #[inline]
    pub fn span_covers(&self, span: &ScanlineSpan) -> &[u8] {
        &self.covers[span.cover_offset..span.cover_offset + span.len as usize]
    }
}

impl Scanline for ScanlineU8 {
    fn reset_spans(&mut self) {
        self.last_x = NO_LAST_X;
        self.cur_span = 0;
    }

    fn add_cell(&mut self, x: i32, cover: u32) {
        let xi = (x - self.min_x) as usize;
        self.covers[xi] = cover as u8;
        if xi as i32 == self.last_x + 1 {
            self.spans[self.cur_span].len += 1;
        } else {
            self.cur_span += 1;
            self.spans[self.cur_span] = ScanlineSpan {
                x,
                len: 1,
                cover_offset: xi,
            };
        }
        self.last_x = xi as i32;
    }

    fn add_span(&mut self, x: i32, len: u32, cover: u32) {
        let xi = (x - self.min_x) as usize;
        self.covers[xi..xi + len as usize].fill(cover as u8);
        if xi as i32 == self.last_x + 1 {
            self.spans[self.cur_span].len += len as i32;
        } else {
            self.cur_span += 1;
            self.spans[self.cur_span] = ScanlineSpan {
                x,
                len: len as i32,
                cover_offset: xi,
            };
        }
        self.last_x = xi as i32 + len as i32 - 1;
    }

    fn finalize(&mut self, y: i32) {
        self.y_val = y;
    }

    fn num_spans(&self) -> u32 {
        self.cur_span as u32
    }

    fn y(&self) -> i32 {
        self.y_val
    }
}

impl Default for ScanlineU8 {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
