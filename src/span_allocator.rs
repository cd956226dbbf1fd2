//! Reusable per-span color buffer.
//!
//! Paint generators write one color per pixel of a span into this buffer
//! before it is blended. The buffer grows in steps of 256 entries and never
//! shrinks, so a draw call allocates at most a handful of times.

use crate::error::{try_resize, Result};

pub struct SpanAllocator<C> {
    span: Vec<C>,
}

impl<C: Default + Clone> SpanAllocator<C> {
    pub fn new() -> Self {
        Self { span: Vec::new() }
    }

    /// Buffer of exactly `span_len` elements, growing the storage if needed.
    ///
    /// Growth that cannot be reserved is reported instead of aborting.
    pub fn allocate(&mut self, span_len: usize) -> Result<&mut [C]> {
        if span_len > self.span.len() {
            let new_size = ((span_len + 255) >> 8) << 8;
            try_resize(&mut self.span, new_size, C::default())?;
        }
        Ok(&mut self.span[..span_len])
    }

    pub fn max_span_len(&self) -> usize {
        self.span.len()
    }
}

impl<C: Default + Clone> Default for SpanAllocator<C> {
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
    use crate::color::Rgba8;

    #[test]
    fn test_allocate_aligns_to_256() {
        let mut alloc = SpanAllocator::<Rgba8>::new();
        assert_eq!(alloc.max_span_len(), 0);
        assert_eq!(alloc.allocate(10).unwrap().len(), 10);
        assert_eq!(alloc.max_span_len(), 256);
        alloc.allocate(257).unwrap();
        assert_eq!(alloc.max_span_len(), 512);
    }

    #[test]
    fn test_allocate_reuses() {
        let mut alloc = SpanAllocator::<u8>::new();
        alloc.allocate(100).unwrap()[0] = 9;
        let span = alloc.allocate(50).unwrap();
        assert_eq!(span.len(), 50);
        assert_eq!(span[0], 9);
        assert_eq!(alloc.max_span_len(), 256);
    }
}
