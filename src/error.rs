//! Error type shared by the fallible entry points of the crate.
//!
//! Drawing itself never fails: malformed shapes degrade and are logged.
//! Errors are reserved for resource setup (surfaces, bitmaps, fonts) and for
//! buffer allocation, which aborts a single draw call.

use thiserror::Error;

/// Errors that can occur while setting up or running a render session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Surface dimensions are zero or do not fit in memory.
    #[error("Invalid surface dimensions {width}x{height}")]
    InvalidSurface { width: u32, height: u32 },
    /// A fill, stroke or mask buffer could not be reserved.
    #[error("Couldn't allocate {bytes} bytes for a render buffer")]
    Allocation { bytes: usize },
    /// Too many nested mask layers.
    #[error("Mask nesting exceeds {limit} layers")]
    MaskDepth { limit: usize },
    /// A decoded image whose dimensions, stride and data length disagree.
    #[error("Invalid bitmap: {0}")]
    InvalidBitmap(String),
    /// No font face has been loaded into the provider.
    #[error("Font provider is not available")]
    FontUnavailable,
    /// Font bytes could not be parsed.
    #[error("Failed to parse font: {0}")]
    FontParse(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Grow `v` to `len` elements of `value`, reporting allocation failure
/// instead of aborting the process.
pub(crate) fn try_resize<T: Clone>(v: &mut Vec<T>, len: usize, value: T) -> Result<()> {
    if len > v.len() {
        let extra = len - v.len();
        v.try_reserve(extra).map_err(|_| RenderError::Allocation {
            bytes: extra.saturating_mul(core::mem::size_of::<T>()),
        })?;
    }
    v.resize(len, value);
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = RenderError::InvalidSurface { width: 0, height: 10 };
        assert_eq!(e.to_string(), "Invalid surface dimensions 0x10");
        let e = RenderError::Allocation { bytes: 64 };
        assert!(e.to_string().contains("64 bytes"));
        let e = RenderError::MaskDepth { limit: 4 };
        assert_eq!(e.to_string(), "Mask nesting exceeds 4 layers");
        assert_eq!(
            RenderError::FontUnavailable.to_string(),
            "Font provider is not available"
        );
    }

    #[test]
    fn test_try_resize_grows_and_shrinks() {
        let mut v: Vec<u8> = Vec::new();
        try_resize(&mut v, 16, 7).unwrap();
        assert_eq!(v.len(), 16);
        assert!(v.iter().all(|&b| b == 7));
        try_resize(&mut v, 4, 0).unwrap();
        assert_eq!(v.len(), 4);
    }

    #[test]
    fn test_try_resize_reports_huge_request() {
        let mut v: Vec<u64> = Vec::new();
        let err = try_resize(&mut v, usize::MAX / 4, 0).unwrap_err();
        assert!(matches!(err, RenderError::Allocation { .. }));
    }
}
