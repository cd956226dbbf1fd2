//! Render session configuration.
//!
//! Plain data with defaults; enable the `serde` feature to load it from any
//! serde-supported format.

use crate::basics::{FillingRule, TWIPS_PER_PIXEL};

/// Rendering quality, ordered from cheapest to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Quality {
    /// No anti-aliasing, no bitmap smoothing.
    Low,
    Medium,
    #[default]
    High,
    /// Smooths bitmaps even when the fill leaves smoothing unspecified.
    Best,
}

/// Settings for a [`Renderer`](crate::renderer::Renderer).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RenderConfig {
    pub quality: Quality,
    /// Twips per output pixel.
    pub twips_per_pixel: f64,
    /// Sub-pixel shift applied when converting twips to pixel space.
    pub pixel_offset: f64,
    /// Number of entries in each gradient lookup table (at least 256).
    pub gradient_lut_size: usize,
    /// Curve flattening and round join accuracy.
    pub stroke_approximation_scale: f64,
    /// Fill rule used for regular shapes.
    pub shape_fill_rule: FillingRule,
    /// Fill rule used for glyph outlines.
    pub glyph_fill_rule: FillingRule,
    /// Upper bound on rasterizer cells per draw call; a draw exceeding it is
    /// aborted.
    pub max_raster_cells: usize,
    /// Upper bound on nested mask layers; deeper masks hide what they clip.
    pub max_mask_depth: usize,
}

pub const MIN_GRADIENT_LUT_SIZE: usize = 256;

/// Default cell budget: 1024 blocks of 4096 cells.
pub const DEFAULT_MAX_RASTER_CELLS: usize = 1024 * 4096;

pub const DEFAULT_MAX_MASK_DEPTH: usize = 64;

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            quality: Quality::High,
            twips_per_pixel: TWIPS_PER_PIXEL as f64,
            pixel_offset: 0.05,
            gradient_lut_size: MIN_GRADIENT_LUT_SIZE,
            stroke_approximation_scale: 1.0,
            shape_fill_rule: FillingRule::EvenOdd,
            glyph_fill_rule: FillingRule::NonZero,
            max_raster_cells: DEFAULT_MAX_RASTER_CELLS,
            max_mask_depth: DEFAULT_MAX_MASK_DEPTH,
        }
    }
}

impl RenderConfig {
    /// Gradient table size with the lower bound applied.
    pub fn lut_size(&self) -> usize {
        self.gradient_lut_size.max(MIN_GRADIENT_LUT_SIZE)
    }

    /// Pixels per twip, falling back to the default on nonsensical values.
    pub fn pixel_scale(&self) -> f64 {
        if self.twips_per_pixel > 0.0 && self.twips_per_pixel.is_finite() {
            1.0 / self.twips_per_pixel
        } else {
            log::warn!(
                "Ignoring invalid twips_per_pixel {}; using {}",
                self.twips_per_pixel,
                TWIPS_PER_PIXEL
            );
            1.0 / TWIPS_PER_PIXEL as f64
        }
    }

    /// Whether coverage should be anti-aliased.
    pub fn anti_aliased(&self) -> bool {
        self.quality > Quality::Low
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = RenderConfig::default();
        assert_eq!(c.quality, Quality::High);
        assert_eq!(c.shape_fill_rule, FillingRule::EvenOdd);
        assert_eq!(c.glyph_fill_rule, FillingRule::NonZero);
        assert!((c.pixel_scale() - 0.05).abs() < 1e-12);
        assert!(c.anti_aliased());
        assert_eq!(c.max_mask_depth, DEFAULT_MAX_MASK_DEPTH);
    }

    #[test]
    fn test_lut_size_lower_bound() {
        let c = RenderConfig {
            gradient_lut_size: 16,
            ..Default::default()
        };
        assert_eq!(c.lut_size(), 256);
        let c = RenderConfig {
            gradient_lut_size: 1024,
            ..Default::default()
        };
        assert_eq!(c.lut_size(), 1024);
    }

    #[test]
    fn test_invalid_scale_falls_back() {
        let c = RenderConfig {
            twips_per_pixel: 0.0,
            ..Default::default()
        };
        assert!((c.pixel_scale() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_quality_ordering() {
        assert!(Quality::Low < Quality::Medium);
        assert!(Quality::High < Quality::Best);
        let c = RenderConfig {
            quality: Quality::Low,
            ..Default::default()
        };
        assert!(!c.anti_aliased());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_partial_config() {
        let c: RenderConfig =
            serde_json::from_str(r#"{ "quality": "Best", "gradient_lut_size": 512 }"#).unwrap();
        assert_eq!(c.quality, Quality::Best);
        assert_eq!(c.lut_size(), 512);
        assert!((c.pixel_offset - 0.05).abs() < 1e-12);
    }
}
