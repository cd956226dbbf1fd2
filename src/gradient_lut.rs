//! Gradient color lookup table.
//!
//! Built once per draw call from a fill's stop list with the active color
//! transform already applied. Entries are premultiplied and ready for
//! blending; `SpanGradient` indexes them with the spread-adjusted gradient
//! parameter.

use crate::color::Rgba8;
use crate::cxform::SwfCxForm;
use crate::error::{try_resize, Result};
use crate::styles::{GradientRecord, InterpolationMode};

// ============================================================================
// ColorFunction trait
// ============================================================================

/// Indexed access to a color palette of known size.
pub trait ColorFunction {
    fn size(&self) -> usize;
    fn get(&self, index: usize) -> Rgba8;
}

// ============================================================================
// Stop sampling
// ============================================================================

/// Color of the stop list at `ratio` in [0, 255].
///
/// Stops are scanned in order without assuming they are sorted. Values below
/// the first stop or at and above the last one take the end colors.
pub fn sample_stops(records: &[GradientRecord], ratio: f64, mode: InterpolationMode) -> Rgba8 {
    let (first, last) = match (records.first(), records.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Rgba8::TRANSPARENT,
    };
    if ratio < first.ratio as f64 {
        return first.color;
    }
    if ratio >= last.ratio as f64 {
        return last.color;
    }

    for pair in records.windows(2) {
        let (g0, g1) = (&pair[0], &pair[1]);
        if (g1.ratio as f64) < ratio || (g0.ratio as f64) > ratio {
            continue;
        }
        let span = g1.ratio as f64 - g0.ratio as f64;
        let k = if span > 0.0 {
            (ratio - g0.ratio as f64) / span
        } else {
            log::warn!(
                "Two gradient stops share ratio {}, using the first one",
                g0.ratio
            );
            0.0
        };
        return match mode {
            InterpolationMode::Rgb => g0.color.gradient(&g1.color, k),
            InterpolationMode::LinearRgb => g0.color.gradient_linear_rgb(&g1.color, k),
        };
    }

    last.color
}

// ============================================================================
// GradientLut
// ============================================================================

/// Premultiplied color table sampled evenly over ratios 0..=255.
#[derive(Debug, Clone)]
pub struct GradientLut {
    color_lut: Vec<Rgba8>,
}

impl GradientLut {
    /// Build a table of `size` entries (at least 2).
    ///
    /// The color transform is applied to each stop before interpolation, as
    /// the stops are what the producer describes.
    pub fn build(
        records: &[GradientRecord],
        mode: InterpolationMode,
        cxform: &SwfCxForm,
        size: usize,
    ) -> Result<Self> {
        let size = size.max(2);
        let stops: Vec<GradientRecord> = records
            .iter()
            .map(|r| GradientRecord::new(r.ratio, cxform.transform_rgba(r.color)))
            .collect();

        let mut color_lut = Vec::new();
        try_resize(&mut color_lut, size, Rgba8::TRANSPARENT)?;
        let step = 255.0 / (size - 1) as f64;
        for (i, entry) in color_lut.iter_mut().enumerate() {
            *entry = sample_stops(&stops, i as f64 * step, mode).premultiplied();
        }
        Ok(Self { color_lut })
    }

    /// First entry, the color used at gradient parameter 0.
    pub fn first(&self) -> Rgba8 {
        self.color_lut[0]
    }

    /// Last entry, the color used at gradient parameter 1.
    pub fn last(&self) -> Rgba8 {
        self.color_lut[self.color_lut.len() - 1]
    }
}

impl ColorFunction for GradientLut {
    #[inline]
    fn size(&self) -> usize {
        self.color_lut.len()
    }

    #[inline]
    fn get(&self, index: usize) -> Rgba8 {
        self.color_lut[index]
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba8 = Rgba8::new_opaque(255, 0, 0);
    const BLUE: Rgba8 = Rgba8::new_opaque(0, 0, 255);
    const GREEN: Rgba8 = Rgba8::new_opaque(0, 255, 0);

    fn two_stops() -> Vec<GradientRecord> {
        vec![GradientRecord::new(0, RED), GradientRecord::new(255, BLUE)]
    }

    #[test]
    fn test_lut_ends_match_stops() {
        let lut = GradientLut::build(
            &two_stops(),
            InterpolationMode::Rgb,
            &SwfCxForm::IDENTITY,
            256,
        )
        .unwrap();
        assert_eq!(lut.size(), 256);
        assert_eq!(lut.get(0), RED);
        assert_eq!(lut.get(255), BLUE);
        let mid = lut.get(128);
        assert!(mid.r > 100 && mid.r < 160, "mid.r={}", mid.r);
        assert!(mid.b > 100 && mid.b < 160, "mid.b={}", mid.b);
    }

    #[test]
    fn test_stops_clamp_outside_range() {
        let recs = vec![GradientRecord::new(64, RED), GradientRecord::new(192, BLUE)];
        assert_eq!(sample_stops(&recs, 0.0, InterpolationMode::Rgb), RED);
        assert_eq!(sample_stops(&recs, 63.0, InterpolationMode::Rgb), RED);
        assert_eq!(sample_stops(&recs, 192.0, InterpolationMode::Rgb), BLUE);
        assert_eq!(sample_stops(&recs, 255.0, InterpolationMode::Rgb), BLUE);
    }

    #[test]
    fn test_three_stops() {
        let recs = vec![
            GradientRecord::new(0, RED),
            GradientRecord::new(128, GREEN),
            GradientRecord::new(255, BLUE),
        ];
        assert_eq!(sample_stops(&recs, 128.0, InterpolationMode::Rgb), GREEN);
        let c = sample_stops(&recs, 64.0, InterpolationMode::Rgb);
        assert_eq!(c.b, 0);
        assert!(c.r > 0 && c.g > 0);
    }

    #[test]
    fn test_equal_ratios_first_wins() {
        let recs = vec![
            GradientRecord::new(100, GREEN),
            GradientRecord::new(100, BLUE),
            GradientRecord::new(255, RED),
        ];
        assert_eq!(sample_stops(&recs, 100.0, InterpolationMode::Rgb), GREEN);
    }

    #[test]
    fn test_unsorted_stops_do_not_panic() {
        let recs = vec![
            GradientRecord::new(200, RED),
            GradientRecord::new(50, GREEN),
            GradientRecord::new(255, BLUE),
        ];
        for r in 0..=255 {
            let _ = sample_stops(&recs, r as f64, InterpolationMode::LinearRgb);
        }
        assert_eq!(sample_stops(&recs, 10.0, InterpolationMode::Rgb), RED);
        assert_eq!(sample_stops(&[], 10.0, InterpolationMode::Rgb), Rgba8::TRANSPARENT);
    }

    #[test]
    fn test_cxform_applied_and_premultiplied() {
        let cx = SwfCxForm::with_mult(256, 256, 256, 128);
        let lut =
            GradientLut::build(&two_stops(), InterpolationMode::Rgb, &cx, 256).unwrap();
        assert_eq!(lut.first(), Rgba8::new(255, 0, 0, 127).premultiplied());
        assert_eq!(lut.first().a, 127);
        assert!(lut.first().r <= lut.first().a);
    }

    #[test]
    fn test_linear_rgb_differs_from_rgb() {
        let recs = vec![
            GradientRecord::new(0, Rgba8::BLACK),
            GradientRecord::new(255, Rgba8::WHITE),
        ];
        let rgb = sample_stops(&recs, 127.5, InterpolationMode::Rgb);
        let lin = sample_stops(&recs, 127.5, InterpolationMode::LinearRgb);
        assert!(lin.r > rgb.r);
    }

    #[test]
    fn test_custom_size() {
        let lut = GradientLut::build(
            &two_stops(),
            InterpolationMode::Rgb,
            &SwfCxForm::IDENTITY,
            1024,
        )
        .unwrap();
        assert_eq!(lut.size(), 1024);
        assert_eq!(lut.last(), BLUE);
    }
}
