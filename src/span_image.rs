//! Bitmap fill span generator.
//!
//! Samples a decoded image through the inverse paint transform with either
//! nearest-neighbor or bilinear filtering. Tiled fills wrap both axes,
//! clipped fills extend the edge pixels.

use crate::bitmap::DecodedImage;
use crate::color::Rgba8;
use crate::config::Quality;
use crate::cxform::SwfCxForm;
use crate::paint::SpanGenerator;
use crate::span_interpolator_linear::{SpanInterpolatorLinear, SUBPIXEL_SCALE, SUBPIXEL_SHIFT};
use crate::styles::{BitmapKind, SmoothingPolicy};

const SUBPIXEL_MASK: i32 = SUBPIXEL_SCALE - 1;

/// Whether a bitmap fill is filtered at the given quality.
///
/// Unspecified smoothing only kicks in at the best quality; nothing is
/// smoothed at the lowest.
pub fn resolve_smoothing(policy: SmoothingPolicy, quality: Quality) -> bool {
    match policy {
        SmoothingPolicy::Unspecified => quality >= Quality::Best,
        SmoothingPolicy::On => quality > Quality::Low,
        SmoothingPolicy::Off => false,
    }
}

// ============================================================================
// Wrapping
// ============================================================================

#[inline]
fn wrap_coord(v: i32, size: u32, kind: BitmapKind) -> u32 {
    match kind {
        BitmapKind::Tiled => v.rem_euclid(size as i32) as u32,
        BitmapKind::Clipped => v.clamp(0, size as i32 - 1) as u32,
    }
}

// ============================================================================
// SpanImage
// ============================================================================

pub struct SpanImage<'a> {
    image: &'a DecodedImage,
    interpolator: SpanInterpolatorLinear,
    kind: BitmapKind,
    smooth: bool,
    cxform: SwfCxForm,
}

impl<'a> SpanImage<'a> {
    pub fn new(
        image: &'a DecodedImage,
        interpolator: SpanInterpolatorLinear,
        kind: BitmapKind,
        smooth: bool,
        cxform: SwfCxForm,
    ) -> Self {
        Self {
            image,
            interpolator,
            kind,
            smooth,
            cxform,
        }
    }

    #[inline]
    fn texel(&self, x: i32, y: i32) -> Rgba8 {
        self.image.pixel(
            wrap_coord(x, self.image.width(), self.kind),
            wrap_coord(y, self.image.height(), self.kind),
        )
    }

    fn nearest(&self, x_hr: i32, y_hr: i32) -> Rgba8 {
        self.texel(x_hr >> SUBPIXEL_SHIFT, y_hr >> SUBPIXEL_SHIFT)
    }

    fn bilinear(&self, x_hr: i32, y_hr: i32) -> Rgba8 {
        // Sample positions refer to pixel centres.
        let x_hr = x_hr - SUBPIXEL_SCALE / 2;
        let y_hr = y_hr - SUBPIXEL_SCALE / 2;
        let x_lr = x_hr >> SUBPIXEL_SHIFT;
        let y_lr = y_hr >> SUBPIXEL_SHIFT;
        let x_frac = x_hr & SUBPIXEL_MASK;
        let y_frac = y_hr & SUBPIXEL_MASK;
        let subpix = SUBPIXEL_SCALE;

        let mut fg = [SUBPIXEL_SCALE * SUBPIXEL_SCALE / 2; 4];
        let taps = [
            (x_lr, y_lr, (subpix - x_frac) * (subpix - y_frac)),
            (x_lr + 1, y_lr, x_frac * (subpix - y_frac)),
            (x_lr, y_lr + 1, (subpix - x_frac) * y_frac),
            (x_lr + 1, y_lr + 1, x_frac * y_frac),
        ];
        for &(tx, ty, weight) in &taps {
            let p = self.texel(tx, ty);
            fg[0] += weight * p.r as i32;
            fg[1] += weight * p.g as i32;
            fg[2] += weight * p.b as i32;
            fg[3] += weight * p.a as i32;
        }

        let shift = SUBPIXEL_SHIFT * 2;
        Rgba8::new(
            (fg[0] >> shift) as u8,
            (fg[1] >> shift) as u8,
            (fg[2] >> shift) as u8,
            (fg[3] >> shift) as u8,
        )
    }
}

impl SpanGenerator for SpanImage<'_> {
    fn generate(&mut self, span: &mut [Rgba8], x: i32, y: i32, len: u32) {
        let transform = !self.cxform.is_identity();
        self.interpolator.begin(x as f64 + 0.5, y as f64 + 0.5, len);
        for pixel in span.iter_mut().take(len as usize) {
            let (x_hr, y_hr) = self.interpolator.coordinates();
            let mut c = if self.smooth {
                self.bilinear(x_hr, y_hr)
            } else {
                self.nearest(x_hr, y_hr)
            };
            // Dynamic images may carry color above alpha.
            c.clamp_to_alpha();
            if transform {
                c = self.cxform.transform_rgba(c).premultiplied();
            }
            *pixel = c;
            self.interpolator.next();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trans_affine::TransAffine;

    const RED: Rgba8 = Rgba8::new_opaque(255, 0, 0);
    const BLUE: Rgba8 = Rgba8::new_opaque(0, 0, 255);

    // 2x1 image: red, blue
    fn two_pixel() -> DecodedImage {
        DecodedImage::from_rgba(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255]).unwrap()
    }

    fn render(img: &DecodedImage, kind: BitmapKind, smooth: bool, x: i32, len: u32) -> Vec<Rgba8> {
        let mut sg = SpanImage::new(
            img,
            SpanInterpolatorLinear::new(TransAffine::new()),
            kind,
            smooth,
            SwfCxForm::IDENTITY,
        );
        let mut span = vec![Rgba8::default(); len as usize];
        sg.generate(&mut span, x, 0, len);
        span
    }

    #[test]
    fn test_resolve_smoothing() {
        assert!(!resolve_smoothing(SmoothingPolicy::Unspecified, Quality::High));
        assert!(resolve_smoothing(SmoothingPolicy::Unspecified, Quality::Best));
        assert!(resolve_smoothing(SmoothingPolicy::On, Quality::Medium));
        assert!(!resolve_smoothing(SmoothingPolicy::On, Quality::Low));
        assert!(!resolve_smoothing(SmoothingPolicy::Off, Quality::Best));
    }

    #[test]
    fn test_tiled_repeats() {
        let img = two_pixel();
        let span = render(&img, BitmapKind::Tiled, false, -2, 6);
        assert_eq!(span, vec![RED, BLUE, RED, BLUE, RED, BLUE]);
    }

    #[test]
    fn test_clipped_extends_edges() {
        let img = two_pixel();
        let span = render(&img, BitmapKind::Clipped, false, -2, 6);
        assert_eq!(span, vec![RED, RED, RED, BLUE, BLUE, BLUE]);
    }

    #[test]
    fn test_bilinear_blends_between_texels() {
        let img = two_pixel();
        // Scale by half so destination pixel centres fall between texels.
        let mut sg = SpanImage::new(
            &img,
            SpanInterpolatorLinear::new(TransAffine::new_scaling(0.5, 1.0)),
            BitmapKind::Clipped,
            true,
            SwfCxForm::IDENTITY,
        );
        let mut span = vec![Rgba8::default(); 4];
        sg.generate(&mut span, 0, 0, 4);
        assert_eq!(span[0], RED);
        assert_eq!(span[3], BLUE);
        assert!(span[1].r > span[2].r);
        assert!(span[1].b < span[2].b);
        assert!(span[1].r > 0 && span[1].b > 0);
    }

    #[test]
    fn test_channels_clamped_to_alpha() {
        let img = DecodedImage::from_rgba(1, 1, vec![255, 200, 10, 100]).unwrap();
        let span = render(&img, BitmapKind::Tiled, false, 0, 1);
        assert_eq!(span[0], Rgba8::new(100, 100, 10, 100));
    }

    #[test]
    fn test_cxform_applied_and_premultiplied() {
        let img = two_pixel();
        let mut sg = SpanImage::new(
            &img,
            SpanInterpolatorLinear::new(TransAffine::new()),
            BitmapKind::Tiled,
            false,
            SwfCxForm::with_mult(256, 256, 256, 128),
        );
        let mut span = vec![Rgba8::default(); 1];
        sg.generate(&mut span, 0, 0, 1);
        assert_eq!(span[0].a, 127);
        assert_eq!(span[0].r, 127);
    }

    #[test]
    fn test_rgb_image_is_opaque() {
        let img = DecodedImage::from_rgb(1, 1, vec![1, 2, 3]).unwrap();
        let span = render(&img, BitmapKind::Tiled, true, 5, 2);
        assert_eq!(span[0], Rgba8::new_opaque(1, 2, 3));
        assert_eq!(span[1], Rgba8::new_opaque(1, 2, 3));
    }
}
