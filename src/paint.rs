//! Paint generators.
//!
//! Every fill style resolves, once per draw call, to a [`Paint`]: either a
//! constant premultiplied color or a boxed [`SpanGenerator`] producing one
//! color per pixel. [`PaintCache`] holds the resolved paints for a draw call
//! so gradient tables are built once per style, keyed by where the style
//! lives in the shape rather than stored on the style.

use std::collections::HashMap;

use crate::bitmap::BitmapSource;
use crate::color::Rgba8;
use crate::config::Quality;
use crate::cxform::SwfCxForm;
use crate::error::Result;
use crate::gradient_lut::GradientLut;
use crate::span_gradient::{
    GradientFunction, GradientPadAdaptor, GradientRadial, GradientRadialFocus,
    GradientReflectAdaptor, GradientRepeatAdaptor, GradientX, SpanGradient,
};
use crate::span_image::{resolve_smoothing, SpanImage};
use crate::span_interpolator_linear::SpanInterpolatorLinear;
use crate::styles::{
    BitmapFill, FillStyle, GradientFill, GradientKind, SpreadMode, LINEAR_GRADIENT_LENGTH,
    RADIAL_GRADIENT_RADIUS,
};
use crate::trans_affine::TransAffine;

// ============================================================================
// SpanGenerator trait
// ============================================================================

/// Produces per-pixel colors for a horizontal span.
///
/// Colors written to `span[..len]` are premultiplied.
pub trait SpanGenerator {
    fn generate(&mut self, span: &mut [Rgba8], x: i32, y: i32, len: u32);
}

/// A resolved fill.
pub enum Paint<'a> {
    /// Constant premultiplied color.
    Solid(Rgba8),
    Span(Box<dyn SpanGenerator + 'a>),
}

impl Paint<'_> {
    /// Whether drawing with this paint can change any pixel.
    pub fn is_visible(&self) -> bool {
        match self {
            Paint::Solid(c) => !c.is_transparent(),
            Paint::Span(_) => true,
        }
    }
}

impl std::fmt::Debug for Paint<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Paint::Solid(c) => f.debug_tuple("Solid").field(c).finish(),
            Paint::Span(_) => f.write_str("Span(..)"),
        }
    }
}

// ============================================================================
// PaintContext
// ============================================================================

/// Per draw call state shared by every style of a shape.
pub struct PaintContext<'a> {
    /// Shape twips to device pixels.
    pub shape_to_pixels: TransAffine,
    pub cxform: SwfCxForm,
    pub quality: Quality,
    pub lut_size: usize,
    pub bitmaps: &'a dyn BitmapSource,
}

impl<'a> PaintContext<'a> {
    /// Device pixels back to shape twips.
    fn pixels_to_shape(&self) -> TransAffine {
        let mut m = self.shape_to_pixels;
        m.invert();
        m
    }

    /// Resolve a fill style. `None` means the style cannot be painted, such as
    /// a bitmap fill whose image is missing.
    pub fn build(&self, style: &FillStyle) -> Result<Option<Paint<'a>>> {
        match style {
            FillStyle::Solid(s) => Ok(Some(Paint::Solid(
                self.cxform.transform_rgba(s.color).premultiplied(),
            ))),
            FillStyle::Gradient(g) => self.build_gradient(g).map(Some),
            FillStyle::Bitmap(b) => Ok(self.build_bitmap(b)),
        }
    }

    fn build_gradient(&self, g: &GradientFill) -> Result<Paint<'a>> {
        let lut = GradientLut::build(&g.records, g.interpolation, &self.cxform, self.lut_size)?;

        let mut mtx = self.pixels_to_shape();
        mtx.multiply(&g.gradient_matrix());

        let paint = match g.kind {
            GradientKind::Linear => {
                spread_gradient(g.spread, GradientX, mtx, lut, LINEAR_GRADIENT_LENGTH)
            }
            GradientKind::Radial | GradientKind::Focal => {
                // Radial functions measure from the origin.
                mtx.translate(-RADIAL_GRADIENT_RADIUS, -RADIAL_GRADIENT_RADIUS);
                if g.kind == GradientKind::Focal && g.focal_point != 0.0 {
                    let focus = GradientRadialFocus::new(
                        RADIAL_GRADIENT_RADIUS,
                        g.focal_point * RADIAL_GRADIENT_RADIUS,
                        0.0,
                    );
                    spread_gradient(g.spread, focus, mtx, lut, RADIAL_GRADIENT_RADIUS)
                } else {
                    spread_gradient(g.spread, GradientRadial, mtx, lut, RADIAL_GRADIENT_RADIUS)
                }
            }
        };
        Ok(paint)
    }

    fn build_bitmap(&self, b: &BitmapFill) -> Option<Paint<'a>> {
        let bitmaps = self.bitmaps;
        let image = match b.bitmap.and_then(|id| bitmaps.bitmap(id)) {
            Some(image) => image,
            None => {
                log::warn!("Bitmap fill references unknown bitmap {:?}", b.bitmap);
                return None;
            }
        };

        let mut mtx = self.pixels_to_shape();
        mtx.multiply(&b.bitmap_matrix());
        let smooth = resolve_smoothing(b.smoothing, self.quality);
        Some(Paint::Span(Box::new(SpanImage::new(
            image,
            SpanInterpolatorLinear::new(mtx),
            b.kind,
            smooth,
            self.cxform,
        ))))
    }
}

fn spread_gradient<'a, G>(
    spread: SpreadMode,
    gradient: G,
    mtx: TransAffine,
    lut: GradientLut,
    length: f64,
) -> Paint<'a>
where
    G: GradientFunction + 'a,
{
    fn boxed<'a, G: GradientFunction + 'a>(
        g: G,
        mtx: TransAffine,
        lut: GradientLut,
        length: f64,
    ) -> Paint<'a> {
        Paint::Span(Box::new(SpanGradient::new(
            SpanInterpolatorLinear::new(mtx),
            g,
            lut,
            0.0,
            length,
        )))
    }

    match spread {
        SpreadMode::Pad => boxed(GradientPadAdaptor::new(gradient), mtx, lut, length),
        SpreadMode::Reflect => boxed(GradientReflectAdaptor::new(gradient), mtx, lut, length),
        SpreadMode::Repeat => boxed(GradientRepeatAdaptor::new(gradient), mtx, lut, length),
    }
}

// ============================================================================
// PaintCache
// ============================================================================

/// Identity of a fill style within a shape: subshape position and 1-based
/// fill index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleKey {
    pub subshape: usize,
    pub fill: usize,
}

/// Paints resolved during one draw call.
#[derive(Default)]
pub struct PaintCache<'a> {
    paints: HashMap<StyleKey, Option<Paint<'a>>>,
}

impl<'a> PaintCache<'a> {
    pub fn new() -> Self {
        Self {
            paints: HashMap::new(),
        }
    }

    /// The paint for `key`, building it from `style` on first use.
    pub fn get_or_build(
        &mut self,
        key: StyleKey,
        style: &FillStyle,
        ctx: &PaintContext<'a>,
    ) -> Result<Option<&mut Paint<'a>>> {
        if !self.paints.contains_key(&key) {
            let paint = ctx.build(style)?;
            self.paints.insert(key, paint);
        }
        Ok(self.paints.get_mut(&key).and_then(|p| p.as_mut()))
    }

    pub fn len(&self) -> usize {
        self.paints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paints.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
