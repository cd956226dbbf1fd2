//! Fill and line styles.
//!
//! [`FillStyle`] is a closed sum over the three paint kinds. Styles are plain
//! values: anything derived from them for rendering (gradient tables, image
//! samplers) lives in per-draw caches, never inside the style.

use crate::bitmap::BitmapId;
use crate::color::Rgba8;
use crate::swf_matrix::SwfMatrix;
use crate::trans_affine::TransAffine;

// ============================================================================
// Fill styles
// ============================================================================

/// A fill style referenced by a path side.
#[derive(Debug, Clone, PartialEq)]
pub enum FillStyle {
    Solid(SolidFill),
    Gradient(GradientFill),
    Bitmap(BitmapFill),
}

impl FillStyle {
    pub fn solid(color: Rgba8) -> Self {
        FillStyle::Solid(SolidFill { color })
    }

    /// A gradient fill, collapsing to a solid fill when fewer than two stops
    /// are given.
    pub fn gradient(fill: GradientFill) -> Self {
        fill.into()
    }

    pub fn bitmap(fill: BitmapFill) -> Self {
        FillStyle::Bitmap(fill)
    }
}

/// Constant color fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SolidFill {
    pub color: Rgba8,
}

// ----------------------------------------------------------------------------
// Gradients
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GradientKind {
    Linear,
    Radial,
    /// Radial with the focal point moved along the x axis.
    Focal,
}

/// How the gradient parameter is extended past [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpreadMode {
    #[default]
    Pad,
    Reflect,
    Repeat,
}

/// Color space used between stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterpolationMode {
    #[default]
    Rgb,
    LinearRgb,
}

/// One gradient stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GradientRecord {
    pub ratio: u8,
    pub color: Rgba8,
}

impl GradientRecord {
    pub const fn new(ratio: u8, color: Rgba8) -> Self {
        Self { ratio, color }
    }
}

/// Size of the gradient square in twips: the unit gradient spans
/// [-16384, 16384] on each axis before the fill matrix is applied.
pub const GRADIENT_SQUARE_HALF: f64 = 16384.0;

/// Radius of radial gradients in gradient space.
pub const RADIAL_GRADIENT_RADIUS: f64 = 32.0;

/// Length of linear gradients in gradient space.
pub const LINEAR_GRADIENT_LENGTH: f64 = 256.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GradientFill {
    pub kind: GradientKind,
    /// Stops, non-decreasing in ratio when the producer is well behaved.
    pub records: Vec<GradientRecord>,
    /// Maps the unit gradient square into shape twips.
    pub matrix: SwfMatrix,
    pub spread: SpreadMode,
    pub interpolation: InterpolationMode,
    /// Focal point offset along x in [-1, 1]; only used by focal gradients.
    pub focal_point: f64,
}

impl GradientFill {
    pub fn new(kind: GradientKind, matrix: SwfMatrix, records: Vec<GradientRecord>) -> Self {
        Self {
            kind,
            records,
            matrix,
            spread: SpreadMode::Pad,
            interpolation: InterpolationMode::Rgb,
            focal_point: 0.0,
        }
    }

    pub fn with_spread(mut self, spread: SpreadMode) -> Self {
        self.spread = spread;
        self
    }

    pub fn with_interpolation(mut self, interpolation: InterpolationMode) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Set the focal point, clamped to [-1, 1].
    pub fn with_focal_point(mut self, focal_point: f64) -> Self {
        self.set_focal_point(focal_point);
        self
    }

    pub fn set_focal_point(&mut self, focal_point: f64) {
        self.focal_point = if focal_point.is_nan() {
            0.0
        } else {
            focal_point.clamp(-1.0, 1.0)
        };
    }

    /// Transform from shape twips into gradient space.
    ///
    /// Linear gradients land in [0, 256] along x. Radial and focal gradients
    /// land in a 64x64 square whose centre (32, 32) is the gradient origin and
    /// whose unit circle has radius 32.
    pub fn gradient_matrix(&self) -> TransAffine {
        let mut m = self.matrix.to_affine();
        m.invert();
        match self.kind {
            GradientKind::Linear => {
                let s = LINEAR_GRADIENT_LENGTH / (2.0 * GRADIENT_SQUARE_HALF);
                m.scale(s, s);
                m.translate(LINEAR_GRADIENT_LENGTH / 2.0, 0.0);
            }
            GradientKind::Radial | GradientKind::Focal => {
                let s = RADIAL_GRADIENT_RADIUS / GRADIENT_SQUARE_HALF;
                m.scale(s, s);
                m.translate(RADIAL_GRADIENT_RADIUS, RADIAL_GRADIENT_RADIUS);
            }
        }
        m
    }
}

impl From<GradientFill> for FillStyle {
    fn from(fill: GradientFill) -> Self {
        match fill.records.len() {
            0 => {
                log::warn!("Gradient fill without color stops, using transparent black");
                FillStyle::solid(Rgba8::TRANSPARENT)
            }
            1 => FillStyle::solid(fill.records[0].color),
            _ => FillStyle::Gradient(fill),
        }
    }
}

// ----------------------------------------------------------------------------
// Bitmaps
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitmapKind {
    /// Repeat the image on both axes.
    #[default]
    Tiled,
    /// Extend edge pixels past the image.
    Clipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SmoothingPolicy {
    /// Smooth only when the session renders at the best quality.
    #[default]
    Unspecified,
    On,
    Off,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BitmapFill {
    pub kind: BitmapKind,
    pub smoothing: SmoothingPolicy,
    /// Maps bitmap pixels into shape twips.
    pub matrix: SwfMatrix,
    /// Registered image; `None` when the producer could not resolve it.
    pub bitmap: Option<BitmapId>,
}

impl BitmapFill {
    pub fn new(kind: BitmapKind, bitmap: Option<BitmapId>, matrix: SwfMatrix) -> Self {
        Self {
            kind,
            smoothing: SmoothingPolicy::Unspecified,
            matrix,
            bitmap,
        }
    }

    pub fn with_smoothing(mut self, smoothing: SmoothingPolicy) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// Transform from shape twips into bitmap pixels.
    pub fn bitmap_matrix(&self) -> TransAffine {
        let mut m = self.matrix.to_affine();
        m.invert();
        m
    }
}

// ============================================================================
// Line styles
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CapStyle {
    #[default]
    Round,
    None,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinStyle {
    #[default]
    Round,
    Bevel,
    Miter,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    /// Width in twips; 0 draws a one pixel hairline.
    pub thickness: u16,
    pub color: Rgba8,
    pub scale_horizontally: bool,
    pub scale_vertically: bool,
    pub pixel_hinting: bool,
    /// Leave contours open instead of closing them implicitly.
    pub no_close: bool,
    pub start_cap: CapStyle,
    pub end_cap: CapStyle,
    pub join: JoinStyle,
    pub miter_limit: f64,
}

pub const DEFAULT_MITER_LIMIT: f64 = 3.0;

impl LineStyle {
    pub fn new(thickness: u16, color: Rgba8) -> Self {
        Self {
            thickness,
            color,
            scale_horizontally: true,
            scale_vertically: true,
            pixel_hinting: false,
            no_close: false,
            start_cap: CapStyle::Round,
            end_cap: CapStyle::Round,
            join: JoinStyle::Round,
            miter_limit: DEFAULT_MITER_LIMIT,
        }
    }

    /// Whether the stroke width follows the object transform on either axis.
    #[inline]
    pub fn scales_thickness(&self) -> bool {
        self.scale_horizontally || self.scale_vertically
    }
}

impl Default for LineStyle {
    fn default() -> Self {
        Self::new(0, Rgba8::BLACK)
    }
}

// ============================================================================
// Tests
// ============================================================================
