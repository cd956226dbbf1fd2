//! # swf-render
//!
//! Flash-style vector shape geometry and compositing.
//!
//! Shapes are made of subshapes, each holding fill and line style tables and
//! a list of paths. A path is a chain of straight and quadratic edges in twips
//! that names a fill on each of its sides and optionally a line style. The
//! engine draws such shapes into a premultiplied RGBA surface:
//!
//! - Fills go through a compound scanline rasterizer that resolves the
//!   left/right fill of every edge in one pass, so shared edges between two
//!   fills produce no seams.
//! - Solid, gradient (linear, radial, focal) and bitmap paints with color
//!   transforms.
//! - Strokes with caps, joins and hairlines.
//! - Nested clip masks.
//! - Morph shape interpolation.
//! - A path normalizer that rewrites two-sided fills into closed single-sided
//!   contours for tessellating consumers.
//!
//! ## Architecture
//!
//! A draw call flows through four stages:
//!
//! 1. **Geometry** (`geometry`, `styles`, `swf_matrix`, `cxform`): the shape
//!    model and its transforms
//! 2. **Flattening** (`curves`, `stroke`): edges become device-space polylines
//!    and stroke outlines
//! 3. **Rasterization** (`rasterizer_compound_aa`, `scanline_u`): per-style
//!    anti-aliased coverage
//! 4. **Compositing** (`paint`, `alpha_mask`, `surface`): span colors blended
//!    under the active mask
//!
//! [`Renderer`] ties the stages together into a drawing session.

// Phase 1: Foundation Types & Math
pub mod basics;
pub mod color;
pub mod config;
pub mod error;
pub mod trans_affine;

// Phase 2: Shape Model
pub mod bitmap;
pub mod cxform;
pub mod geometry;
pub mod styles;
pub mod swf_matrix;

// Phase 3: Geometry Processing
pub mod curves;
pub mod morph;
pub mod normalizer;
pub mod stroke;

// Phase 4: Scanline Rasterizer
pub mod dda_line;
pub mod rasterizer_compound_aa;
pub mod rasterizer_sl_clip;
pub mod scanline_u;

// Phase 5: Paint Generation
pub mod gradient_lut;
pub mod paint;
pub mod span_allocator;
pub mod span_gradient;
pub mod span_image;
pub mod span_interpolator_linear;

// Phase 6: Compositing & Session
pub mod alpha_mask;
pub mod renderer;
pub mod surface;

// Phase 7: Device Fonts
#[cfg(feature = "font")]
pub mod font_provider;

pub use bitmap::{BitmapId, DecodedImage, PixelFormat};
pub use color::Rgba8;
pub use config::{Quality, RenderConfig};
pub use cxform::SwfCxForm;
pub use error::{RenderError, Result};
pub use geometry::{Edge, Path, Point, Shape, Subshape, SwfRect};
pub use morph::Morph;
pub use renderer::Renderer;
pub use styles::{FillStyle, LineStyle};
pub use swf_matrix::SwfMatrix;

#[cfg(feature = "font")]
pub use font_provider::{FontProvider, Glyph};
