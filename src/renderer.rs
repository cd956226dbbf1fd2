//! Render session.
//!
//! A [`Renderer`] owns the destination surface, the mask stack and every
//! scratch buffer of the pipeline. Shapes are drawn one subshape at a time:
//! fills go through the compound rasterizer with each path tagged by its
//! left and right fill, then strokes are rasterized and filled with the
//! non-zero rule. While a mask is being submitted, draws write coverage into
//! the mask instead of color into the surface.
//!
//! Drawing is limited to the invalidated regions of the frame. The
//! rasterizer clips to their bounding box and every span is cut to the
//! individual regions when it is blended.
//!
//! Drawing never fails. Malformed shapes degrade and are logged, and a draw
//! that runs out of memory is abandoned without affecting the session.

use crate::alpha_mask::{AlphaMask, MaskStack};
use crate::basics::{CoverType, FillingRule, PointD, RectI};
use crate::bitmap::{BitmapId, BitmapStore, DecodedImage, PixelFormat};
use crate::color::Rgba8;
use crate::config::RenderConfig;
use crate::curves::flatten_path;
use crate::cxform::SwfCxForm;
use crate::error::Result;
use crate::geometry::{Path, Shape, Subshape};
use crate::normalizer::normalize_subshape;
use crate::paint::{Paint, PaintCache, PaintContext, StyleKey};
use crate::rasterizer_compound_aa::{RasterizerCompoundAa, MAX_STYLE};
use crate::scanline_u::{Scanline, ScanlineU8};
use crate::span_allocator::SpanAllocator;
use crate::stroke::{snap_to_pixels, stroke_width, Stroker};
use crate::surface::Surface;
use crate::swf_matrix::SwfMatrix;
use crate::trans_affine::TransAffine;

// ============================================================================
// Clip boxes
// ============================================================================

/// Disjoint clipping rectangles (inclusive pixels) and their bounds.
#[derive(Debug, Clone, Default)]
struct ClipBoxes {
    boxes: Vec<RectI>,
    bounds: Option<RectI>,
}

impl ClipBoxes {
    fn reset_clipping(&mut self) {
        self.boxes.clear();
        self.bounds = None;
    }

    /// Add a box, clipped to `surface`. Parts already covered by earlier
    /// boxes are dropped so no pixel is drawn twice.
    fn add_clip_box(&mut self, region: RectI, surface: &RectI) {
        let mut cb = region;
        cb.normalize();
        if !cb.clip(surface) {
            return;
        }
        let mut pieces = vec![cb];
        for existing in &self.boxes {
            pieces = pieces
                .into_iter()
                .flat_map(|p| subtract_rect(p, existing))
                .collect();
        }
        for piece in pieces {
            self.bounds = Some(match self.bounds {
                Some(b) => RectI::new(
                    b.x1.min(piece.x1),
                    b.y1.min(piece.y1),
                    b.x2.max(piece.x2),
                    b.y2.max(piece.y2),
                ),
                None => piece,
            });
            self.boxes.push(piece);
        }
    }

    /// Boxes crossing row `y`.
    #[inline]
    fn on_row(&self, y: i32) -> impl Iterator<Item = &RectI> {
        self.boxes.iter().filter(move |b| b.y1 <= y && y <= b.y2)
    }
}

/// The parts of `r` outside `cut`, as up to four rectangles.
fn subtract_rect(r: RectI, cut: &RectI) -> Vec<RectI> {
    let mut overlap = r;
    if !overlap.clip(cut) {
        return vec![r];
    }
    [
        RectI::new(r.x1, r.y1, r.x2, overlap.y1 - 1),
        RectI::new(r.x1, overlap.y2 + 1, r.x2, r.y2),
        RectI::new(r.x1, overlap.y1, overlap.x1 - 1, overlap.y2),
        RectI::new(overlap.x2 + 1, overlap.y1, r.x2, overlap.y2),
    ]
    .into_iter()
    .filter(RectI::is_valid)
    .collect()
}

/// The part of a span starting at `x` that lies in the columns of `clip`.
#[inline]
fn clip_span<'a>(clip: &RectI, x: i32, covers: &'a [CoverType]) -> Option<(i32, &'a [CoverType])> {
    let end = x + covers.len() as i32 - 1;
    let x1 = x.max(clip.x1);
    let x2 = end.min(clip.x2);
    if x1 > x2 {
        return None;
    }
    Some((x1, &covers[(x1 - x) as usize..=(x2 - x) as usize]))
}

// ============================================================================
// Scanline output
// ============================================================================

/// Run the compound sweep, handing each style's scanline to `emit`.
fn sweep<F>(ras: &mut RasterizerCompoundAa, sl: &mut ScanlineU8, mut emit: F) -> Result<()>
where
    F: FnMut(u32, &ScanlineU8) -> Result<()>,
{
    if !ras.rewind_scanlines()? {
        return Ok(());
    }
    sl.reset(ras.min_x(), ras.max_x());
    loop {
        let num_styles = ras.sweep_styles();
        if num_styles == 0 {
            break;
        }
        for i in 0..num_styles {
            let style = ras.style(i);
            if ras.sweep_scanline(sl, i as i32) {
                emit(style, sl)?;
            }
        }
    }
    Ok(())
}

/// Blend one scanline of `paint` inside the clip boxes, modulated by the
/// active mask.
fn blend_scanline(
    surface: &mut Surface,
    mask: Option<&AlphaMask>,
    clips: &ClipBoxes,
    colors: &mut SpanAllocator<Rgba8>,
    covers: &mut SpanAllocator<CoverType>,
    sl: &ScanlineU8,
    paint: &mut Paint<'_>,
) -> Result<()> {
    let y = sl.y();
    for span in sl.spans() {
        for clip in clips.on_row(y) {
            let Some((x, src)) = clip_span(clip, span.x, sl.span_covers(span)) else {
                continue;
            };
            let len = src.len();
            let span_covers: &[CoverType] = match mask {
                Some(mask) => {
                    let buf = covers.allocate(len)?;
                    buf.copy_from_slice(src);
                    mask.combine_hspan(x, y, buf);
                    buf
                }
                None => src,
            };
            match paint {
                Paint::Solid(c) => surface.blend_solid_hspan(x, y, c, span_covers),
                Paint::Span(generator) => {
                    let buf = colors.allocate(len)?;
                    generator.generate(buf, x, y, len as u32);
                    surface.blend_color_hspan(x, y, buf, span_covers);
                }
            }
        }
    }
    Ok(())
}

/// Add one scanline of coverage, cut to the clip boxes, to the mask being
/// submitted.
fn submit_scanline(
    top: &mut AlphaMask,
    below: Option<&AlphaMask>,
    clips: &ClipBoxes,
    covers: &mut SpanAllocator<CoverType>,
    sl: &ScanlineU8,
) -> Result<()> {
    let y = sl.y();
    for span in sl.spans() {
        for clip in clips.on_row(y) {
            let Some((x, src)) = clip_span(clip, span.x, sl.span_covers(span)) else {
                continue;
            };
            let buf = covers.allocate(src.len())?;
            buf.copy_from_slice(src);
            if let Some(below) = below {
                below.combine_hspan(x, y, buf);
            }
            top.blend_hspan(x, y, buf);
        }
    }
    Ok(())
}

// ============================================================================
// Style resolution
// ============================================================================

/// Rasterizer style for a 1-based fill reference into a table of `count`
/// fills: 0-based, -1 for none. References past the table leave the side
/// unfilled.
fn fill_index(fill: u32, count: usize) -> i32 {
    if fill == 0 {
        return -1;
    }
    let style = fill - 1;
    if fill as usize > count || style > MAX_STYLE as u32 {
        log::warn!("Fill style {fill} out of range ({count} defined), side left unfilled");
        return -1;
    }
    style as i32
}

/// Both fills of `path` as rasterizer styles.
#[inline]
fn fill_styles(path: &Path, count: usize) -> (i32, i32) {
    (fill_index(path.left_fill, count), fill_index(path.right_fill, count))
}

/// Every filled side collapsed onto style 0.
#[inline]
fn single_style((left, right): (i32, i32)) -> (i32, i32) {
    (left.min(0), right.min(0))
}

/// Glyph sides: any fill reference counts, whatever the style table holds.
#[inline]
fn glyph_styles(path: &Path) -> (i32, i32) {
    (
        if path.left_fill == 0 { -1 } else { 0 },
        if path.right_fill == 0 { -1 } else { 0 },
    )
}

// ============================================================================
// Pipeline
// ============================================================================

/// Everything a draw call mutates.
struct Pipeline {
    surface: Surface,
    masks: MaskStack,
    rasterizer: RasterizerCompoundAa,
    scanline: ScanlineU8,
    colors: SpanAllocator<Rgba8>,
    covers: SpanAllocator<CoverType>,
    /// Regions being redrawn; empty draws nothing.
    clips: ClipBoxes,
}

impl Pipeline {
    /// Reset the rasterizer for a new outline. Returns false when nothing
    /// can be drawn.
    fn begin(&mut self, rule: FillingRule, config: &RenderConfig) -> bool {
        let Some(clip) = self.clips.bounds else {
            return false;
        };
        let ras = &mut self.rasterizer;
        ras.reset();
        ras.clip_box(
            clip.x1 as f64,
            clip.y1 as f64,
            (clip.x2 + 1) as f64,
            (clip.y2 + 1) as f64,
        );
        ras.filling_rule(rule);
        ras.set_anti_aliased(config.anti_aliased());
        ras.set_cell_limit(config.max_raster_cells);
        true
    }

    fn add_path(&mut self, path: &Path, (left, right): (i32, i32), mtx: &TransAffine, approx: f64) {
        if left < 0 && right < 0 {
            return;
        }
        let points = flatten_path(path, mtx, approx);
        if points.len() < 2 {
            return;
        }
        self.rasterizer.styles(left, right);
        self.rasterizer.add_polyline(&points, false);
    }

    fn add_polygons(&mut self, polygons: &[Vec<PointD>]) {
        self.rasterizer.styles(0, -1);
        for poly in polygons {
            self.rasterizer.add_polyline(poly, true);
        }
    }

    /// Paint every style of the current outline from the subshape's fills.
    fn render_fills<'a>(
        &mut self,
        index: usize,
        subshape: &Subshape,
        cache: &mut PaintCache<'a>,
        ctx: &PaintContext<'a>,
    ) -> Result<()> {
        if self.masks.hides_everything() {
            return Ok(());
        }
        let Pipeline {
            surface,
            masks,
            rasterizer,
            scanline,
            colors,
            covers,
            clips,
        } = self;
        let mask = masks.active();
        sweep(rasterizer, scanline, |style, sl| {
            let fill = style as usize + 1;
            let Some(fill_style) = subshape.fill_style(fill as u32) else {
                return Ok(());
            };
            let key = StyleKey {
                subshape: index,
                fill,
            };
            match cache.get_or_build(key, fill_style, ctx)? {
                Some(paint) => blend_scanline(surface, mask, clips, colors, covers, sl, paint),
                None => Ok(()),
            }
        })
    }

    /// Paint every style of the current outline with one color.
    fn render_solid(&mut self, color: Rgba8) -> Result<()> {
        let mut paint = Paint::Solid(color);
        if !paint.is_visible() || self.masks.hides_everything() {
            return Ok(());
        }
        let Pipeline {
            surface,
            masks,
            rasterizer,
            scanline,
            colors,
            covers,
            clips,
        } = self;
        let mask = masks.active();
        sweep(rasterizer, scanline, |_, sl| {
            blend_scanline(surface, mask, clips, colors, covers, sl, &mut paint)
        })
    }

    /// Write the current outline into the mask being submitted.
    fn render_mask(&mut self) -> Result<()> {
        let Pipeline {
            masks,
            rasterizer,
            scanline,
            covers,
            clips,
            ..
        } = self;
        let Some((top, below)) = masks.submit_target() else {
            return Ok(());
        };
        sweep(rasterizer, scanline, |_, sl| {
            submit_scanline(top, below, clips, covers, sl)
        })
    }

    /// Stroke every path with a line style and fill the outlines.
    fn draw_strokes(
        &mut self,
        config: &RenderConfig,
        subshape: &Subshape,
        world: &SwfMatrix,
        cxform: &SwfCxForm,
        mtx: &TransAffine,
    ) -> Result<()> {
        let approx = config.stroke_approximation_scale;
        let pixel_scale = config.pixel_scale();
        for path in &subshape.paths {
            if path.line == 0 || path.is_empty() {
                continue;
            }
            let Some(style) = subshape.line_style(path.line) else {
                log::warn!(
                    "Line style {} out of range ({} defined), stroke skipped",
                    path.line,
                    subshape.line_styles.len()
                );
                continue;
            };
            let color = cxform.transform_rgba(style.color).premultiplied();
            if color.is_transparent() {
                continue;
            }

            let width = stroke_width(style, world, pixel_scale);
            let stroker = Stroker::from_line_style(style, width, approx);
            let mut points = flatten_path(path, mtx, approx);
            if style.pixel_hinting {
                snap_to_pixels(&mut points);
            }
            let closed = path.is_closed() && !style.no_close;
            let polygons = stroker.stroke(&points, closed);
            if polygons.is_empty() {
                continue;
            }

            if !self.begin(FillingRule::NonZero, config) {
                return Ok(());
            }
            self.add_polygons(&polygons);
            self.render_solid(color)?;
        }
        Ok(())
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// A drawing session targeting one premultiplied RGBA surface.
pub struct Renderer {
    config: RenderConfig,
    bitmaps: BitmapStore,
    pipeline: Pipeline,
}

impl Renderer {
    pub fn new(width: u32, height: u32, config: RenderConfig) -> Result<Self> {
        let surface = Surface::new(width, height)?;
        let mut clips = ClipBoxes::default();
        clips.add_clip_box(surface.bounds(), &surface.bounds());
        log::debug!("Created {width}x{height} renderer, quality {:?}", config.quality);
        Ok(Self {
            bitmaps: BitmapStore::new(),
            pipeline: Pipeline {
                surface,
                masks: MaskStack::new(width, height, config.max_mask_depth),
                rasterizer: RasterizerCompoundAa::new(),
                scanline: ScanlineU8::new(),
                colors: SpanAllocator::new(),
                covers: SpanAllocator::new(),
                clips,
            },
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    #[inline]
    pub fn surface(&self) -> &Surface {
        &self.pipeline.surface
    }

    /// Number of mask layers on the stack.
    #[inline]
    pub fn mask_depth(&self) -> usize {
        self.pipeline.masks.depth()
    }

    // ------------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------------

    /// Register a decoded image for bitmap fills.
    pub fn register_bitmap(
        &mut self,
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<BitmapId> {
        let image = DecodedImage::new(width, height, stride, format, data)?;
        Ok(self.add_bitmap(image))
    }

    pub fn add_bitmap(&mut self, image: DecodedImage) -> BitmapId {
        let id = self.bitmaps.insert(image);
        log::trace!("Registered bitmap {id:?}");
        id
    }

    // ------------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------------

    /// Restrict drawing to `region` (inclusive pixels), clipped to the
    /// surface.
    pub fn set_invalidated_region(&mut self, region: RectI) {
        self.set_invalidated_regions(&[region]);
    }

    /// Restrict drawing to the union of `regions`. Overlaps are drawn once.
    pub fn set_invalidated_regions(&mut self, regions: &[RectI]) {
        let bounds = self.pipeline.surface.bounds();
        let clips = &mut self.pipeline.clips;
        clips.reset_clipping();
        for &region in regions {
            clips.add_clip_box(region, &bounds);
        }
        log::trace!("{} invalidated region(s)", clips.boxes.len());
    }

    /// Bounding box of the invalidated regions, `None` when nothing is
    /// drawn.
    pub fn invalidated_region(&self) -> Option<RectI> {
        self.pipeline.clips.bounds
    }

    /// Disjoint pieces of the invalidated regions.
    pub fn invalidated_regions(&self) -> &[RectI] {
        &self.pipeline.clips.boxes
    }

    /// Start a frame: restrict drawing to `invalidated` and clear it to
    /// `background`.
    pub fn begin_display(&mut self, background: Rgba8, invalidated: RectI) {
        self.begin_display_regions(background, &[invalidated]);
    }

    /// Start a frame redrawing several regions.
    pub fn begin_display_regions(&mut self, background: Rgba8, regions: &[RectI]) {
        let leftover = self.pipeline.masks.clear();
        if leftover > 0 {
            log::warn!("{leftover} mask layer(s) left over from the previous frame");
        }
        self.set_invalidated_regions(regions);
        let Pipeline { surface, clips, .. } = &mut self.pipeline;
        for clip in &clips.boxes {
            surface.clear_rect(clip, background);
        }
    }

    /// Finish a frame, dropping masks that were never disabled.
    pub fn end_display(&mut self) {
        let leftover = self.pipeline.masks.clear();
        if leftover > 0 {
            log::warn!("{leftover} mask layer(s) still active at end of frame");
        }
    }

    // ------------------------------------------------------------------------
    // Masks
    // ------------------------------------------------------------------------

    /// Draws up to [`end_submit_mask`](Self::end_submit_mask) build a new
    /// mask layer, intersected with the current one.
    ///
    /// If the layer can't be created, draws until the matching
    /// [`disable_mask`](Self::disable_mask) are hidden.
    pub fn begin_submit_mask(&mut self) {
        if let Err(e) = self.pipeline.masks.begin_submit() {
            log::error!("Couldn't create mask layer, masked content hidden: {e}");
        }
    }

    pub fn end_submit_mask(&mut self) {
        self.pipeline.masks.end_submit();
    }

    /// Drop the innermost mask.
    pub fn disable_mask(&mut self) {
        self.pipeline.masks.disable();
    }

    // ------------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------------

    /// Shape twips to device pixels for an object with matrix `world`.
    pub fn world_to_pixels(&self, world: &SwfMatrix) -> TransAffine {
        let scale = self.config.pixel_scale();
        let offset = self.config.pixel_offset;
        let mut m = world.to_affine();
        m.scale(scale, scale);
        m.translate(offset, offset);
        m
    }

    /// Draw a shape with its own fill and line styles.
    pub fn draw_shape(&mut self, shape: &Shape, world: &SwfMatrix, cxform: &SwfCxForm) {
        if let Err(e) = self.draw_shape_impl(shape, world, cxform, false) {
            log::error!("Shape draw aborted: {e}");
        }
    }

    /// Like [`draw_shape`](Self::draw_shape), but fills are first rewritten
    /// into single-sided contours.
    pub fn draw_shape_normalized(&mut self, shape: &Shape, world: &SwfMatrix, cxform: &SwfCxForm) {
        if let Err(e) = self.draw_shape_impl(shape, world, cxform, true) {
            log::error!("Normalized shape draw aborted: {e}");
        }
    }

    /// Draw a glyph outline in a single color with the glyph fill rule.
    pub fn draw_glyph(&mut self, shape: &Shape, color: Rgba8, world: &SwfMatrix) {
        if let Err(e) = self.draw_glyph_impl(shape, color, world) {
            log::error!("Glyph draw aborted: {e}");
        }
    }

    fn draw_shape_impl(
        &mut self,
        shape: &Shape,
        world: &SwfMatrix,
        cxform: &SwfCxForm,
        normalize: bool,
    ) -> Result<()> {
        if shape.is_empty() {
            log::debug!("Skipping empty shape");
            return Ok(());
        }
        let submitting = self.pipeline.masks.is_submitting();
        if !submitting && cxform.is_invisible() {
            log::debug!("Skipping shape with invisible color transform");
            return Ok(());
        }

        let mtx = self.world_to_pixels(world);
        let approx = self.config.stroke_approximation_scale;
        let rule = self.config.shape_fill_rule;
        let ctx = PaintContext {
            shape_to_pixels: mtx,
            cxform: *cxform,
            quality: self.config.quality,
            lut_size: self.config.lut_size(),
            bitmaps: &self.bitmaps,
        };
        let mut cache = PaintCache::new();

        for (index, subshape) in shape.subshapes.iter().enumerate() {
            if !self.pipeline.begin(rule, &self.config) {
                return Ok(());
            }
            let fills = subshape.fill_styles.len();
            let resolve = |path: &Path| {
                let styles = fill_styles(path, fills);
                if submitting {
                    single_style(styles)
                } else {
                    styles
                }
            };
            if normalize {
                let normalized = normalize_subshape(subshape);
                for contour in &normalized.contours {
                    let no_close = subshape
                        .line_style(contour.paths.first().map_or(0, |p| p.line))
                        .map_or(false, |ls| ls.no_close);
                    let path = contour.to_path(no_close);
                    self.pipeline.add_path(&path, resolve(&path), &mtx, approx);
                }
            } else {
                for path in subshape.paths.iter().filter(|p| p.has_fill()) {
                    self.pipeline.add_path(path, resolve(path), &mtx, approx);
                }
            }

            if submitting {
                // Masks only care about filled area.
                self.pipeline.render_mask()?;
                continue;
            }
            self.pipeline.render_fills(index, subshape, &mut cache, &ctx)?;
            self.pipeline
                .draw_strokes(&self.config, subshape, world, cxform, &mtx)?;
        }
        log::trace!("Drew shape with {} cached paint(s)", cache.len());
        Ok(())
    }

    fn draw_glyph_impl(&mut self, shape: &Shape, color: Rgba8, world: &SwfMatrix) -> Result<()> {
        if shape.is_empty() {
            return Ok(());
        }
        let mtx = self.world_to_pixels(world);
        let approx = self.config.stroke_approximation_scale;
        let rule = self.config.glyph_fill_rule;
        let color = color.premultiplied();
        let submitting = self.pipeline.masks.is_submitting();

        for subshape in &shape.subshapes {
            if !self.pipeline.begin(rule, &self.config) {
                return Ok(());
            }
            for path in subshape.paths.iter().filter(|p| p.has_fill()) {
                self.pipeline.add_path(path, glyph_styles(path), &mtx, approx);
            }
            if submitting {
                self.pipeline.render_mask()?;
            } else {
                self.pipeline.render_solid(color)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
