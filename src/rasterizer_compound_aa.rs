//! Compound anti-aliased rasterizer with per-edge style indices.
//!
//! Every edge carries a left and a right style. While sweeping a scanline the
//! rasterizer accumulates coverage separately per style: the left style of an
//! edge receives its area and cover, the right style receives the negated
//! values. One pass over an unnormalized shape thus yields, per scanline, the
//! list of active styles and the coverage of each, resolved with the selected
//! fill rule. Style `-1` means "nothing on this side" and is never reported.

use crate::basics::{FillingRule, PointD, POLY_SUBPIXEL_MASK, POLY_SUBPIXEL_SCALE, POLY_SUBPIXEL_SHIFT};
use crate::config::DEFAULT_MAX_RASTER_CELLS;
use crate::error::{RenderError, Result};
use crate::rasterizer_sl_clip::{upscale, CellLine, RasterizerSlClip};
use crate::scanline_u::Scanline;

/// Largest style index a cell can carry.
pub const MAX_STYLE: i32 = i16::MAX as i32;

// ============================================================================
// CellStyleAa
// ============================================================================

/// A pixel cell with left/right style indices.
#[derive(Debug, Clone, Copy)]
pub struct CellStyleAa {
    pub x: i32,
    pub y: i32,
    pub cover: i32,
    pub area: i32,
    pub left: i16,
    pub right: i16,
}

impl CellStyleAa {
    #[inline]
    pub fn initial(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn style(&mut self, other: &CellStyleAa) {
        self.left = other.left;
        self.right = other.right;
    }

    #[inline]
    pub fn not_equal(&self, ex: i32, ey: i32, style: &CellStyleAa) -> bool {
        (ex as u32).wrapping_sub(self.x as u32)
            | (ey as u32).wrapping_sub(self.y as u32)
            | (self.left as u32).wrapping_sub(style.left as u32)
            | (self.right as u32).wrapping_sub(style.right as u32)
            != 0
    }
}

impl Default for CellStyleAa {
    fn default() -> Self {
        Self {
            x: i32::MAX,
            y: i32::MAX,
            cover: 0,
            area: 0,
            left: -1,
            right: -1,
        }
    }
}

/// Order in which the active styles of a scanline are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerOrder {
    Unsorted,
    /// Highest style first.
    Direct,
    /// Lowest style first.
    Inverse,
}

// ============================================================================
// CellsEngine
// ============================================================================

/// Limit for dx magnitude before recursive subdivision.
const DX_LIMIT: i64 = 16384 << POLY_SUBPIXEL_SHIFT;

#[derive(Debug, Clone, Copy, Default)]
struct SortedY {
    start: u32,
    num: u32,
}

/// Accumulates styled cells along lines given in 24.8 fixed point.
struct CellsEngine {
    cells: Vec<CellStyleAa>,
    sorted_cells: Vec<u32>,
    sorted_y: Vec<SortedY>,
    curr_cell: CellStyleAa,
    style_cell: CellStyleAa,
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
    sorted: bool,
    cell_limit: usize,
    overflow: bool,
}

impl CellsEngine {
    fn new() -> Self {
        Self {
            cells: Vec::new(),
            sorted_cells: Vec::new(),
            sorted_y: Vec::new(),
            curr_cell: CellStyleAa::default(),
            style_cell: CellStyleAa::default(),
            min_x: i32::MAX,
            min_y: i32::MAX,
            max_x: i32::MIN,
            max_y: i32::MIN,
            sorted: false,
            cell_limit: DEFAULT_MAX_RASTER_CELLS,
            overflow: false,
        }
    }

    fn reset(&mut self) {
        self.cells.clear();
        self.sorted_cells.clear();
        self.sorted_y.clear();
        self.curr_cell.initial();
        self.style_cell.initial();
        self.min_x = i32::MAX;
        self.min_y = i32::MAX;
        self.max_x = i32::MIN;
        self.max_y = i32::MIN;
        self.sorted = false;
        self.overflow = false;
    }

    #[inline]
    fn style(&mut self, style_cell: &CellStyleAa) {
        self.style_cell.style(style_cell);
    }

    #[inline]
    fn scanline_cells(&self, y: i32) -> &[u32] {
        let sy = &self.sorted_y[(y - self.min_y) as usize];
        &self.sorted_cells[sy.start as usize..(sy.start + sy.num) as usize]
    }

    #[inline]
    fn add_curr_cell(&mut self) {
        if self.curr_cell.area | self.curr_cell.cover != 0 {
            if self.cells.len() >= self.cell_limit || self.cells.try_reserve(1).is_err() {
                self.overflow = true;
                return;
            }
            self.cells.push(self.curr_cell);
        }
    }

    #[inline]
    fn set_curr_cell(&mut self, x: i32, y: i32) {
        if self.curr_cell.not_equal(x, y, &self.style_cell) {
            self.add_curr_cell();
            self.curr_cell.style(&self.style_cell);
            self.curr_cell.x = x;
            self.curr_cell.y = y;
            self.curr_cell.cover = 0;
            self.curr_cell.area = 0;
        }
    }

    fn render_hline(&mut self, ey: i32, x1: i32, y1: i32, x2: i32, y2: i32) {
        let ex1 = x1 >> POLY_SUBPIXEL_SHIFT;
        let ex2 = x2 >> POLY_SUBPIXEL_SHIFT;
        let fx1 = x1 & POLY_SUBPIXEL_MASK as i32;
        let fx2 = x2 & POLY_SUBPIXEL_MASK as i32;

        if y1 == y2 {
            self.set_curr_cell(ex2, ey);
            return;
        }

        if ex1 == ex2 {
            let delta = y2 - y1;
            self.curr_cell.cover += delta;
            self.curr_cell.area += (fx1 + fx2) * delta;
            return;
        }

        let mut p = (POLY_SUBPIXEL_SCALE as i64 - fx1 as i64) * (y2 - y1) as i64;
        let mut first = POLY_SUBPIXEL_SCALE as i32;
        let mut incr = 1_i32;
        let mut dx = x2 as i64 - x1 as i64;

        if dx < 0 {
            p = fx1 as i64 * (y2 - y1) as i64;
            first = 0;
            incr = -1;
            dx = -dx;
        }

        let mut delta = (p / dx) as i32;
        let mut modulo = p % dx;
        if modulo < 0 {
            delta -= 1;
            modulo += dx;
        }

        self.curr_cell.cover += delta;
        self.curr_cell.area += (fx1 + first) * delta;

        let mut ex1 = ex1 + incr;
        self.set_curr_cell(ex1, ey);
        let mut y1 = y1 + delta;

        if ex1 != ex2 {
            p = POLY_SUBPIXEL_SCALE as i64 * (y2 - y1 + delta) as i64;
            let mut lift = (p / dx) as i32;
            let mut rem = p % dx;
            if rem < 0 {
                lift -= 1;
                rem += dx;
            }
            modulo -= dx;

            while ex1 != ex2 {
                delta = lift;
                modulo += rem;
                if modulo >= 0 {
                    modulo -= dx;
                    delta += 1;
                }
                self.curr_cell.cover += delta;
                self.curr_cell.area += POLY_SUBPIXEL_SCALE as i32 * delta;
                y1 += delta;
                ex1 += incr;
                self.set_curr_cell(ex1, ey);
            }
        }
        delta = y2 - y1;
        self.curr_cell.cover += delta;
        self.curr_cell.area += (fx2 + POLY_SUBPIXEL_SCALE as i32 - first) * delta;
    }

    fn sort_cells(&mut self) {
        if self.sorted {
            return;
        }

        self.add_curr_cell();
        self.curr_cell.initial();

        if self.cells.is_empty() {
            return;
        }

        let num_cells = self.cells.len();
        self.sorted_cells.clear();
        self.sorted_cells.resize(num_cells, 0);

        let y_range = (self.max_y - self.min_y + 1) as usize;
        self.sorted_y.clear();
        self.sorted_y.resize(y_range, SortedY::default());

        // Histogram by y, then prefix sums into start offsets
        for cell in &self.cells {
            self.sorted_y[(cell.y - self.min_y) as usize].start += 1;
        }
        let mut start = 0u32;
        for sy in &mut self.sorted_y {
            let count = sy.start;
            sy.start = start;
            start += count;
        }

        for (i, cell) in self.cells.iter().enumerate() {
            let sy = &mut self.sorted_y[(cell.y - self.min_y) as usize];
            self.sorted_cells[(sy.start + sy.num) as usize] = i as u32;
            sy.num += 1;
        }

        let cells = &self.cells;
        for sy in &self.sorted_y {
            if sy.num > 0 {
                let slice = &mut self.sorted_cells[sy.start as usize..(sy.start + sy.num) as usize];
                slice.sort_unstable_by_key(|&idx| cells[idx as usize].x);
            }
        }

        self.sorted = true;
    }
}

impl CellLine for CellsEngine {
    fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let dx = x2 as i64 - x1 as i64;

        if dx >= DX_LIMIT || dx <= -DX_LIMIT {
            let cx = ((x1 as i64 + x2 as i64) >> 1) as i32;
            let cy = ((y1 as i64 + y2 as i64) >> 1) as i32;
            self.line(x1, y1, cx, cy);
            self.line(cx, cy, x2, y2);
            return;
        }

        let dy = y2 as i64 - y1 as i64;
        let ex1 = x1 >> POLY_SUBPIXEL_SHIFT;
        let ex2 = x2 >> POLY_SUBPIXEL_SHIFT;
        let ey1_orig = y1 >> POLY_SUBPIXEL_SHIFT;
        let ey2 = y2 >> POLY_SUBPIXEL_SHIFT;
        let fy1 = y1 & POLY_SUBPIXEL_MASK as i32;
        let fy2 = y2 & POLY_SUBPIXEL_MASK as i32;

        self.min_x = self.min_x.min(ex1).min(ex2);
        self.max_x = self.max_x.max(ex1).max(ex2);
        self.min_y = self.min_y.min(ey1_orig).min(ey2);
        self.max_y = self.max_y.max(ey1_orig).max(ey2);

        let mut ey1 = ey1_orig;
        self.set_curr_cell(ex1, ey1);

        if ey1 == ey2 {
            self.render_hline(ey1, x1, fy1, x2, fy2);
            return;
        }

        let mut incr = 1_i32;
        if dx == 0 {
            // Vertical line: only cover and area change, no hline rendering
            let ex = x1 >> POLY_SUBPIXEL_SHIFT;
            let two_fx = (x1 - (ex << POLY_SUBPIXEL_SHIFT)) << 1;
            let mut first = POLY_SUBPIXEL_SCALE as i32;
            if dy < 0 {
                first = 0;
                incr = -1;
            }
            let mut delta = first - fy1;
            self.curr_cell.cover += delta;
            self.curr_cell.area += two_fx * delta;
            ey1 += incr;
            self.set_curr_cell(ex, ey1);

            delta = first + first - POLY_SUBPIXEL_SCALE as i32;
            let area = two_fx * delta;
            while ey1 != ey2 {
                self.curr_cell.cover = delta;
                self.curr_cell.area = area;
                ey1 += incr;
                self.set_curr_cell(ex, ey1);
            }
            delta = fy2 - POLY_SUBPIXEL_SCALE as i32 + first;
            self.curr_cell.cover += delta;
            self.curr_cell.area += two_fx * delta;
            return;
        }

        let mut p = (POLY_SUBPIXEL_SCALE as i64 - fy1 as i64) * dx;
        let mut first = POLY_SUBPIXEL_SCALE as i32;
        let mut dy_abs = dy;
        if dy < 0 {
            p = fy1 as i64 * dx;
            first = 0;
            incr = -1;
            dy_abs = -dy;
        }

        let mut delta = (p / dy_abs) as i32;
        let mut modulo = p % dy_abs;
        if modulo < 0 {
            delta -= 1;
            modulo += dy_abs;
        }

        let mut x_from = x1 + delta;
        self.render_hline(ey1, x1, fy1, x_from, first);
        ey1 += incr;
        self.set_curr_cell(x_from >> POLY_SUBPIXEL_SHIFT, ey1);

        if ey1 != ey2 {
            p = POLY_SUBPIXEL_SCALE as i64 * dx;
            let mut lift = (p / dy_abs) as i32;
            let mut rem = p % dy_abs;
            if rem < 0 {
                lift -= 1;
                rem += dy_abs;
            }
            modulo -= dy_abs;

            while ey1 != ey2 {
                delta = lift;
                modulo += rem;
                if modulo >= 0 {
                    modulo -= dy_abs;
                    delta += 1;
                }
                let x_to = x_from + delta;
                self.render_hline(ey1, x_from, POLY_SUBPIXEL_SCALE as i32 - first, x_to, first);
                x_from = x_to;
                ey1 += incr;
                self.set_curr_cell(x_from >> POLY_SUBPIXEL_SHIFT, ey1);
            }
        }
        self.render_hline(ey1, x_from, POLY_SUBPIXEL_SCALE as i32 - first, x2, fy2);
    }
}

// ============================================================================
// Per-scanline style bookkeeping
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct StyleInfo {
    start_cell: u32,
    num_cells: u32,
    last_x: i32,
}

impl Default for StyleInfo {
    fn default() -> Self {
        Self {
            start_cell: 0,
            num_cells: 0,
            last_x: i32::MIN,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct CellInfo {
    x: i32,
    area: i32,
    cover: i32,
}

/// Slot of a style in the style table; slot 0 is "no style".
#[inline]
fn style_slot(style: i16, min_style: i32) -> usize {
    if style < 0 {
        0
    } else {
        (style as i32 - min_style + 1) as usize
    }
}

/// Register one occurrence of `slot` in the active style table.
fn add_style(styles: &mut [StyleInfo], ast: &mut Vec<u32>, asm: &mut [u8], slot: usize) {
    let nbyte = slot >> 3;
    let mask = 1u8 << (slot & 7);
    if asm[nbyte] & mask == 0 {
        ast.push(slot as u32);
        asm[nbyte] |= mask;
        styles[slot] = StyleInfo::default();
    }
    styles[slot].start_cell += 1;
}

/// Append or merge a cell into the run of `slot`, adding `sign` times its
/// area and cover.
fn accumulate(styles: &mut [StyleInfo], cells: &mut [CellInfo], slot: usize, c: &CellStyleAa, sign: i32) {
    let style = &mut styles[slot];
    if c.x == style.last_x {
        let ci = (style.start_cell + style.num_cells - 1) as usize;
        cells[ci].area += sign * c.area;
        cells[ci].cover += sign * c.cover;
    } else {
        let ci = (style.start_cell + style.num_cells) as usize;
        cells[ci] = CellInfo {
            x: c.x,
            area: sign * c.area,
            cover: sign * c.cover,
        };
        style.last_x = c.x;
        style.num_cells += 1;
    }
}

// ============================================================================
// RasterizerCompoundAa
// ============================================================================

const AA_SHIFT: u32 = 8;
const AA_SCALE: u32 = 1 << AA_SHIFT;
const AA_MASK: u32 = AA_SCALE - 1;
const AA_SCALE2: u32 = AA_SCALE * 2;
const AA_MASK2: u32 = AA_SCALE2 - 1;

/// Compound anti-aliased rasterizer.
///
/// Usage:
/// 1. `reset()`, optionally `clip_box()` and `filling_rule()`
/// 2. for each path: `styles(left, right)` then `move_to_d` / `line_to_d`
/// 3. `rewind_scanlines()`
/// 4. while `sweep_styles()` returns `n > 0`: for each `i < n`, look up
///    `style(i)` and call `sweep_scanline(sl, i)` to get its coverage
pub struct RasterizerCompoundAa {
    outline: CellsEngine,
    clipper: RasterizerSlClip,
    filling_rule: FillingRule,
    layer_order: LayerOrder,
    anti_aliased: bool,
    styles: Vec<StyleInfo>,
    // Active style table and its membership bitmask
    ast: Vec<u32>,
    asm: Vec<u8>,
    cells: Vec<CellInfo>,
    min_style: i32,
    max_style: i32,
    start_x: i32,
    start_y: i32,
    scan_y: i32,
}

impl RasterizerCompoundAa {
    pub fn new() -> Self {
        Self {
            outline: CellsEngine::new(),
            clipper: RasterizerSlClip::new(),
            filling_rule: FillingRule::NonZero,
            layer_order: LayerOrder::Direct,
            anti_aliased: true,
            styles: Vec::new(),
            ast: Vec::new(),
            asm: Vec::new(),
            cells: Vec::new(),
            min_style: i32::MAX,
            max_style: i32::MIN,
            start_x: 0,
            start_y: 0,
            scan_y: i32::MAX,
        }
    }

    pub fn reset(&mut self) {
        self.outline.reset();
        self.min_style = i32::MAX;
        self.max_style = i32::MIN;
        self.scan_y = i32::MAX;
    }

    pub fn reset_clipping(&mut self) {
        self.reset();
        self.clipper.reset_clipping();
    }

    /// Clip to a box in pixel coordinates.
    pub fn clip_box(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.reset();
        self.clipper
            .clip_box(upscale(x1), upscale(y1), upscale(x2), upscale(y2));
    }

    pub fn filling_rule(&mut self, rule: FillingRule) {
        self.filling_rule = rule;
    }

    pub fn layer_order(&mut self, order: LayerOrder) {
        self.layer_order = order;
    }

    /// With anti-aliasing off, coverage is thresholded at one half.
    pub fn set_anti_aliased(&mut self, aa: bool) {
        self.anti_aliased = aa;
    }

    /// Maximum number of cells before the outline is reported as overflowing.
    pub fn set_cell_limit(&mut self, limit: usize) {
        self.outline.cell_limit = limit;
    }

    /// Set the left and right styles for subsequent edges; `-1` is none.
    pub fn styles(&mut self, left: i32, right: i32) {
        let left = left.clamp(-1, MAX_STYLE);
        let right = right.clamp(-1, MAX_STYLE);
        let cell = CellStyleAa {
            left: left as i16,
            right: right as i16,
            ..CellStyleAa::default()
        };
        self.outline.style(&cell);
        for s in [left, right] {
            if s >= 0 {
                self.min_style = self.min_style.min(s);
                self.max_style = self.max_style.max(s);
            }
        }
    }

    /// Move to a position in 24.8 fixed point.
    pub fn move_to(&mut self, x: i32, y: i32) {
        if self.outline.sorted {
            self.reset();
        }
        self.start_x = x;
        self.start_y = y;
        self.clipper.move_to(x, y);
    }

    /// Line to a position in 24.8 fixed point.
    pub fn line_to(&mut self, x: i32, y: i32) {
        self.clipper.line_to(&mut self.outline, x, y);
    }

    pub fn move_to_d(&mut self, x: f64, y: f64) {
        self.move_to(upscale(x), upscale(y));
    }

    pub fn line_to_d(&mut self, x: f64, y: f64) {
        self.line_to(upscale(x), upscale(y));
    }

    /// Line back to the last `move_to` position.
    pub fn close_polygon(&mut self) {
        if self.clipper.position() != (self.start_x, self.start_y) {
            let (sx, sy) = (self.start_x, self.start_y);
            self.line_to(sx, sy);
        }
    }

    /// Add a pixel-space polyline with the current styles.
    pub fn add_polyline(&mut self, points: &[PointD], close: bool) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.move_to_d(first.x, first.y);
        for p in rest {
            self.line_to_d(p.x, p.y);
        }
        if close {
            self.close_polygon();
        }
    }

    pub fn min_x(&self) -> i32 {
        self.outline.min_x
    }
    pub fn min_y(&self) -> i32 {
        self.outline.min_y
    }
    pub fn max_x(&self) -> i32 {
        self.outline.max_x
    }
    pub fn max_y(&self) -> i32 {
        self.outline.max_y
    }
    pub fn min_style(&self) -> i32 {
        self.min_style
    }
    pub fn max_style(&self) -> i32 {
        self.max_style
    }

    /// Whether cells were dropped because the budget or memory ran out.
    pub fn overflowed(&self) -> bool {
        self.outline.overflow
    }

    /// Sort cells and prepare for scanline iteration.
    ///
    /// Returns `Ok(false)` when there is nothing to draw, and an allocation
    /// error when the outline could not be stored completely.
    pub fn rewind_scanlines(&mut self) -> Result<bool> {
        self.outline.sort_cells();
        if self.outline.overflow {
            return Err(RenderError::Allocation {
                bytes: self
                    .outline
                    .cells
                    .len()
                    .saturating_mul(core::mem::size_of::<CellStyleAa>()),
            });
        }
        if self.outline.cells.is_empty() || self.max_style < self.min_style {
            return Ok(false);
        }
        self.scan_y = self.outline.min_y;
        let num_styles = (self.max_style - self.min_style + 2) as usize;
        self.styles.resize(num_styles, StyleInfo::default());
        Ok(true)
    }

    /// Coverage in 0..=255 for an accumulated area, per the fill rule.
    #[inline]
    pub fn calculate_alpha(&self, area: i32) -> u32 {
        let mut cover = area >> (POLY_SUBPIXEL_SHIFT * 2 + 1 - AA_SHIFT);
        if cover < 0 {
            cover = -cover;
        }
        if self.filling_rule == FillingRule::EvenOdd {
            cover &= AA_MASK2 as i32;
            if cover > AA_SCALE as i32 {
                cover = AA_SCALE2 as i32 - cover;
            }
        }
        if cover > AA_MASK as i32 {
            cover = AA_MASK as i32;
        }
        if !self.anti_aliased {
            cover = if cover > (AA_MASK >> 1) as i32 { AA_MASK as i32 } else { 0 };
        }
        cover as u32
    }

    /// Advance to the next scanline with at least one style and return the
    /// number of active styles on it; 0 once all scanlines are done.
    pub fn sweep_styles(&mut self) -> u32 {
        loop {
            if self.scan_y > self.outline.max_y {
                return 0;
            }
            let cell_indices = self.outline.scanline_cells(self.scan_y);
            let num_cells = cell_indices.len();
            let num_styles = (self.max_style - self.min_style + 2) as usize;

            self.cells.resize(num_cells * 2, CellInfo::default());
            self.ast.clear();
            self.asm.clear();
            self.asm.resize((num_styles + 7) >> 3, 0);

            if num_cells > 0 {
                // Slot 0 is always present: it absorbs the "no style" sides
                self.asm[0] |= 1;
                self.ast.push(0);
                self.styles[0] = StyleInfo::default();

                // Pass 1: count cells per style
                for &idx in cell_indices {
                    let c = &self.outline.cells[idx as usize];
                    for side in [c.left, c.right] {
                        let slot = style_slot(side, self.min_style);
                        add_style(&mut self.styles, &mut self.ast, &mut self.asm, slot);
                    }
                }

                // Histogram to start offsets
                let mut start_cell = 0u32;
                for &slot in &self.ast {
                    let st = &mut self.styles[slot as usize];
                    let count = st.start_cell;
                    st.start_cell = start_cell;
                    start_cell += count;
                }

                // Pass 2: distribute cells, left side added, right subtracted
                for &idx in cell_indices {
                    let c = &self.outline.cells[idx as usize];
                    let left = style_slot(c.left, self.min_style);
                    accumulate(&mut self.styles, &mut self.cells, left, c, 1);
                    let right = style_slot(c.right, self.min_style);
                    accumulate(&mut self.styles, &mut self.cells, right, c, -1);
                }
            }

            if self.ast.len() > 1 {
                break;
            }
            self.scan_y += 1;
        }
        self.scan_y += 1;

        match self.layer_order {
            LayerOrder::Direct => self.ast[1..].sort_unstable_by(|a, b| b.cmp(a)),
            LayerOrder::Inverse => self.ast[1..].sort_unstable(),
            LayerOrder::Unsorted => {}
        }

        (self.ast.len() - 1) as u32
    }

    /// Style id of the active style at `style_idx` (0-based).
    #[inline]
    pub fn style(&self, style_idx: u32) -> u32 {
        (self.ast[style_idx as usize + 1] as i32 + self.min_style - 1) as u32
    }

    /// Emit the coverage of one active style on the current scanline.
    ///
    /// `style_idx` is -1 for the "no style" slot, or 0..n-1.
    pub fn sweep_scanline<SL: Scanline>(&self, sl: &mut SL, style_idx: i32) -> bool {
        let scan_y = self.scan_y - 1;
        if scan_y > self.outline.max_y {
            return false;
        }

        sl.reset_spans();

        let si = if style_idx < 0 { 0 } else { (style_idx + 1) as usize };
        let st = &self.styles[self.ast[si] as usize];
        let mut num_cells = st.num_cells;
        let mut cell_idx = st.start_cell as usize;

        let mut cover = 0i32;
        while num_cells > 0 {
            num_cells -= 1;
            let cell = self.cells[cell_idx];
            let x = cell.x;
            cover += cell.cover;
            cell_idx += 1;

            if cell.area != 0 {
                let alpha = self.calculate_alpha((cover << (POLY_SUBPIXEL_SHIFT + 1)) - cell.area);
                if alpha > 0 {
                    sl.add_cell(x, alpha);
                }
                if num_cells > 0 && self.cells[cell_idx].x > x + 1 {
                    let alpha = self.calculate_alpha(cover << (POLY_SUBPIXEL_SHIFT + 1));
                    if alpha > 0 {
                        sl.add_span(x + 1, (self.cells[cell_idx].x - x - 1) as u32, alpha);
                    }
                }
            } else if num_cells > 0 && self.cells[cell_idx].x > x {
                let alpha = self.calculate_alpha(cover << (POLY_SUBPIXEL_SHIFT + 1));
                if alpha > 0 {
                    sl.add_span(x, (self.cells[cell_idx].x - x) as u32, alpha);
                }
            }
        }

        if sl.num_spans() == 0 {
            return false;
        }
        sl.finalize(scan_y);
        true
    }
}

impl Default for RasterizerCompoundAa {
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
    use crate::scanline_u::ScanlineU8;

    const S: i32 = POLY_SUBPIXEL_SCALE as i32;

    /// Rasterize and collect (y, style, x, len, first cover) per span.
    fn collect(ras: &mut RasterizerCompoundAa) -> Vec<(i32, u32, i32, i32, u8)> {
        let mut out = Vec::new();
        if !ras.rewind_scanlines().unwrap() {
            return out;
        }
        let mut sl = ScanlineU8::new();
        sl.reset(ras.min_x(), ras.max_x());
        loop {
            let n = ras.sweep_styles();
            if n == 0 {
                break;
            }
            for i in 0..n {
                let style = ras.style(i);
                if ras.sweep_scanline(&mut sl, i as i32) {
                    for span in sl.spans() {
                        out.push((sl.y(), style, span.x, span.len, sl.span_covers(span)[0]));
                    }
                }
            }
        }
        out
    }

    /// Clockwise square on screen with `right` inside and `left` outside.
    fn square(ras: &mut RasterizerCompoundAa, x: i32, y: i32, size: i32, left: i32, right: i32) {
        ras.styles(left, right);
        ras.move_to(x * S, y * S);
        ras.line_to((x + size) * S, y * S);
        ras.line_to((x + size) * S, (y + size) * S);
        ras.line_to(x * S, (y + size) * S);
        ras.close_polygon();
    }

    #[test]
    fn test_cell_style_aa_not_equal() {
        let c1 = CellStyleAa {
            x: 10,
            y: 20,
            left: 1,
            right: 2,
            ..Default::default()
        };
        let mut style = CellStyleAa {
            left: 1,
            right: 2,
            ..Default::default()
        };
        assert!(!c1.not_equal(10, 20, &style));
        assert!(c1.not_equal(11, 20, &style));
        style.left = 3;
        assert!(c1.not_equal(10, 20, &style));
    }

    #[test]
    fn test_empty_rasterizer() {
        let mut ras = RasterizerCompoundAa::new();
        assert!(!ras.rewind_scanlines().unwrap());
    }

    #[test]
    fn test_right_style_fills_clockwise_square() {
        let mut ras = RasterizerCompoundAa::new();
        square(&mut ras, 10, 10, 10, -1, 0);
        let spans = collect(&mut ras);
        assert_eq!(spans.len(), 10);
        for (i, &(y, style, x, len, cover)) in spans.iter().enumerate() {
            assert_eq!(y, 10 + i as i32);
            assert_eq!(style, 0);
            assert_eq!(x, 10);
            assert_eq!(len, 10);
            assert_eq!(cover, 255);
        }
    }

    #[test]
    fn test_fill_is_direction_agnostic() {
        // A lone contour fills its interior whichever side carries the style.
        let mut ras = RasterizerCompoundAa::new();
        square(&mut ras, 10, 10, 10, 0, -1);
        let spans = collect(&mut ras);
        assert_eq!(spans.len(), 10);
        assert!(spans
            .iter()
            .all(|&(_, style, x, len, cover)| style == 0 && x == 10 && len == 10 && cover == 255));
    }

    #[test]
    fn test_two_adjacent_styles() {
        let mut ras = RasterizerCompoundAa::new();
        ras.filling_rule(FillingRule::EvenOdd);
        // Left half: styles 0 inside; right half: style 1 inside, sharing x=15
        ras.styles(-1, 0);
        ras.move_to(10 * S, 10 * S);
        ras.line_to(15 * S, 10 * S);
        ras.styles(1, 0);
        ras.line_to(15 * S, 20 * S);
        ras.styles(-1, 0);
        ras.line_to(10 * S, 20 * S);
        ras.line_to(10 * S, 10 * S);

        ras.styles(-1, 1);
        ras.move_to(15 * S, 10 * S);
        ras.line_to(20 * S, 10 * S);
        ras.line_to(20 * S, 20 * S);
        ras.line_to(15 * S, 20 * S);

        let spans = collect(&mut ras);
        assert_eq!(ras.min_style(), 0);
        assert_eq!(ras.max_style(), 1);
        for &(_, style, x, len, cover) in &spans {
            assert_eq!(cover, 255);
            match style {
                0 => assert_eq!((x, len), (10, 5)),
                1 => assert_eq!((x, len), (15, 5)),
                _ => panic!("unexpected style {style}"),
            }
        }
        assert_eq!(spans.len(), 20);
    }

    #[test]
    fn test_even_odd_hole_and_non_zero_fill() {
        let build = |rule| {
            let mut ras = RasterizerCompoundAa::new();
            ras.filling_rule(rule);
            square(&mut ras, 0, 0, 30, -1, 0);
            square(&mut ras, 10, 10, 10, -1, 0);
            collect(&mut ras)
        };
        // Even-odd: row 15 has two spans around the hole
        let eo = build(FillingRule::EvenOdd);
        let row: Vec<_> = eo.iter().filter(|s| s.0 == 15).collect();
        assert_eq!(row.len(), 2);
        // Non-zero: the same-direction inner square stays filled
        let nz = build(FillingRule::NonZero);
        let row: Vec<_> = nz.iter().filter(|s| s.0 == 15).collect();
        assert_eq!(row.len(), 1);
        assert_eq!((row[0].2, row[0].3), (0, 30));
    }

    #[test]
    fn test_calculate_alpha() {
        let mut ras = RasterizerCompoundAa::new();
        let full_area = (POLY_SUBPIXEL_SCALE * POLY_SUBPIXEL_SCALE * 2) as i32;
        assert_eq!(ras.calculate_alpha(full_area), AA_MASK);
        assert_eq!(ras.calculate_alpha(0), 0);

        ras.filling_rule(FillingRule::EvenOdd);
        assert_eq!(ras.calculate_alpha(full_area * 2), 0);

        ras.set_anti_aliased(false);
        assert_eq!(ras.calculate_alpha(full_area / 4), 0);
        assert_eq!(ras.calculate_alpha(full_area * 3 / 4), AA_MASK);
    }

    #[test]
    fn test_partial_coverage_on_edges() {
        let mut ras = RasterizerCompoundAa::new();
        ras.styles(-1, 0);
        ras.add_polyline(
            &[
                PointD::new(10.5, 10.0),
                PointD::new(20.0, 10.0),
                PointD::new(20.0, 11.0),
                PointD::new(10.5, 11.0),
            ],
            true,
        );
        let spans = collect(&mut ras);
        assert_eq!(spans.len(), 1);
        let (_, _, x, _, cover) = spans[0];
        assert_eq!(x, 10);
        assert!((cover as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_clip_box_keeps_fill_of_shape_past_left_edge() {
        let mut ras = RasterizerCompoundAa::new();
        ras.clip_box(0.0, 0.0, 50.0, 50.0);
        square(&mut ras, -20, 10, 40, -1, 0);
        let spans = collect(&mut ras);
        assert!(!spans.is_empty());
        for &(y, _, x, len, _) in &spans {
            assert!(y < 50);
            assert_eq!((x, len), (0, 20));
        }
    }

    #[test]
    fn test_cell_limit_reports_allocation_error() {
        let mut ras = RasterizerCompoundAa::new();
        ras.set_cell_limit(4);
        square(&mut ras, 0, 0, 20, -1, 0);
        assert!(ras.overflowed());
        assert!(matches!(
            ras.rewind_scanlines(),
            Err(RenderError::Allocation { .. })
        ));
        ras.reset();
        assert!(!ras.overflowed());
    }
}
