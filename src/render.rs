// ============================================================================
// RENDER ENGINE: canvas geometry, grid overlay, highlight box, rasteriser
// ============================================================================
//
// `plan()` turns the inspector state into pure geometry.  The egui canvas
// paints that geometry with its own painter; `rasterize()` paints it into an
// RgbaImage for headless output.  Both repaint everything on every call.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::inspector::{Inspector, Selection};
use crate::mapper::TileSize;

/// Grid lines are stroked half a pixel in so a 1px line covers exactly one
/// pixel column/row.
pub const LINE_OFFSET: f32 = 0.5;

/// White at 50% alpha.
pub const GRID_COLOR: Rgba<u8> = Rgba([255, 255, 255, 128]);
pub const HIGHLIGHT_BORDER: Rgba<u8> = Rgba([255, 255, 0, 255]);
/// Yellow at 20% alpha.
pub const HIGHLIGHT_FILL: Rgba<u8> = Rgba([255, 255, 0, 51]);
pub const HIGHLIGHT_BORDER_WIDTH: u32 = 2;

/// Checkerboard backdrop: 8px squares, 16px period.
pub const CHECKER_CELL: f32 = 8.0;
pub const CHECKER_DARK: [u8; 3] = [0x80, 0x80, 0x80];
pub const CHECKER_LIGHT: [u8; 3] = [0xa0, 0xa0, 0xa0];

/// Line positions in canvas space, before [`LINE_OFFSET`] is applied.
#[derive(Clone, Debug, PartialEq)]
pub struct GridLines {
    pub vertical: Vec<f32>,
    pub horizontal: Vec<f32>,
}

/// Highlight box in canvas space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighlightRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Everything needed to paint one frame of the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderPlan {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub zoom: f32,
    pub grid: Option<GridLines>,
    pub highlight: Option<HighlightRect>,
}

impl RenderPlan {
    /// Integer surface size; fractional sizes truncate like a canvas element.
    pub fn raster_size(&self) -> (u32, u32) {
        (self.canvas_width as u32, self.canvas_height as u32)
    }
}

/// `k * step` for k = 0, 1, ... while the position stays within `extent`.
fn line_positions(extent: f32, step: f32) -> Vec<f32> {
    let mut out = Vec::new();
    let mut k = 0u32;
    loop {
        let pos = k as f32 * step;
        if pos > extent {
            break;
        }
        out.push(pos);
        k += 1;
    }
    out
}

pub fn grid_lines(canvas_w: f32, canvas_h: f32, tile: TileSize, zoom: f32) -> GridLines {
    GridLines {
        vertical: line_positions(canvas_w, tile.width as f32 * zoom),
        horizontal: line_positions(canvas_h, tile.height as f32 * zoom),
    }
}

pub fn highlight_rect(selection: Option<Selection>, tile: TileSize, zoom: f32) -> Option<HighlightRect> {
    let s = selection?;
    let tw = tile.width as f32 * zoom;
    let th = tile.height as f32 * zoom;
    Some(HighlightRect {
        left: s.tile_x as f32 * tw,
        top: s.tile_y as f32 * th,
        width: tw,
        height: th,
    })
}

/// Geometry for the current state; `None` until an image has loaded.
pub fn plan(inspector: &Inspector) -> Option<RenderPlan> {
    inspector.image_size()?;
    let (canvas_width, canvas_height) = inspector.canvas_size();
    let zoom = inspector.zoom();
    let tile = inspector.tile_size();
    Some(RenderPlan {
        canvas_width,
        canvas_height,
        zoom,
        grid: inspector
            .show_grid()
            .then(|| grid_lines(canvas_width, canvas_height, tile, zoom)),
        highlight: highlight_rect(inspector.selection(), tile, zoom),
    })
}

// ---------------------------------------------------------------------------
//  Rasteriser
// ---------------------------------------------------------------------------

/// Straight-alpha "source over" for one pixel.
fn blend_over(dst: &mut [u8], src: Rgba<u8>) {
    let sa = src[3] as f32 / 255.0;
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let sc = src[c] as f32;
        let dc = dst[c] as f32;
        let v = (sc * sa + dc * da * (1.0 - sa)) / out_a;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Paint the scaled sheet (nearest-neighbour) plus the grid, if planned.
pub fn rasterize(sheet: &RgbaImage, plan: &RenderPlan) -> RgbaImage {
    let (cw, ch) = plan.raster_size();
    let mut out = RgbaImage::new(cw, ch);
    if cw == 0 || ch == 0 || sheet.width() == 0 || sheet.height() == 0 {
        return out;
    }

    let zoom = plan.zoom;
    let max_x = sheet.width() - 1;
    let max_y = sheet.height() - 1;
    let row_bytes = cw as usize * 4;
    let src_cols: Vec<u32> = (0..cw)
        .map(|dx| ((dx as f32 / zoom).floor() as u32).min(max_x))
        .collect();

    let buf: &mut [u8] = &mut out;
    buf.par_chunks_mut(row_bytes).enumerate().for_each(|(dy, row)| {
        let sy = ((dy as f32 / zoom).floor() as u32).min(max_y);
        for (dx, px) in row.chunks_exact_mut(4).enumerate() {
            px.copy_from_slice(&sheet.get_pixel(src_cols[dx], sy).0);
        }
    });

    if let Some(grid) = &plan.grid {
        draw_grid(&mut out, grid);
    }
    out
}

fn draw_grid(out: &mut RgbaImage, grid: &GridLines) {
    let (cw, ch) = out.dimensions();
    for &x in &grid.vertical {
        let col = x.floor() as u32;
        if col >= cw {
            continue;
        }
        for y in 0..ch {
            blend_over(&mut out.get_pixel_mut(col, y).0, GRID_COLOR);
        }
    }
    for &y in &grid.horizontal {
        let row = y.floor() as u32;
        if row >= ch {
            continue;
        }
        for x in 0..cw {
            blend_over(&mut out.get_pixel_mut(x, row).0, GRID_COLOR);
        }
    }
}

/// Composite the highlight box: translucent fill, then a border drawn
/// inside the rectangle.
pub fn overlay_highlight(out: &mut RgbaImage, rect: &HighlightRect) {
    let (cw, ch) = out.dimensions();
    let x0 = rect.left.round().max(0.0) as u32;
    let y0 = rect.top.round().max(0.0) as u32;
    let x1 = ((rect.left + rect.width).round().max(0.0) as u32).min(cw);
    let y1 = ((rect.top + rect.height).round().max(0.0) as u32).min(ch);
    if x0 >= x1 || y0 >= y1 {
        return;
    }
    let bw = HIGHLIGHT_BORDER_WIDTH;
    for y in y0..y1 {
        for x in x0..x1 {
            let on_border = x < x0 + bw || y < y0 + bw || x + bw >= x1 || y + bw >= y1;
            let color = if on_border { HIGHLIGHT_BORDER } else { HIGHLIGHT_FILL };
            blend_over(&mut out.get_pixel_mut(x, y).0, color);
        }
    }
}

/// Full headless frame: sheet, grid and highlight.
pub fn render_surface(sheet: &RgbaImage, inspector: &Inspector) -> Option<RgbaImage> {
    let plan = plan(inspector)?;
    let mut out = rasterize(sheet, &plan);
    if let Some(rect) = &plan.highlight {
        overlay_highlight(&mut out, rect);
    }
    Some(out)
}

/// Which checkerboard shade covers canvas point `(x, y)`.
pub fn checker_is_dark(x: f32, y: f32) -> bool {
    let cx = (x / CHECKER_CELL).floor() as i64;
    let cy = (y / CHECKER_CELL).floor() as i64;
    (cx + cy).rem_euclid(2) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspector::InspectorEvent;

    fn sel(tx: u32, ty: u32) -> Option<Selection> {
        Some(Selection { tile_x: tx, tile_y: ty, pixel_x: 0, pixel_y: 0 })
    }

    #[test]
    fn grid_lines_include_far_edge_when_exact() {
        let grid = grid_lines(64.0, 32.0, TileSize::new(16, 16), 1.0);
        assert_eq!(grid.vertical, vec![0.0, 16.0, 32.0, 48.0, 64.0]);
        assert_eq!(grid.horizontal, vec![0.0, 16.0, 32.0]);
    }

    #[test]
    fn grid_lines_stop_before_partial_edge() {
        let grid = grid_lines(140.0, 140.0, TileSize::new(16, 16), 2.0);
        assert_eq!(grid.vertical, vec![0.0, 32.0, 64.0, 96.0, 128.0]);
    }

    #[test]
    fn highlight_scales_with_zoom() {
        let rect = highlight_rect(sel(2, 3), TileSize::new(16, 8), 2.0).unwrap();
        assert_eq!(rect, HighlightRect { left: 64.0, top: 48.0, width: 32.0, height: 16.0 });
        assert_eq!(highlight_rect(None, TileSize::default(), 1.0), None);
    }

    #[test]
    fn plan_absent_until_loaded() {
        let mut insp = Inspector::default();
        assert!(plan(&insp).is_none());
        insp.apply(InspectorEvent::ImageLoaded { width: 70, height: 70 });
        insp.apply(InspectorEvent::ZoomOut);
        insp.apply(InspectorEvent::ZoomOut);
        let p = plan(&insp).unwrap();
        assert_eq!((p.canvas_width, p.canvas_height), (17.5, 17.5));
        assert_eq!(p.raster_size(), (17, 17));
        assert!(p.grid.is_none());
    }

    #[test]
    fn nearest_neighbour_upscale() {
        let mut sheet = RgbaImage::new(2, 1);
        sheet.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        sheet.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
        let p = RenderPlan { canvas_width: 8.0, canvas_height: 4.0, zoom: 4.0, grid: None, highlight: None };
        let out = rasterize(&sheet, &p);
        assert_eq!(out.dimensions(), (8, 4));
        assert_eq!(out.get_pixel(3, 3), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(4, 0), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn nearest_neighbour_downscale_samples() {
        let mut sheet = RgbaImage::new(8, 8);
        for (x, y, px) in sheet.enumerate_pixels_mut() {
            *px = Rgba([(x * 10) as u8, (y * 10) as u8, 0, 255]);
        }
        let p = RenderPlan { canvas_width: 2.0, canvas_height: 2.0, zoom: 0.25, grid: None, highlight: None };
        let out = rasterize(&sheet, &p);
        assert_eq!(out.get_pixel(1, 1), &Rgba([40, 40, 0, 255]));
    }

    #[test]
    fn grid_blends_half_white_over_black() {
        let sheet = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let p = RenderPlan {
            canvas_width: 4.0,
            canvas_height: 4.0,
            zoom: 1.0,
            grid: Some(grid_lines(4.0, 4.0, TileSize::new(2, 2), 1.0)),
            highlight: None,
        };
        let out = rasterize(&sheet, &p);
        assert_eq!(out.get_pixel(0, 1), &Rgba([128, 128, 128, 255]));
        assert_eq!(out.get_pixel(2, 3), &Rgba([128, 128, 128, 255]));
        assert_eq!(out.get_pixel(1, 1), &Rgba([0, 0, 0, 255]));
        // Crossing points receive both strokes.
        assert_eq!(out.get_pixel(0, 0), &Rgba([192, 192, 192, 255]));
    }

    #[test]
    fn highlight_border_and_fill() {
        let mut out = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]));
        overlay_highlight(&mut out, &HighlightRect { left: 4.0, top: 4.0, width: 8.0, height: 8.0 });
        assert_eq!(out.get_pixel(4, 4), &Rgba([255, 255, 0, 255]));
        assert_eq!(out.get_pixel(11, 6), &Rgba([255, 255, 0, 255]));
        assert_eq!(out.get_pixel(7, 7), &Rgba([51, 51, 0, 255]));
        assert_eq!(out.get_pixel(3, 3), &Rgba([0, 0, 0, 255]));
        assert_eq!(out.get_pixel(12, 12), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn highlight_outside_surface_is_clipped() {
        let mut out = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let before = out.clone();
        overlay_highlight(&mut out, &HighlightRect { left: 8.0, top: 0.0, width: 4.0, height: 4.0 });
        assert_eq!(out, before);
    }

    #[test]
    fn checkerboard_alternates_every_cell() {
        assert!(checker_is_dark(0.0, 0.0));
        assert!(!checker_is_dark(8.0, 0.0));
        assert!(!checker_is_dark(0.0, 9.0));
        assert!(checker_is_dark(15.9, 8.0));
    }
}
