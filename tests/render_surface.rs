use image::{Rgba, RgbaImage};
use spritehelper::inspector::{Inspector, InspectorEvent};
use spritehelper::mapper::TileSize;
use spritehelper::render;

fn sheet(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 7) as u8, (y * 5) as u8, 90, 255]))
}

fn loaded(w: u32, h: u32) -> Inspector {
    let mut insp = Inspector::default();
    insp.apply(InspectorEvent::ImageLoaded { width: w, height: h });
    insp
}

#[test]
fn grid_toggle_twice_restores_surface() {
    let pixels = sheet(32, 32);
    let mut insp = loaded(32, 32);
    insp.apply(InspectorEvent::SetTileSize(TileSize::new(8, 8)));
    insp.apply(InspectorEvent::ZoomIn);
    let plain = render::render_surface(&pixels, &insp).unwrap();

    insp.apply(InspectorEvent::ShowGrid(true));
    let gridded = render::render_surface(&pixels, &insp).unwrap();
    assert_ne!(plain, gridded);

    insp.apply(InspectorEvent::ShowGrid(false));
    assert_eq!(render::render_surface(&pixels, &insp).unwrap(), plain);

    // Repainting with the grid on again gives the same grid, not a denser one.
    insp.apply(InspectorEvent::ShowGrid(true));
    assert_eq!(render::render_surface(&pixels, &insp).unwrap(), gridded);
}

#[test]
fn surface_matches_zoomed_dimensions() {
    let pixels = sheet(20, 12);
    let mut insp = loaded(20, 12);
    for (event, size) in [
        (InspectorEvent::ZoomIn, (40, 24)),
        (InspectorEvent::ZoomIn, (80, 48)),
        (InspectorEvent::SetZoom(0.5), (10, 6)),
    ] {
        insp.apply(event);
        assert_eq!(render::render_surface(&pixels, &insp).unwrap().dimensions(), size);
    }
}

#[test]
fn highlight_follows_selection_and_zoom() {
    let mut insp = loaded(64, 64);
    let plan = render::plan(&insp).unwrap();
    assert!(plan.highlight.is_none());

    insp.apply(InspectorEvent::Click { x: 40.0, y: 50.0 });
    insp.apply(InspectorEvent::ZoomIn);
    let plan = render::plan(&insp).unwrap();
    let h = plan.highlight.unwrap();
    assert_eq!((h.left, h.top, h.width, h.height), (64.0, 96.0, 32.0, 32.0));
}

#[test]
fn grid_plan_matches_tile_spacing() {
    let mut insp = loaded(48, 40);
    insp.apply(InspectorEvent::SetTileSize(TileSize::new(16, 16)));
    insp.apply(InspectorEvent::ShowGrid(true));
    let grid = render::plan(&insp).unwrap().grid.unwrap();
    assert_eq!(grid.vertical, vec![0.0, 16.0, 32.0, 48.0]);
    assert_eq!(grid.horizontal, vec![0.0, 16.0, 32.0]);
}

#[test]
fn highlight_pixels_land_on_selected_tile() {
    let pixels = RgbaImage::from_pixel(32, 32, Rgba([0, 0, 0, 255]));
    let mut insp = loaded(32, 32);
    insp.apply(InspectorEvent::Click { x: 20.0, y: 3.0 });
    let out = render::render_surface(&pixels, &insp).unwrap();
    // Tile (1, 0) spans x 16..32, y 0..16; its border starts at the corner.
    assert_eq!(out.get_pixel(16, 0), &render::HIGHLIGHT_BORDER);
    assert_eq!(out.get_pixel(15, 0), &Rgba([0, 0, 0, 255]));
    assert_eq!(out.get_pixel(20, 20), &Rgba([0, 0, 0, 255]));
}
