// ============================================================================
// COORDINATE MAPPER: display space → pixel space → tile space
// ============================================================================

/// Fallback tile edge used whenever the typed size is unusable.
pub const DEFAULT_TILE: u32 = 16;
/// Largest accepted tile edge.
pub const MAX_TILE: u32 = 512;

pub const MIN_ZOOM: f32 = 0.25;
pub const MAX_ZOOM: f32 = 8.0;

/// Width/height of one grid cell, in source pixels.  Always within `1..=MAX_TILE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSize {
    pub width: u32,
    pub height: u32,
}

impl Default for TileSize {
    fn default() -> Self {
        Self { width: DEFAULT_TILE, height: DEFAULT_TILE }
    }
}

impl TileSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: normalize_tile(i64::from(width)),
            height: normalize_tile(i64::from(height)),
        }
    }

    /// Interpret one typed tile edge.
    ///
    /// Leading whitespace, an optional sign and the leading digits are read;
    /// anything after the digits is ignored ("24px" → 24).  Empty, non-numeric,
    /// zero or negative input yields [`DEFAULT_TILE`].
    pub fn parse_edge(text: &str) -> u32 {
        let s = text.trim_start();
        let (negative, digits) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let end = digits
            .bytes()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(digits.len());
        if end == 0 {
            return DEFAULT_TILE;
        }
        // Overlong digit runs saturate and then clamp to MAX_TILE.
        let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
        normalize_tile(if negative { -value } else { value })
    }
}

fn normalize_tile(v: i64) -> u32 {
    if v <= 0 {
        DEFAULT_TILE
    } else {
        v.min(i64::from(MAX_TILE)) as u32
    }
}

/// Clamp a requested zoom into `[MIN_ZOOM, MAX_ZOOM]`.
/// Returns `None` for NaN / infinite requests.
pub fn clamp_zoom(requested: f32) -> Option<f32> {
    if requested.is_finite() {
        Some(requested.clamp(MIN_ZOOM, MAX_ZOOM))
    } else {
        None
    }
}

/// "100%", "25%", "800%".
pub fn format_zoom(zoom: f32) -> String {
    format!("{}%", (zoom * 100.0).round() as i64)
}

/// A point resolved into both source-pixel and tile space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pick {
    pub pixel_x: u32,
    pub pixel_y: u32,
    pub tile_x: u32,
    pub tile_y: u32,
}

/// Number of *whole* tiles along each axis: `(cols, rows)`.
pub fn grid_dims(image_w: u32, image_h: u32, tile: TileSize) -> (u32, u32) {
    (image_w / tile.width, image_h / tile.height)
}

/// `floor(display / zoom)` as a signed pixel index (negative left/above the image).
fn to_pixel(display: f32, zoom: f32) -> i64 {
    (display / zoom).floor() as i64
}

/// Hover resolution.  Only the image extent is checked, so a point inside a
/// partial trailing tile still resolves (its tile index equals the grid size).
/// Non-finite coordinates never resolve.
pub fn pick_hover(
    display_x: f32,
    display_y: f32,
    zoom: f32,
    image_w: u32,
    image_h: u32,
    tile: TileSize,
) -> Option<Pick> {
    if !display_x.is_finite() || !display_y.is_finite() {
        return None;
    }
    let px = to_pixel(display_x, zoom);
    let py = to_pixel(display_y, zoom);
    if px < 0 || py < 0 || px >= i64::from(image_w) || py >= i64::from(image_h) {
        return None;
    }
    let (pixel_x, pixel_y) = (px as u32, py as u32);
    Some(Pick {
        pixel_x,
        pixel_y,
        tile_x: pixel_x / tile.width,
        tile_y: pixel_y / tile.height,
    })
}

/// Click resolution.  Same math as [`pick_hover`], but a pick landing in a
/// partial trailing tile (index ≥ whole-tile count) is rejected.
pub fn pick_click(
    display_x: f32,
    display_y: f32,
    zoom: f32,
    image_w: u32,
    image_h: u32,
    tile: TileSize,
) -> Option<Pick> {
    let pick = pick_hover(display_x, display_y, zoom, image_w, image_h, tile)?;
    let (cols, rows) = grid_dims(image_w, image_h, tile);
    if pick.tile_x >= cols || pick.tile_y >= rows {
        return None;
    }
    Some(pick)
}

/// Tile coordinate text; row/column order swaps the axes.
pub fn format_tile(tile_x: u32, tile_y: u32, row_col: bool) -> String {
    if row_col {
        format!("{}, {}", tile_y, tile_x)
    } else {
        format!("{}, {}", tile_x, tile_y)
    }
}

/// Pixel coordinate text, always x first.
pub fn format_pixel(pixel_x: u32, pixel_y: u32) -> String {
    format!("{}, {}", pixel_x, pixel_y)
}

/// Tooltip shown while hovering the canvas.
pub fn hover_text(pick: &Pick, row_col: bool) -> String {
    format!(
        "Tile: {} | Pixel: {}",
        format_tile(pick.tile_x, pick.tile_y, row_col),
        format_pixel(pick.pixel_x, pick.pixel_y)
    )
}
