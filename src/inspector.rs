// ============================================================================
// INSPECTOR STATE: single owner of zoom, tile size, selection and readouts
// ============================================================================
//
// Every UI binding (egui window, headless CLI, tests) drives the same
// `Inspector` through `apply(event)`.  The returned `Update` says what the
// caller has to repaint; painting itself lives in `render` / `app`.

use crate::bridge::HostMessage;
use crate::mapper::{self, Pick, TileSize};

/// Placeholder shown in a readout that has nothing to display.
pub const EMPTY_READOUT: &str = "-";

/// The last accepted tile pick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub tile_x: u32,
    pub tile_y: u32,
    pub pixel_x: u32,
    pub pixel_y: u32,
}

impl From<Pick> for Selection {
    fn from(p: Pick) -> Self {
        Self {
            tile_x: p.tile_x,
            tile_y: p.tile_y,
            pixel_x: p.pixel_x,
            pixel_y: p.pixel_y,
        }
    }
}

/// Which coordinate to put on the clipboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyTarget {
    Tile,
    Pixel,
}

/// Everything the inspector reacts to.  Display coordinates are relative to
/// the canvas origin, in screen points.
#[derive(Clone, Debug, PartialEq)]
pub enum InspectorEvent {
    ImageLoaded { width: u32, height: u32 },
    ImageFailed(String),
    /// Raw text from the tile width / height inputs.
    TileWidthInput(String),
    TileHeightInput(String),
    SetTileSize(TileSize),
    ShowGrid(bool),
    RowColFormat(bool),
    ZoomIn,
    ZoomOut,
    SetZoom(f32),
    Click { x: f32, y: f32 },
    Hover { x: f32, y: f32 },
    Copy(CopyTarget),
}

/// What changed as a result of one event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Update {
    /// Canvas must be fully repainted (size, grid or highlight moved).
    pub redraw: bool,
    /// Image size / grid size readouts changed.
    pub info: bool,
    /// Tile / pixel readouts changed.
    pub readout: bool,
    /// Tooltip for a hover event inside the image.
    pub hover: Option<String>,
}

impl Update {
    fn redraw() -> Self {
        Self { redraw: true, ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Debug, PartialEq)]
enum ImageState {
    Pending,
    Ready { width: u32, height: u32 },
    Failed(String),
}

/// Initial parameters for a freshly opened document.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewDefaults {
    pub tile: TileSize,
    pub zoom: f32,
    pub show_grid: bool,
    pub row_col_format: bool,
}

impl Default for ViewDefaults {
    fn default() -> Self {
        Self {
            tile: TileSize::default(),
            zoom: 1.0,
            show_grid: false,
            row_col_format: false,
        }
    }
}

pub struct Inspector {
    image: ImageState,
    tile: TileSize,
    zoom: f32,
    show_grid: bool,
    row_col_format: bool,
    selection: Option<Selection>,
    /// Host messages waiting to be delivered by the caller.
    outbox: Vec<HostMessage>,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new(ViewDefaults::default())
    }
}

impl Inspector {
    pub fn new(defaults: ViewDefaults) -> Self {
        Self {
            image: ImageState::Pending,
            tile: defaults.tile,
            zoom: mapper::clamp_zoom(defaults.zoom).unwrap_or(1.0),
            show_grid: defaults.show_grid,
            row_col_format: defaults.row_col_format,
            selection: None,
            outbox: Vec::new(),
        }
    }

    // ---- queries ------------------------------------------------------------

    /// `(width, height)` of the loaded image, `None` until the load completes.
    pub fn image_size(&self) -> Option<(u32, u32)> {
        match self.image {
            ImageState::Ready { width, height } => Some((width, height)),
            _ => None,
        }
    }

    pub fn load_error(&self) -> Option<&str> {
        match &self.image {
            ImageState::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.image == ImageState::Pending
    }

    pub fn tile_size(&self) -> TileSize {
        self.tile
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    pub fn row_col_format(&self) -> bool {
        self.row_col_format
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Unrounded canvas size in screen points; `(0, 0)` before load.
    pub fn canvas_size(&self) -> (f32, f32) {
        match self.image_size() {
            Some((w, h)) => (w as f32 * self.zoom, h as f32 * self.zoom),
            None => (0.0, 0.0),
        }
    }

    /// Whole tiles along each axis.
    pub fn grid_dims(&self) -> Option<(u32, u32)> {
        self.image_size()
            .map(|(w, h)| mapper::grid_dims(w, h, self.tile))
    }

    pub fn tile_text(&self) -> String {
        match self.selection {
            Some(s) => mapper::format_tile(s.tile_x, s.tile_y, self.row_col_format),
            None => EMPTY_READOUT.to_string(),
        }
    }

    pub fn pixel_text(&self) -> String {
        match self.selection {
            Some(s) => mapper::format_pixel(s.pixel_x, s.pixel_y),
            None => EMPTY_READOUT.to_string(),
        }
    }

    /// "32 x 16 px"
    pub fn image_size_text(&self) -> String {
        match self.image_size() {
            Some((w, h)) => format!("{} x {} px", w, h),
            None => EMPTY_READOUT.to_string(),
        }
    }

    /// "4 x 2 tiles"
    pub fn grid_size_text(&self) -> String {
        match self.grid_dims() {
            Some((cols, rows)) => format!("{} x {} tiles", cols, rows),
            None => EMPTY_READOUT.to_string(),
        }
    }

    pub fn zoom_text(&self) -> String {
        mapper::format_zoom(self.zoom)
    }

    /// Take all pending host messages, oldest first.
    pub fn drain_outbox(&mut self) -> Vec<HostMessage> {
        std::mem::take(&mut self.outbox)
    }

    // ---- updates ------------------------------------------------------------

    pub fn apply(&mut self, event: InspectorEvent) -> Update {
        match event {
            InspectorEvent::ImageLoaded { width, height } => {
                self.image = ImageState::Ready { width, height };
                self.selection = None;
                Update { redraw: true, info: true, readout: true, hover: None }
            }
            InspectorEvent::ImageFailed(reason) => {
                log_warn!("Sprite sheet unavailable: {}", reason);
                self.image = ImageState::Failed(reason);
                Update { info: true, ..Default::default() }
            }
            InspectorEvent::TileWidthInput(text) => {
                let width = TileSize::parse_edge(&text);
                self.set_tile_size(TileSize { width, height: self.tile.height })
            }
            InspectorEvent::TileHeightInput(text) => {
                let height = TileSize::parse_edge(&text);
                self.set_tile_size(TileSize { width: self.tile.width, height })
            }
            InspectorEvent::SetTileSize(tile) => {
                self.set_tile_size(TileSize::new(tile.width, tile.height))
            }
            InspectorEvent::ShowGrid(on) => {
                self.show_grid = on;
                Update::redraw()
            }
            InspectorEvent::RowColFormat(on) => {
                self.row_col_format = on;
                Update { readout: self.selection.is_some(), ..Default::default() }
            }
            InspectorEvent::ZoomIn => self.set_zoom(self.zoom * 2.0),
            InspectorEvent::ZoomOut => self.set_zoom(self.zoom / 2.0),
            InspectorEvent::SetZoom(z) => self.set_zoom(z),
            InspectorEvent::Click { x, y } => self.click(x, y),
            InspectorEvent::Hover { x, y } => {
                let hover = self.hover(x, y).map(|pick| mapper::hover_text(&pick, self.row_col_format));
                Update { hover, ..Default::default() }
            }
            InspectorEvent::Copy(target) => {
                if let Some(text) = self.copy_text(target) {
                    self.outbox.push(HostMessage::Copy { text });
                }
                Update::default()
            }
        }
    }

    /// Resolve a hover point without touching the selection.
    pub fn hover(&self, x: f32, y: f32) -> Option<Pick> {
        let (w, h) = self.image_size()?;
        mapper::pick_hover(x, y, self.zoom, w, h, self.tile)
    }

    /// Text a copy request would send; `None` when nothing is selected.
    pub fn copy_text(&self, target: CopyTarget) -> Option<String> {
        let s = self.selection?;
        Some(match target {
            CopyTarget::Tile => mapper::format_tile(s.tile_x, s.tile_y, self.row_col_format),
            CopyTarget::Pixel => mapper::format_pixel(s.pixel_x, s.pixel_y),
        })
    }

    fn click(&mut self, x: f32, y: f32) -> Update {
        let Some((w, h)) = self.image_size() else {
            return Update::default();
        };
        match mapper::pick_click(x, y, self.zoom, w, h, self.tile) {
            Some(pick) => {
                self.selection = Some(pick.into());
                Update { redraw: true, readout: true, ..Default::default() }
            }
            None => Update::default(),
        }
    }

    /// A different tile size invalidates the selection: its indices were
    /// computed against the old grid.
    fn set_tile_size(&mut self, tile: TileSize) -> Update {
        if tile == self.tile {
            return Update::default();
        }
        self.tile = tile;
        let had_selection = self.selection.take().is_some();
        Update { redraw: true, info: true, readout: had_selection, hover: None }
    }

    fn set_zoom(&mut self, requested: f32) -> Update {
        match mapper::clamp_zoom(requested) {
            Some(z) if z != self.zoom => {
                self.zoom = z;
                Update::redraw()
            }
            _ => Update::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(w: u32, h: u32) -> Inspector {
        let mut insp = Inspector::default();
        insp.apply(InspectorEvent::ImageLoaded { width: w, height: h });
        insp
    }

    #[test]
    fn readouts_before_load_are_placeholders() {
        let insp = Inspector::default();
        assert!(insp.is_loading());
        assert_eq!(insp.image_size_text(), "-");
        assert_eq!(insp.grid_size_text(), "-");
        assert_eq!(insp.tile_text(), "-");
        assert_eq!(insp.canvas_size(), (0.0, 0.0));
    }

    #[test]
    fn clicks_before_load_do_nothing() {
        let mut insp = Inspector::default();
        assert!(insp.apply(InspectorEvent::Click { x: 1.0, y: 1.0 }).is_empty());
        assert_eq!(insp.selection(), None);
    }

    #[test]
    fn load_reports_info() {
        let mut insp = Inspector::default();
        let update = insp.apply(InspectorEvent::ImageLoaded { width: 32, height: 16 });
        assert!(update.redraw && update.info);
        assert_eq!(insp.image_size_text(), "32 x 16 px");
    }

    #[test]
    fn failed_load_keeps_surface_empty() {
        let mut insp = Inspector::default();
        insp.apply(InspectorEvent::ImageFailed("bad header".into()));
        assert_eq!(insp.load_error(), Some("bad header"));
        assert!(!insp.is_loading());
        assert_eq!(insp.image_size(), None);
        assert!(insp.apply(InspectorEvent::Click { x: 0.0, y: 0.0 }).is_empty());
    }

    #[test]
    fn zoom_steps_clamp_at_both_ends() {
        let mut insp = loaded(10, 10);
        for _ in 0..6 {
            insp.apply(InspectorEvent::ZoomIn);
        }
        assert_eq!(insp.zoom(), 8.0);
        assert!(insp.apply(InspectorEvent::ZoomIn).is_empty());
        for _ in 0..10 {
            insp.apply(InspectorEvent::ZoomOut);
        }
        assert_eq!(insp.zoom(), 0.25);
        assert_eq!(insp.zoom_text(), "25%");
    }

    #[test]
    fn non_finite_zoom_is_ignored() {
        let mut insp = loaded(10, 10);
        assert!(insp.apply(InspectorEvent::SetZoom(f32::NAN)).is_empty());
        assert_eq!(insp.zoom(), 1.0);
    }

    #[test]
    fn bad_defaults_are_normalized() {
        let insp = Inspector::new(ViewDefaults { zoom: 100.0, ..Default::default() });
        assert_eq!(insp.zoom(), 8.0);
    }

    #[test]
    fn tile_input_text_falls_back_to_default() {
        let mut insp = loaded(64, 64);
        insp.apply(InspectorEvent::TileWidthInput("8".into()));
        assert_eq!(insp.tile_size(), TileSize { width: 8, height: 16 });
        insp.apply(InspectorEvent::TileWidthInput("".into()));
        assert_eq!(insp.tile_size().width, 16);
        insp.apply(InspectorEvent::TileHeightInput("nope".into()));
        assert_eq!(insp.tile_size().height, 16);
    }

    #[test]
    fn tile_size_change_clears_selection() {
        let mut insp = loaded(64, 64);
        insp.apply(InspectorEvent::Click { x: 40.0, y: 50.0 });
        assert!(insp.selection().is_some());

        // Same value again: selection survives.
        assert!(insp.apply(InspectorEvent::TileWidthInput("16".into())).is_empty());
        assert!(insp.selection().is_some());

        let update = insp.apply(InspectorEvent::TileWidthInput("8".into()));
        assert!(update.readout && update.info && update.redraw);
        assert_eq!(insp.selection(), None);
        assert_eq!(insp.grid_size_text(), "8 x 4 tiles");
    }

    #[test]
    fn zoom_change_keeps_selection() {
        let mut insp = loaded(64, 64);
        insp.apply(InspectorEvent::Click { x: 40.0, y: 50.0 });
        let before = insp.selection();
        insp.apply(InspectorEvent::ZoomIn);
        assert_eq!(insp.selection(), before);
    }

    #[test]
    fn rejected_click_keeps_previous_selection() {
        let mut insp = loaded(70, 70);
        insp.apply(InspectorEvent::Click { x: 20.0, y: 20.0 });
        let before = insp.selection();
        assert!(insp.apply(InspectorEvent::Click { x: 66.0, y: 20.0 }).is_empty());
        assert!(insp.apply(InspectorEvent::Click { x: -3.0, y: 20.0 }).is_empty());
        assert_eq!(insp.selection(), before);
    }

    #[test]
    fn nan_click_selects_nothing() {
        let mut insp = loaded(64, 64);
        assert!(insp.apply(InspectorEvent::Click { x: f32::NAN, y: 5.0 }).is_empty());
        assert_eq!(insp.selection(), None);
    }

    #[test]
    fn hover_never_mutates_selection() {
        let mut insp = loaded(64, 64);
        let update = insp.apply(InspectorEvent::Hover { x: 33.0, y: 50.0 });
        assert_eq!(update.hover.as_deref(), Some("Tile: 2, 3 | Pixel: 33, 50"));
        assert!(!update.redraw);
        assert_eq!(insp.selection(), None);
        assert_eq!(insp.apply(InspectorEvent::Hover { x: 90.0, y: 1.0 }).hover, None);
    }

    #[test]
    fn copy_without_selection_is_silent() {
        let mut insp = loaded(64, 64);
        insp.apply(InspectorEvent::Copy(CopyTarget::Tile));
        insp.apply(InspectorEvent::Copy(CopyTarget::Pixel));
        assert!(insp.drain_outbox().is_empty());
    }

    #[test]
    fn copy_queues_formatted_text() {
        let mut insp = loaded(64, 64);
        insp.apply(InspectorEvent::RowColFormat(true));
        insp.apply(InspectorEvent::Click { x: 33.0, y: 50.0 });
        insp.apply(InspectorEvent::Copy(CopyTarget::Tile));
        insp.apply(InspectorEvent::Copy(CopyTarget::Pixel));
        assert_eq!(
            insp.drain_outbox(),
            vec![
                HostMessage::Copy { text: "3, 2".into() },
                HostMessage::Copy { text: "33, 50".into() },
            ]
        );
        assert!(insp.drain_outbox().is_empty());
    }

    #[test]
    fn grid_toggle_only_requests_redraw() {
        let mut insp = loaded(64, 64);
        let update = insp.apply(InspectorEvent::ShowGrid(true));
        assert_eq!(update, Update { redraw: true, ..Default::default() });
        assert!(insp.show_grid());
    }
}
