use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use eframe::egui;
use egui::{Color32, ColorImage, Pos2, Rect, RichText, Sense, Stroke, TextureHandle, TextureOptions, Vec2};
use rayon::prelude::*;
use uuid::Uuid;

use crate::bridge::{self, ClipboardBridge};
use crate::inspector::{CopyTarget, Inspector, InspectorEvent, Update};
use crate::mapper::{self, TileSize};
use crate::render::{self, RenderPlan};
use crate::settings::AppSettings;
use crate::sheet::{self, Chunk, LoadResult, SpriteSheet};

/// How long a status message (copy confirmation, load error) stays visible.
const STATUS_SECONDS: f64 = 3.0;

const TILE_INPUT_WIDTH: f32 = 48.0;

/// One open sprite sheet.
struct Document {
    id: Uuid,
    path: PathBuf,
    /// File name shown in the title bar
    name: String,
    sheet: Option<SpriteSheet>,
    /// The sheet split into pieces the GPU can hold
    textures: Vec<(Chunk, TextureHandle)>,
    inspector: Inspector,
}

impl Document {
    fn new(path: PathBuf, inspector: Inspector) -> Self {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        Self {
            id: Uuid::new_v4(),
            path,
            name,
            sheet: None,
            textures: Vec::new(),
            inspector,
        }
    }
}

/// Text behind the tile-size inputs.
struct TileInputs {
    width: String,
    height: String,
}

impl TileInputs {
    fn new(tile: TileSize) -> Self {
        Self { width: tile.width.to_string(), height: tile.height.to_string() }
    }

    fn sync(&mut self, tile: TileSize) {
        *self = Self::new(tile);
    }

    /// After a frame's events: a commit or an info change shows the size
    /// actually in effect, whatever was typed.
    fn settle(&mut self, committed: bool, update: &Update, tile: TileSize) {
        if committed || update.info {
            self.sync(tile);
        }
    }
}

fn commits_tile_input(events: &[InspectorEvent]) -> bool {
    events.iter().any(|e| {
        matches!(e, InspectorEvent::TileWidthInput(_) | InspectorEvent::TileHeightInput(_))
    })
}

/// Upload `sheet` as NEAREST-sampled textures, one per chunk.
fn upload_chunks(
    ctx: &egui::Context,
    id: Uuid,
    sheet: &SpriteSheet,
    max_side: usize,
) -> Vec<(Chunk, TextureHandle)> {
    let images: Vec<(Chunk, ColorImage)> = sheet::texture_chunks(sheet.width(), sheet.height(), max_side)
        .into_par_iter()
        .map(|chunk| {
            let pixels = sheet.chunk_pixels(chunk);
            let image = ColorImage::from_rgba_unmultiplied(
                [chunk.width as usize, chunk.height as usize],
                pixels.as_raw(),
            );
            (chunk, image)
        })
        .collect();

    images
        .into_iter()
        .enumerate()
        .map(|(i, (chunk, image))| {
            let name = format!("sheet-{}-{}", id, i);
            (chunk, ctx.load_texture(name, image, TextureOptions::NEAREST))
        })
        .collect()
}

pub struct SpriteHelperApp {
    document: Option<Document>,
    settings: AppSettings,

    load_sender: mpsc::Sender<LoadResult>,
    load_receiver: mpsc::Receiver<LoadResult>,

    clipboard: ClipboardBridge,

    tile_inputs: TileInputs,

    status: Option<(String, f64)>,
    window_title: String,

    pending_startup_files: Vec<PathBuf>,
    first_frame: bool,
}

impl SpriteHelperApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, startup_files: Vec<PathBuf>) -> Self {
        let settings = AppSettings::load();
        let (load_sender, load_receiver) = mpsc::channel();
        log_info!(
            "Settings: tile {}x{}, grid {}, row/col {}",
            settings.tile.width,
            settings.tile.height,
            settings.show_grid,
            settings.row_col_format
        );
        Self {
            tile_inputs: TileInputs::new(settings.tile),
            document: None,
            settings,
            load_sender,
            load_receiver,
            clipboard: ClipboardBridge::new(),
            status: None,
            window_title: String::new(),
            pending_startup_files: startup_files,
            first_frame: true,
        }
    }

    fn open_file_by_path(&mut self, path: PathBuf) {
        // Already shown or still decoding; a failed load may be retried.
        if self
            .document
            .as_ref()
            .is_some_and(|d| d.path == path && (d.sheet.is_some() || d.inspector.is_loading()))
        {
            return;
        }
        log_info!("Opening {}", path.display());
        let inspector = Inspector::new(self.settings.view_defaults());
        self.tile_inputs.sync(inspector.tile_size());
        let doc = Document::new(path.clone(), inspector);
        sheet::spawn_load(doc.id, path, self.load_sender.clone());
        self.document = Some(doc);
    }

    fn open_dialog(&mut self) {
        let picked = rfd::FileDialog::new()
            .add_filter("Images", sheet::SUPPORTED_EXTENSIONS)
            .pick_file();
        if let Some(path) = picked {
            self.open_file_by_path(path);
        }
    }

    fn set_status(&mut self, msg: String, now: f64) {
        self.status = Some((msg, now));
    }

    /// Results for a document that has since been replaced are dropped.
    fn poll_loads(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.load_receiver.try_recv() {
            let now = ctx.input(|i| i.time);
            let Some(doc) = self.document.as_mut().filter(|d| result.is_for(d.id)) else {
                log_info!("Discarded load result for a closed document");
                continue;
            };
            match result {
                LoadResult::Loaded { sheet, .. } => {
                    let max_side = ctx.input(|i| i.max_texture_side);
                    doc.textures = upload_chunks(ctx, doc.id, &sheet, max_side);
                    log_info!(
                        "Uploaded {} as {} texture(s), max side {}",
                        doc.name,
                        doc.textures.len(),
                        max_side
                    );
                    doc.inspector.apply(InspectorEvent::ImageLoaded {
                        width: sheet.width(),
                        height: sheet.height(),
                    });
                    doc.sheet = Some(sheet);
                }
                LoadResult::Failed { error, .. } => {
                    doc.inspector.apply(InspectorEvent::ImageFailed(error.clone()));
                    let msg = format!("Failed to open {}: {}", doc.name, error);
                    self.set_status(msg, now);
                }
            }
            ctx.request_repaint();
        }
    }

    /// Feed events to the open document and keep settings in step with it.
    fn dispatch(&mut self, events: Vec<InspectorEvent>, now: f64) -> Update {
        let mut combined = Update::default();
        let Some(doc) = self.document.as_mut() else {
            return combined;
        };
        for event in events {
            let update = doc.inspector.apply(event);
            combined.redraw |= update.redraw;
            combined.info |= update.info;
            combined.readout |= update.readout;
            if update.hover.is_some() {
                combined.hover = update.hover;
            }
        }

        let messages = doc.inspector.drain_outbox();
        if let Some(status) = bridge::deliver_all(&mut self.clipboard, messages) {
            self.set_status(status, now);
        }

        self.sync_settings();
        combined
    }

    fn sync_settings(&mut self) {
        let Some(doc) = self.document.as_ref() else { return };
        let insp = &doc.inspector;
        let next = AppSettings {
            tile: insp.tile_size(),
            show_grid: insp.show_grid(),
            row_col_format: insp.row_col_format(),
            remember_zoom: self.settings.remember_zoom,
            zoom: insp.zoom(),
        };
        if next != self.settings {
            self.settings = next;
            self.settings.save();
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let path = dropped
            .into_iter()
            .filter_map(|f| f.path)
            .find(|p| sheet::is_supported_extension(p));
        if let Some(path) = path {
            self.open_file_by_path(path);
        }
    }

    fn update_title(&mut self, ctx: &egui::Context) {
        let title = match &self.document {
            Some(doc) => format!("SpriteHelper - {}", doc.name),
            None => "SpriteHelper".to_string(),
        };
        if title != self.window_title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.window_title = title;
        }
    }

    // ------------------------------------------------------------------------
    //  Panels
    // ------------------------------------------------------------------------

    fn controls_ui(&mut self, ui: &mut egui::Ui, events: &mut Vec<InspectorEvent>) {
        let (mut show_grid, mut row_col, zoom_text) = match &self.document {
            Some(doc) => (
                doc.inspector.show_grid(),
                doc.inspector.row_col_format(),
                doc.inspector.zoom_text(),
            ),
            None => (self.settings.show_grid, self.settings.row_col_format, "100%".to_string()),
        };
        let has_doc = self.document.is_some();

        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing.x = 8.0;
            if ui.button("Open…").clicked() {
                self.open_dialog();
            }
            ui.separator();

            ui.add_enabled_ui(has_doc, |ui| {
                ui.label("Tile Width:");
                let w = ui.add(
                    egui::TextEdit::singleline(&mut self.tile_inputs.width)
                        .desired_width(TILE_INPUT_WIDTH),
                );
                if w.lost_focus() {
                    events.push(InspectorEvent::TileWidthInput(self.tile_inputs.width.clone()));
                }

                ui.label("Tile Height:");
                let h = ui.add(
                    egui::TextEdit::singleline(&mut self.tile_inputs.height)
                        .desired_width(TILE_INPUT_WIDTH),
                );
                if h.lost_focus() {
                    events.push(InspectorEvent::TileHeightInput(self.tile_inputs.height.clone()));
                }

                if ui.checkbox(&mut show_grid, "Show Grid").changed() {
                    events.push(InspectorEvent::ShowGrid(show_grid));
                }
                if ui.checkbox(&mut row_col, "Row, Column format").changed() {
                    events.push(InspectorEvent::RowColFormat(row_col));
                }

                ui.separator();
                if ui.button(" - ").on_hover_text("Zoom out").clicked() {
                    events.push(InspectorEvent::ZoomOut);
                }
                ui.add_sized([50.0, 20.0], egui::Label::new(zoom_text));
                if ui.button(" + ").on_hover_text("Zoom in").clicked() {
                    events.push(InspectorEvent::ZoomIn);
                }
            });
        });
    }

    fn info_ui(&self, ui: &mut egui::Ui, events: &mut Vec<InspectorEvent>) {
        let Some(doc) = &self.document else {
            ui.label("Open a sprite sheet (or drop one on the window) to start.");
            return;
        };
        let insp = &doc.inspector;
        let value = |text: String| RichText::new(text).monospace().strong();

        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing.x = 8.0;
            ui.label("Tile:");
            ui.label(value(insp.tile_text()));
            if ui.button("Copy").on_hover_text("Copy tile coordinates").clicked() {
                events.push(InspectorEvent::Copy(CopyTarget::Tile));
            }
            ui.separator();
            ui.label("Pixel:");
            ui.label(value(insp.pixel_text()));
            if ui.button("Copy").on_hover_text("Copy pixel coordinates").clicked() {
                events.push(InspectorEvent::Copy(CopyTarget::Pixel));
            }
            ui.separator();
            ui.label("Image Size:");
            ui.label(value(insp.image_size_text()));
            ui.separator();
            ui.label("Grid Size:");
            ui.label(value(insp.grid_size_text()));
        });

        if let Some(err) = insp.load_error() {
            ui.colored_label(Color32::from_rgb(220, 80, 80), format!("Could not load image: {}", err));
        }
    }

    fn canvas_ui(&self, ui: &mut egui::Ui, events: &mut Vec<InspectorEvent>) {
        let Some(doc) = &self.document else { return };
        let Some(plan) = render::plan(&doc.inspector) else {
            if doc.inspector.is_loading() {
                ui.spinner();
            }
            return;
        };
        let size = Vec2::new(plan.canvas_width, plan.canvas_height);
        let (response, painter) = ui.allocate_painter(size, Sense::click());
        let rect = response.rect;

        let clip = ui.clip_rect();
        paint_checkerboard(&painter, rect, clip);
        for (chunk, texture) in &doc.textures {
            let piece = Rect::from_min_size(
                rect.min + Vec2::new(chunk.x as f32, chunk.y as f32) * plan.zoom,
                Vec2::new(chunk.width as f32, chunk.height as f32) * plan.zoom,
            );
            if !piece.intersects(clip) {
                continue;
            }
            painter.image(
                texture.id(),
                piece,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }
        paint_overlays(&painter, rect, &plan);

        if response.clicked()
            && let Some(pos) = response.interact_pointer_pos()
        {
            events.push(InspectorEvent::Click { x: pos.x - rect.min.x, y: pos.y - rect.min.y });
        }

        // Tooltip text comes from the same mapping as clicks.
        let hover = response.hover_pos().and_then(|pos| {
            let pick = doc.inspector.hover(pos.x - rect.min.x, pos.y - rect.min.y)?;
            Some(mapper::hover_text(&pick, doc.inspector.row_col_format()))
        });
        if let Some(text) = hover {
            response.on_hover_text_at_pointer(text);
        }
    }
}

fn color32(c: image::Rgba<u8>) -> Color32 {
    Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3])
}

/// Grey checkerboard behind transparent pixels, limited to the visible part.
fn paint_checkerboard(painter: &egui::Painter, rect: Rect, clip: Rect) {
    let visible = rect.intersect(clip);
    if visible.width() <= 0.0 || visible.height() <= 0.0 {
        return;
    }
    let [lr, lg, lb] = render::CHECKER_LIGHT;
    let [dr, dg, db] = render::CHECKER_DARK;
    painter.rect_filled(visible, 0.0, Color32::from_rgb(lr, lg, lb));
    let dark = Color32::from_rgb(dr, dg, db);

    let cell = render::CHECKER_CELL;
    let x_start = ((visible.min.x - rect.min.x) / cell).floor() * cell;
    let y_start = ((visible.min.y - rect.min.y) / cell).floor() * cell;
    let mut y = y_start;
    while rect.min.y + y < visible.max.y {
        let mut x = x_start;
        while rect.min.x + x < visible.max.x {
            if render::checker_is_dark(x, y) {
                let cell_rect = Rect::from_min_size(rect.min + Vec2::new(x, y), Vec2::splat(cell))
                    .intersect(visible);
                painter.rect_filled(cell_rect, 0.0, dark);
            }
            x += cell;
        }
        y += cell;
    }
}

/// Grid lines and highlight box from the render plan.
fn paint_overlays(painter: &egui::Painter, rect: Rect, plan: &RenderPlan) {
    if let Some(grid) = &plan.grid {
        let stroke = Stroke::new(1.0, color32(render::GRID_COLOR));
        for &x in &grid.vertical {
            let sx = rect.min.x + x + render::LINE_OFFSET;
            painter.line_segment([Pos2::new(sx, rect.min.y), Pos2::new(sx, rect.max.y)], stroke);
        }
        for &y in &grid.horizontal {
            let sy = rect.min.y + y + render::LINE_OFFSET;
            painter.line_segment([Pos2::new(rect.min.x, sy), Pos2::new(rect.max.x, sy)], stroke);
        }
    }

    if let Some(h) = &plan.highlight {
        let bw = render::HIGHLIGHT_BORDER_WIDTH as f32;
        let r = Rect::from_min_size(rect.min + Vec2::new(h.left, h.top), Vec2::new(h.width, h.height));
        painter.rect_filled(r, 0.0, color32(render::HIGHLIGHT_FILL));
        // Border sits inside the box; a thin dark outline keeps it readable on yellow art.
        painter.rect_stroke(r.shrink(bw / 2.0), 0.0, Stroke::new(bw, color32(render::HIGHLIGHT_BORDER)));
        painter.rect_stroke(r.expand(0.5), 0.0, Stroke::new(1.0, Color32::from_black_alpha(128)));
    }
}

impl eframe::App for SpriteHelperApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);

        if self.first_frame {
            self.first_frame = false;
            // Only one sheet is shown at a time; the last argument wins.
            if let Some(path) = std::mem::take(&mut self.pending_startup_files).pop() {
                self.open_file_by_path(path);
            }
        }

        self.poll_loads(ctx);
        self.handle_dropped_files(ctx);
        self.update_title(ctx);

        let mut events = Vec::new();

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.add_space(4.0);
            self.controls_ui(ui, &mut events);
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::top("info").show(ctx, |ui| {
            ui.add_space(4.0);
            self.info_ui(ui, &mut events);
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            match &self.status {
                Some((msg, shown_at)) if now - shown_at < STATUS_SECONDS => {
                    ui.label(msg.as_str());
                    ctx.request_repaint_after(Duration::from_secs_f64(STATUS_SECONDS));
                }
                _ => {
                    ui.label(RichText::new("Click a tile to select it").weak());
                }
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                self.canvas_ui(ui, &mut events);
            });
        });

        let tile_committed = commits_tile_input(&events);
        let update = self.dispatch(events, now);
        if let Some(doc) = &self.document {
            self.tile_inputs.settle(tile_committed, &update, doc.inspector.tile_size());
        }
        if update.redraw || update.info || update.readout {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(insp: &mut Inspector, inputs: &mut TileInputs, event: InspectorEvent) {
        let committed = commits_tile_input(std::slice::from_ref(&event));
        let update = insp.apply(event);
        inputs.settle(committed, &update, insp.tile_size());
    }

    #[test]
    fn unusable_text_is_replaced_even_when_size_is_unchanged() {
        let mut insp = Inspector::default();
        insp.apply(InspectorEvent::ImageLoaded { width: 64, height: 64 });
        let mut inputs = TileInputs::new(insp.tile_size());

        inputs.width = "abc".into();
        let event = InspectorEvent::TileWidthInput(inputs.width.clone());
        commit(&mut insp, &mut inputs, event);
        assert_eq!(insp.tile_size().width, 16);
        assert_eq!(inputs.width, "16");
    }

    #[test]
    fn oversized_text_shows_the_clamped_edge() {
        let mut insp = Inspector::new(crate::inspector::ViewDefaults {
            tile: TileSize::new(16, 512),
            ..Default::default()
        });
        let mut inputs = TileInputs::new(insp.tile_size());

        inputs.height = "9000".into();
        let event = InspectorEvent::TileHeightInput(inputs.height.clone());
        commit(&mut insp, &mut inputs, event);
        assert_eq!(inputs.height, "512");
        assert_eq!(inputs.width, "16");
    }

    #[test]
    fn only_tile_inputs_count_as_commits() {
        assert!(!commits_tile_input(&[InspectorEvent::ZoomIn, InspectorEvent::ShowGrid(true)]));
        assert!(commits_tile_input(&[InspectorEvent::TileHeightInput("8".into())]));
    }
}
