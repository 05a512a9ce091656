// ============================================================================
// SpriteHelper CLI: headless inspection via command-line arguments
// ============================================================================
//
// Usage examples:
//   spritehelper --input hero.png --tile 16x16
//   spritehelper -i hero.png --tile 8 --zoom 4 --grid --render preview.png
//   spritehelper -i hero.png --pick 40,52 --row-col --copy tile
//   spritehelper -i "sheets/*.png" --tile 32x32
//
// No window is opened in CLI mode.  Picks are display-space clicks, i.e.
// already multiplied by --zoom, exactly like clicks on the canvas.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};

use crate::bridge::{self, ClipboardBridge, HostBridge};
use crate::inspector::{CopyTarget, Inspector, InspectorEvent, ViewDefaults};
use crate::mapper::{self, TileSize};
use crate::render;
use crate::sheet;

/// SpriteHelper headless sprite sheet inspector.
#[derive(Parser, Debug)]
#[command(
    name = "spritehelper",
    about = "SpriteHelper headless sprite sheet inspector",
    long_about = "Report image and tile-grid sizes for sprite sheets, resolve clicks\n\
                  into tile/pixel coordinates and render zoomed previews with a grid\n\
                  overlay, without opening the GUI.\n\n\
                  Example:\n  \
                  spritehelper --input hero.png --tile 16x16 --pick 40,52\n  \
                  spritehelper -i hero.png --zoom 4 --grid --render preview.png"
)]
pub struct CliArgs {
    /// Input sprite sheet(s). Glob patterns accepted (e.g. "sheets/*.png").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Tile size as WxH, or a single number for square tiles (default 16x16).
    #[arg(short, long, value_name = "WxH")]
    pub tile: Option<String>,

    /// Zoom factor, clamped to 0.25–8 (default 1).
    #[arg(short, long, value_name = "ZOOM")]
    pub zoom: Option<f32>,

    /// Draw the tile grid in the rendered preview.
    #[arg(long)]
    pub grid: bool,

    /// Report tile coordinates as "row, column".
    #[arg(long)]
    pub row_col: bool,

    /// Click at display coordinates X,Y. Repeatable; the last accepted pick wins.
    #[arg(short, long, value_name = "X,Y")]
    pub pick: Vec<String>,

    /// Write the rendered canvas (sheet, grid, highlight) to this file.
    /// Only valid for a single input.
    #[arg(short, long, value_name = "FILE")]
    pub render: Option<PathBuf>,

    /// Copy the selected tile or pixel coordinate to the system clipboard.
    #[arg(long, value_enum)]
    pub copy: Option<CopyArg>,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CopyArg {
    Tile,
    Pixel,
}

impl From<CopyArg> for CopyTarget {
    fn from(c: CopyArg) -> Self {
        match c {
            CopyArg::Tile => CopyTarget::Tile,
            CopyArg::Pixel => CopyTarget::Pixel,
        }
    }
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process arguments.
    /// Used by `main()` to route before creating an eframe window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }

    /// Validated, normalised per-file options.
    pub fn options(&self) -> Result<InspectOptions, String> {
        let tile = match &self.tile {
            Some(t) => parse_tile(t),
            None => TileSize::default(),
        };
        let zoom = match self.zoom {
            Some(z) => mapper::clamp_zoom(z).ok_or_else(|| format!("invalid zoom '{}'", z))?,
            None => 1.0,
        };
        let picks = self
            .pick
            .iter()
            .map(|p| parse_point(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(InspectOptions {
            view: ViewDefaults {
                tile,
                zoom,
                show_grid: self.grid,
                row_col_format: self.row_col,
            },
            picks,
            render: self.render.clone(),
            copy: self.copy.map(CopyTarget::from),
        })
    }
}

/// What to do with each input file.
#[derive(Clone, Debug, PartialEq)]
pub struct InspectOptions {
    pub view: ViewDefaults,
    pub picks: Vec<(f32, f32)>,
    pub render: Option<PathBuf>,
    pub copy: Option<CopyTarget>,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.render.is_some() {
        eprintln!(
            "error: {} input files given but --render only accepts a single input.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let opts = match args.options() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut clipboard = ClipboardBridge::new();
    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        match inspect_file(input_path, &opts, &mut clipboard) {
            Ok(lines) => {
                for line in lines {
                    println!("  {}", line);
                }
                if args.verbose {
                    println!(
                        "  ({:.0}ms)",
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file pipeline
// ============================================================================

/// Load one sheet, replay the picks, optionally copy and render.
/// Returns the report lines.
pub fn inspect_file(
    path: &Path,
    opts: &InspectOptions,
    host: &mut dyn HostBridge,
) -> Result<Vec<String>, String> {
    let sheet = sheet::load_sync(path).map_err(|e| format!("load failed: {}", e))?;

    let mut inspector = Inspector::new(opts.view);
    inspector.apply(InspectorEvent::ImageLoaded {
        width: sheet.width(),
        height: sheet.height(),
    });

    let mut lines = vec![
        format!("Image Size: {}", inspector.image_size_text()),
        format!("Grid Size: {}", inspector.grid_size_text()),
        format!("Zoom: {}", inspector.zoom_text()),
    ];

    for &(x, y) in &opts.picks {
        let update = inspector.apply(InspectorEvent::Click { x, y });
        if update.readout {
            lines.push(format!(
                "Pick {},{}: Tile: {} | Pixel: {}",
                x,
                y,
                inspector.tile_text(),
                inspector.pixel_text()
            ));
        } else {
            lines.push(format!("Pick {},{}: ignored (outside whole tiles)", x, y));
        }
    }

    if !opts.picks.is_empty() {
        lines.push(format!("Tile: {}", inspector.tile_text()));
        lines.push(format!("Pixel: {}", inspector.pixel_text()));
    }

    if let Some(target) = opts.copy {
        inspector.apply(InspectorEvent::Copy(target));
        let status = bridge::deliver_all(host, inspector.drain_outbox());
        lines.push(status.unwrap_or_else(|| "Nothing selected to copy".to_string()));
    }

    if let Some(out) = &opts.render {
        let surface = render::render_surface(sheet.pixels(), &inspector)
            .ok_or_else(|| "nothing to render".to_string())?;
        surface
            .save(out)
            .map_err(|e| format!("render save failed: {}", e))?;
        lines.push(format!(
            "Rendered {}x{} → {}",
            surface.width(),
            surface.height(),
            out.display()
        ));
    }

    Ok(lines)
}

// ============================================================================
// Helpers
// ============================================================================

/// "16x16", "8X4", "24" (square).  Each edge goes through the same lenient
/// parsing as the tile inputs.
pub fn parse_tile(s: &str) -> TileSize {
    match s.split_once(['x', 'X']) {
        Some((w, h)) => TileSize {
            width: TileSize::parse_edge(w),
            height: TileSize::parse_edge(h),
        },
        None => {
            let edge = TileSize::parse_edge(s);
            TileSize { width: edge, height: edge }
        }
    }
}

/// "X,Y" in display coordinates.
pub fn parse_point(s: &str) -> Result<(f32, f32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("pick '{}' is not in X,Y form", s))?;
    let x = x.trim().parse::<f32>().map_err(|_| format!("bad X in pick '{}'", s))?;
    let y = y.trim().parse::<f32>().map_err(|_| format!("bad Y in pick '{}'", s))?;
    if !x.is_finite() || !y.is_finite() {
        return Err(format!("pick '{}' is not finite", s));
    }
    Ok((x, y))
}

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Positional file paths for GUI mode (e.g. "Open with SpriteHelper").
/// Flags are skipped; only paths that exist are returned.
pub fn collect_startup_files() -> Vec<PathBuf> {
    startup_files_from(std::env::args().skip(1))
}

fn startup_files_from(args: impl Iterator<Item = String>) -> Vec<PathBuf> {
    args.filter(|a| !a.starts_with('-'))
        .map(PathBuf::from)
        .filter(|p| p.exists())
        .collect()
}
