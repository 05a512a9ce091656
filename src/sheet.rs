use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Instant;

use uuid::Uuid;

/// File extensions offered in the open dialog and accepted on drop.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "webp", "bmp", "tga", "ico", "tif", "tiff",
];

pub fn is_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Largest edge of one uploaded texture piece.
pub const TEXTURE_CHUNK: u32 = 2048;

/// A rectangular piece of a sheet, in source pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Cover a `width`×`height` sheet with row-major pieces whose edges never
/// exceed `TEXTURE_CHUNK` or the renderer's `max_side`.
pub fn texture_chunks(width: u32, height: u32, max_side: usize) -> Vec<Chunk> {
    let side = (max_side.min(TEXTURE_CHUNK as usize) as u32).max(1);
    let mut chunks = Vec::new();
    let mut y = 0;
    while y < height {
        let h = side.min(height - y);
        let mut x = 0;
        while x < width {
            let w = side.min(width - x);
            chunks.push(Chunk { x, y, width: w, height: h });
            x += w;
        }
        y += h;
    }
    chunks
}

/// A decoded sprite sheet.  Never mutated after loading.
#[derive(Clone)]
pub struct SpriteSheet {
    pixels: RgbaImage,
}

impl SpriteSheet {
    /// Wrap an already-decoded image.  Zero-area images are rejected.
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self, LoadError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(LoadError::Empty);
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Copy of the pixels under `chunk`.
    pub fn chunk_pixels(&self, chunk: Chunk) -> RgbaImage {
        image::imageops::crop_imm(&self.pixels, chunk.x, chunk.y, chunk.width, chunk.height)
            .to_image()
    }
}

/// Error type for sprite sheet loading
#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Decode(image::ImageError),
    Empty,
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "I/O error: {}", e),
            LoadError::Decode(e) => write!(f, "Decode error: {}", e),
            LoadError::Empty => write!(f, "Image has no pixels"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e)
    }
}

impl From<image::ImageError> for LoadError {
    fn from(e: image::ImageError) -> Self {
        LoadError::Decode(e)
    }
}

/// Decode a sprite sheet from disk on the current thread.
/// The format comes from the file's magic bytes, falling back to its extension.
pub fn load_sync(path: &Path) -> Result<SpriteSheet, LoadError> {
    let img = image::io::Reader::open(path)?
        .with_guessed_format()?
        .decode()?
        .to_rgba8();
    SpriteSheet::from_rgba(img)
}

/// Outcome of a background load, tagged with the requesting document's id.
pub enum LoadResult {
    Loaded { id: Uuid, sheet: SpriteSheet, path: PathBuf },
    Failed { id: Uuid, path: PathBuf, error: String },
}

impl LoadResult {
    pub fn id(&self) -> Uuid {
        match self {
            LoadResult::Loaded { id, .. } | LoadResult::Failed { id, .. } => *id,
        }
    }

    /// True only for the load started by document `id`; results for a
    /// replaced or reopened document are stale.
    pub fn is_for(&self, id: Uuid) -> bool {
        self.id() == id
    }
}

/// Decode `path` on the rayon pool and send the result, tagged with `id`,
/// to `sender`.  A dropped receiver (window closed mid-load) is ignored.
pub fn spawn_load(id: Uuid, path: PathBuf, sender: mpsc::Sender<LoadResult>) {
    rayon::spawn(move || {
        let start = Instant::now();
        let result = match load_sync(&path) {
            Ok(sheet) => {
                log_info!(
                    "Decoded {} ({}x{}) in {:.0}ms",
                    path.display(),
                    sheet.width(),
                    sheet.height(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
                LoadResult::Loaded { id, sheet, path }
            }
            Err(e) => {
                log_err!("Failed to decode {}: {}", path.display(), e);
                LoadResult::Failed { id, path, error: e.to_string() }
            }
        };
        let _ = sender.send(result);
    });
}
