use std::path::{Path, PathBuf};

use crate::inspector::ViewDefaults;
use crate::mapper::{self, TileSize};

/// User preferences applied to every newly opened sprite sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    /// Default tile size for new documents
    pub tile: TileSize,
    pub show_grid: bool,
    /// Show tile coordinates as "row, column"
    pub row_col_format: bool,
    /// Reopen documents at the last used zoom instead of 100%
    pub remember_zoom: bool,
    pub zoom: f32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            tile: TileSize::default(),
            show_grid: false,
            row_col_format: false,
            remember_zoom: false,
            zoom: 1.0,
        }
    }
}

impl AppSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/spritehelper/spritehelper_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\SpriteHelper\spritehelper_settings.cfg
    /// On macOS:   ~/Library/Application Support/SpriteHelper/spritehelper_settings.cfg
    /// Fallback:   same directory as the executable.
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("spritehelper");
            return Some(config_dir.join("spritehelper_settings.cfg"));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            return Some(
                PathBuf::from(appdata)
                    .join("SpriteHelper")
                    .join("spritehelper_settings.cfg"),
            );
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("SpriteHelper")
                    .join("spritehelper_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join("spritehelper_settings.cfg")))
        }
    }

    /// Defaults for a new inspector.  Zoom resets to 100% unless remembered.
    pub fn view_defaults(&self) -> ViewDefaults {
        ViewDefaults {
            tile: self.tile,
            zoom: if self.remember_zoom { self.zoom } else { 1.0 },
            show_grid: self.show_grid,
            row_col_format: self.row_col_format,
        }
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "tile_width={}\n\
             tile_height={}\n\
             show_grid={}\n\
             row_col_format={}\n\
             remember_zoom={}\n\
             zoom={}\n",
            self.tile.width,
            self.tile.height,
            self.show_grid,
            self.row_col_format,
            self.remember_zoom,
            self.zoom,
        )
    }

    /// Parse `key=value` lines.  Unknown keys and bad values keep their defaults.
    pub fn from_config_str(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "tile_width" => s.tile.width = TileSize::parse_edge(val),
                "tile_height" => s.tile.height = TileSize::parse_edge(val),
                "show_grid" => s.show_grid = val == "true",
                "row_col_format" => s.row_col_format = val == "true",
                "remember_zoom" => s.remember_zoom = val == "true",
                "zoom" => {
                    if let Some(z) = val.parse::<f32>().ok().and_then(mapper::clamp_zoom) {
                        s.zoom = z;
                    }
                }
                _ => {}
            }
        }
        s
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_config_str(&content),
            Err(_) => Self::default(),
        }
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Err(e) = self.save_to(&path) {
            log_warn!("Could not save settings to {}: {}", path.display(), e);
        }
    }

    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        Self::load_from(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("spritehelper_settings.cfg");
        let settings = AppSettings {
            tile: TileSize::new(8, 32),
            show_grid: true,
            row_col_format: true,
            remember_zoom: true,
            zoom: 4.0,
        };
        settings.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path), settings);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(AppSettings::load_from(&dir.path().join("absent.cfg")), AppSettings::default());
    }

    #[test]
    fn malformed_values_are_normalized() {
        let s = AppSettings::from_config_str(
            "# comment\n\
             tile_width=0\n\
             tile_height=2048\n\
             zoom=inf\n\
             show_grid=yes\n\
             mystery=1\n\
             no equals sign\n",
        );
        assert_eq!(s.tile, TileSize { width: 16, height: 512 });
        assert_eq!(s.zoom, 1.0);
        assert!(!s.show_grid);
    }

    #[test]
    fn out_of_range_zoom_clamps() {
        let s = AppSettings::from_config_str("zoom=0.01\n");
        assert_eq!(s.zoom, 0.25);
    }

    #[test]
    fn zoom_only_carried_when_remembered() {
        let mut s = AppSettings { zoom: 2.0, ..Default::default() };
        assert_eq!(s.view_defaults().zoom, 1.0);
        s.remember_zoom = true;
        assert_eq!(s.view_defaults().zoom, 2.0);
    }
}
