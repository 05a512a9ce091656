//! Session log for the GUI.
//!
//! Each launch truncates `spritehelper.log` under the platform data directory
//! (`%APPDATA%\SpriteHelper`, `~/Library/Application Support/SpriteHelper`,
//! or `$XDG_DATA_HOME/SpriteHelper` falling back to `~/.local/share`).
//! Lines look like `[HH:MM:SS] [LEVEL] message`.
//!
//! Log through `log_info!` / `log_warn!` / `log_err!`.  Until [`init`] opens
//! the file (tests, headless CLI) they do nothing.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
    Panic,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Panic => "PANIC",
        })
    }
}

static SESSION: OnceLock<Mutex<File>> = OnceLock::new();

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Warn, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Error, &format!($($arg)*))
    };
}

/// Append one tagged line.  Write failures are swallowed.
pub fn write(level: Level, msg: &str) {
    let Some(file) = SESSION.get() else { return };
    if let Ok(mut file) = file.lock() {
        let _ = writeln!(file, "{}", format_line(&clock_now(), level, msg));
    }
}

fn format_line(clock: &str, level: Level, msg: &str) -> String {
    format!("[{}] [{}] {}", clock, level, msg)
}

/// Open the session log at its default location.
pub fn init() {
    let path = default_path();
    if let Err(e) = init_at(&path) {
        eprintln!("SpriteHelper: no session log at {}: {}", path.display(), e);
    }
}

/// Open (truncating) the session log at `path` and route panics through it.
/// Later calls are no-ops once a log is open.
pub fn init_at(path: &Path) -> io::Result<()> {
    if SESSION.get().is_some() {
        return Ok(());
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut file = OpenOptions::new().create(true).write(true).truncate(true).open(path)?;
    writeln!(file, "SpriteHelper {} session log: {}", env!("CARGO_PKG_VERSION"), path.display())?;
    if SESSION.set(Mutex::new(file)).is_err() {
        return Ok(());
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        write(Level::Panic, &info.to_string());
        previous(info);
    }));
    Ok(())
}

fn default_path() -> PathBuf {
    data_dir().join("SpriteHelper").join("spritehelper.log")
}

fn data_dir() -> PathBuf {
    let var = |name: &str| std::env::var_os(name).map(PathBuf::from);
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = var("APPDATA") {
            return appdata;
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = var("HOME") {
            return home.join("Library").join("Application Support");
        }
    }
    var("XDG_DATA_HOME")
        .or_else(|| var("HOME").map(|h| h.join(".local").join("share")))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn clock_now() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| clock_from_secs(d.as_secs()))
        .unwrap_or_else(|_| "--:--:--".to_string())
}

/// UTC wall clock for `secs` since the epoch.
fn clock_from_secs(secs: u64) -> String {
    let day = secs % 86_400;
    format!("{:02}:{:02}:{:02}", day / 3600, day % 3600 / 60, day % 60)
}
