//! SpriteHelper: a read-only sprite sheet inspector.
//!
//! The inspector core (`mapper`, `inspector`, `render`) is free of any UI
//! toolkit; `app` binds it to an egui window and `cli` to the terminal.

#[macro_use]
pub mod logger;

pub mod app;
pub mod bridge;
pub mod cli;
pub mod inspector;
pub mod mapper;
pub mod render;
pub mod settings;
pub mod sheet;
