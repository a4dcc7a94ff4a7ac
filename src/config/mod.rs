//! Configuration loading for the preview engine.
//!
//! All tunable settings are centralized here and loaded from
//! `conf/preview.toml` if present. Missing or invalid entries fall back to
//! defaults so a preview can always be opened.

mod defaults;
mod io;
mod models;
mod tables;

pub use io::{load_config, parse_config, serialize_config};
pub use models::{LogLevel, PreviewConfig};
