//! Tracing setup for hosts embedding the preview engine.
//!
//! The filter sits behind a reload layer so the level from `PreviewConfig`
//! can be applied after the config file has been read.

use crate::config::LogLevel;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

pub type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

/// Install the global subscriber. `RUST_LOG` wins over `level` when set.
///
/// Returns `None` when a global subscriber was already installed by the host.
pub fn init_tracing(level: LogLevel) -> Option<ReloadHandle> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_for(level));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .try_init();
    match installed {
        Ok(()) => {
            info!(%level, "Logging initialized; override level with log_level or RUST_LOG");
            Some(handle)
        }
        Err(err) => {
            warn!("Tracing subscriber already installed: {err}");
            None
        }
    }
}

pub fn set_log_level(handle: &ReloadHandle, level: LogLevel) {
    let parsed = filter_for(level);
    if let Err(err) = handle.modify(|filter| *filter = parsed) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}

fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::builder()
        .parse(level.as_filter_str())
        .unwrap_or_else(|_| EnvFilter::new("debug"))
}
