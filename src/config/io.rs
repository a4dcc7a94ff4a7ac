use super::models::PreviewConfig;
use super::tables::ConfigTables;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> PreviewConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded preview config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return PreviewConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(cfg) => {
            debug!(
                cdn_host = %cfg.cdn_host,
                delay_ms = cfg.escalation_delay_ms,
                "Parsed configuration from disk"
            );
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err:#}");
            PreviewConfig::default()
        }
    }
}

/// Parse the tabled TOML layout into a sanitized config.
pub fn parse_config(contents: &str) -> Result<PreviewConfig> {
    let tables: ConfigTables =
        toml::from_str(contents).context("failed to parse preview config tables")?;
    Ok(PreviewConfig::from(tables).sanitized())
}

pub fn serialize_config(config: &PreviewConfig) -> Result<String> {
    toml::to_string(&ConfigTables::from(config)).context("failed to serialize preview config")
}
