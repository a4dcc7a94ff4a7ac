use serde::Deserialize;
use std::time::Duration;

/// Preview engine configuration; deserializable from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, serde::Serialize)]
pub struct PreviewConfig {
    #[serde(default = "crate::config::defaults::default_cdn_host")]
    pub cdn_host: String,
    #[serde(default = "crate::config::defaults::default_cdn_path_delimiter")]
    pub cdn_path_delimiter: String,
    #[serde(default = "crate::config::defaults::default_thumbnail_width")]
    pub thumbnail_width: u32,
    #[serde(default = "crate::config::defaults::default_page_width")]
    pub page_width: u32,
    #[serde(default = "crate::config::defaults::default_raster_extension")]
    pub raster_extension: String,
    #[serde(default = "crate::config::defaults::default_external_viewer_endpoint")]
    pub external_viewer_endpoint: String,
    #[serde(default = "crate::config::defaults::default_native_frame_fragment")]
    pub native_frame_fragment: String,
    #[serde(default = "crate::config::defaults::default_escalation_delay_ms")]
    pub escalation_delay_ms: u64,
    #[serde(default = "crate::config::defaults::default_library_key")]
    pub library_key: String,
    #[serde(default = "crate::config::defaults::default_active_key")]
    pub active_key: String,
    #[serde(default = "crate::config::defaults::default_title_prefix")]
    pub default_title_prefix: String,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        use crate::config::defaults::*;
        PreviewConfig {
            cdn_host: default_cdn_host(),
            cdn_path_delimiter: default_cdn_path_delimiter(),
            thumbnail_width: default_thumbnail_width(),
            page_width: default_page_width(),
            raster_extension: default_raster_extension(),
            external_viewer_endpoint: default_external_viewer_endpoint(),
            native_frame_fragment: default_native_frame_fragment(),
            escalation_delay_ms: default_escalation_delay_ms(),
            library_key: default_library_key(),
            active_key: default_active_key(),
            default_title_prefix: default_title_prefix(),
            log_level: default_log_level(),
        }
    }
}

impl PreviewConfig {
    /// Minimum time the "optimizing" indicator stays up before a fallback is mounted.
    pub fn escalation_delay(&self) -> Duration {
        Duration::from_millis(self.escalation_delay_ms)
    }

    /// Replace unusable values with defaults and normalize the CDN delimiter.
    pub(crate) fn sanitized(mut self) -> Self {
        use crate::config::defaults::*;
        if self.cdn_host.trim().is_empty() {
            self.cdn_host = default_cdn_host();
        }
        self.cdn_host = self.cdn_host.trim().to_ascii_lowercase();

        let delimiter = self.cdn_path_delimiter.trim().trim_matches('/');
        self.cdn_path_delimiter = if delimiter.is_empty() {
            default_cdn_path_delimiter()
        } else {
            format!("/{delimiter}/")
        };

        if self.thumbnail_width == 0 {
            self.thumbnail_width = default_thumbnail_width();
        }
        if self.page_width == 0 {
            self.page_width = default_page_width();
        }

        let extension = self.raster_extension.trim().trim_start_matches('.');
        self.raster_extension = if extension.is_empty() {
            default_raster_extension()
        } else {
            extension.to_string()
        };

        if self.external_viewer_endpoint.trim().is_empty() {
            self.external_viewer_endpoint = default_external_viewer_endpoint();
        }
        if self.library_key.trim().is_empty() {
            self.library_key = default_library_key();
        }
        if self.active_key.trim().is_empty() || self.active_key == self.library_key {
            self.active_key = default_active_key();
        }
        self
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
