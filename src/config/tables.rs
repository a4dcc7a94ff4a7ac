use super::defaults;
use super::models::{LogLevel, PreviewConfig};
use serde::Deserialize;

/// On-disk layout: settings grouped into `[cdn]`, `[viewer]`, `[escalation]`,
/// `[storage]` and `[logging]` tables.
#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    cdn: CdnConfig,
    #[serde(default)]
    viewer: ViewerConfig,
    #[serde(default)]
    escalation: EscalationConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for PreviewConfig {
    fn from(tables: ConfigTables) -> Self {
        PreviewConfig {
            cdn_host: tables.cdn.host,
            cdn_path_delimiter: tables.cdn.path_delimiter,
            thumbnail_width: tables.cdn.thumbnail_width,
            page_width: tables.cdn.page_width,
            raster_extension: tables.cdn.raster_extension,
            external_viewer_endpoint: tables.viewer.external_viewer_endpoint,
            native_frame_fragment: tables.viewer.native_frame_fragment,
            escalation_delay_ms: tables.escalation.delay_ms,
            library_key: tables.storage.library_key,
            active_key: tables.storage.active_key,
            default_title_prefix: tables.storage.default_title_prefix,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&PreviewConfig> for ConfigTables {
    fn from(config: &PreviewConfig) -> Self {
        ConfigTables {
            cdn: CdnConfig {
                host: config.cdn_host.clone(),
                path_delimiter: config.cdn_path_delimiter.clone(),
                thumbnail_width: config.thumbnail_width,
                page_width: config.page_width,
                raster_extension: config.raster_extension.clone(),
            },
            viewer: ViewerConfig {
                external_viewer_endpoint: config.external_viewer_endpoint.clone(),
                native_frame_fragment: config.native_frame_fragment.clone(),
            },
            escalation: EscalationConfig {
                delay_ms: config.escalation_delay_ms,
            },
            storage: StorageConfig {
                library_key: config.library_key.clone(),
                active_key: config.active_key.clone(),
                default_title_prefix: config.default_title_prefix.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct CdnConfig {
    #[serde(default = "defaults::default_cdn_host")]
    host: String,
    #[serde(default = "defaults::default_cdn_path_delimiter")]
    path_delimiter: String,
    #[serde(default = "defaults::default_thumbnail_width")]
    thumbnail_width: u32,
    #[serde(default = "defaults::default_page_width")]
    page_width: u32,
    #[serde(default = "defaults::default_raster_extension")]
    raster_extension: String,
}

impl Default for CdnConfig {
    fn default() -> Self {
        CdnConfig {
            host: defaults::default_cdn_host(),
            path_delimiter: defaults::default_cdn_path_delimiter(),
            thumbnail_width: defaults::default_thumbnail_width(),
            page_width: defaults::default_page_width(),
            raster_extension: defaults::default_raster_extension(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ViewerConfig {
    #[serde(default = "defaults::default_external_viewer_endpoint")]
    external_viewer_endpoint: String,
    #[serde(default = "defaults::default_native_frame_fragment")]
    native_frame_fragment: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            external_viewer_endpoint: defaults::default_external_viewer_endpoint(),
            native_frame_fragment: defaults::default_native_frame_fragment(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct EscalationConfig {
    #[serde(default = "defaults::default_escalation_delay_ms")]
    delay_ms: u64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        EscalationConfig {
            delay_ms: defaults::default_escalation_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_library_key")]
    library_key: String,
    #[serde(default = "defaults::default_active_key")]
    active_key: String,
    #[serde(default = "defaults::default_title_prefix")]
    default_title_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            library_key: defaults::default_library_key(),
            active_key: defaults::default_active_key(),
            default_title_prefix: defaults::default_title_prefix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
