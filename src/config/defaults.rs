pub(crate) fn default_cdn_host() -> String {
    "res.cloudinary.com".to_string()
}

pub(crate) fn default_cdn_path_delimiter() -> String {
    "/upload/".to_string()
}

pub(crate) fn default_thumbnail_width() -> u32 {
    1200
}

pub(crate) fn default_page_width() -> u32 {
    1600
}

pub(crate) fn default_raster_extension() -> String {
    "jpg".to_string()
}

pub(crate) fn default_external_viewer_endpoint() -> String {
    "https://docs.google.com/gview".to_string()
}

pub(crate) fn default_native_frame_fragment() -> String {
    "toolbar=0&navpanes=0&scrollbar=1".to_string()
}

pub(crate) fn default_escalation_delay_ms() -> u64 {
    1500
}

pub(crate) fn default_library_key() -> String {
    "admin_resumes".to_string()
}

pub(crate) fn default_active_key() -> String {
    "active_resume_url".to_string()
}

pub(crate) fn default_title_prefix() -> String {
    "Resume".to_string()
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Debug
}
