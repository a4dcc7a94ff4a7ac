use serde::Serialize;
use ts_rs::TS;

/// Rendering strategy currently selected for a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PreviewMode {
    /// Embedded renderer that parses and paints the document itself.
    Primary,
    /// Short "optimizing" hold between a primary failure and the fallback.
    Escalating,
    /// One CDN raster per page.
    ImageStream,
    /// Browser-native viewer in an inline frame.
    NativeFrame,
    /// Third-party hosted viewer. Terminal for automatic escalation.
    ExternalViewer,
}

impl PreviewMode {
    pub fn label(self) -> &'static str {
        match self {
            PreviewMode::Primary => "primary",
            PreviewMode::Escalating => "escalating",
            PreviewMode::ImageStream => "image_stream",
            PreviewMode::NativeFrame => "native_frame",
            PreviewMode::ExternalViewer => "external_viewer",
        }
    }
}

impl std::fmt::Display for PreviewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ImagePage {
    /// 1-based page number for labels.
    pub number: usize,
    pub url: String,
}

/// What the presentation layer must mount. Exactly one at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "mode", rename_all = "snake_case")]
#[ts(export)]
pub enum StrategyView {
    Embedded { url: String, page_count: usize },
    Optimizing,
    ImageStream { pages: Vec<ImagePage> },
    NativeFrame { url: String },
    ExternalViewer { url: String },
}
