//! Resilient preview engine for remote PDF documents.
//!
//! - [`cdn`] rewrites a canonical asset URL into raster and viewer URLs.
//! - [`preview`] escalates through rendering strategies when one fails.
//! - [`library`] keeps the persisted list of documents and the active pointer.
//! - [`session`] opens one library document at a time for preview.

pub mod cancellation;
pub mod cdn;
pub mod config;
pub mod library;
pub mod logging;
pub mod preview;
pub mod session;

pub use cdn::CdnTransformer;
pub use config::{LogLevel, PreviewConfig, load_config};
pub use library::{DocumentId, DocumentRecord, Library, LibraryError, UploadResult};
pub use preview::{PreviewController, PreviewEffect, PreviewEvent, PreviewMode, StrategyView};
pub use session::PreviewSession;
