//! Persisted collection of known documents plus one "active" pointer.
//!
//! Records are kept most-recent-first. The active pointer is a bare URL, not
//! a record reference: it may dangle after the record that carried it goes
//! away, and `active_record` then resolves to nothing.

mod format;
mod record;
mod storage;

pub use format::{format_bytes, format_date};
pub use record::{DocumentId, DocumentRecord, UploadResult};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, StorageWrite};

use crate::cdn::CdnTransformer;
use crate::config::PreviewConfig;
use crate::preview::{Clock, PreviewSeed};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use ts_rs::TS;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("document not found: {0}")]
    NotFound(DocumentId),
    #[error("document url is empty")]
    EmptyUrl,
    #[error("failed to encode library state: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("failed to persist library state: {0}")]
    Persistence(#[source] StorageError),
}

/// Card preview for a library entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum Thumbnail {
    /// First page as a CDN raster.
    Raster { url: String },
    /// Hosted viewer frame for assets without raster support.
    Frame { url: String },
}

pub struct Library<S: KeyValueStore> {
    storage: S,
    records: Vec<DocumentRecord>,
    active_url: Option<String>,
    library_key: String,
    active_key: String,
    title_prefix: String,
    cdn: CdnTransformer,
    clock: Arc<dyn Clock>,
}

impl<S: KeyValueStore> Library<S> {
    /// Open the library over `storage`, loading whatever state it holds.
    pub fn open(storage: S, config: &PreviewConfig, clock: Arc<dyn Clock>) -> Self {
        let mut library = Self {
            storage,
            records: Vec::new(),
            active_url: None,
            library_key: config.library_key.clone(),
            active_key: config.active_key.clone(),
            title_prefix: config.default_title_prefix.clone(),
            cdn: CdnTransformer::new(config),
            clock,
        };
        library.reload();
        library
    }

    /// Re-read persisted state. Unreadable data loads as empty.
    pub fn reload(&mut self) {
        self.records = self.load_records();
        self.active_url = self.load_active_url();
        info!(
            records = self.records.len(),
            active = self.active_url.as_deref().unwrap_or(""),
            "Loaded document library"
        );
    }

    pub fn records(&self) -> &[DocumentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &DocumentId) -> Option<&DocumentRecord> {
        self.records.iter().find(|record| &record.id == id)
    }

    pub fn active_url(&self) -> Option<&str> {
        self.active_url.as_deref()
    }

    /// First record whose URL equals the active pointer.
    pub fn active_record(&self) -> Option<&DocumentRecord> {
        let active = self.active_url.as_deref()?;
        self.records
            .iter()
            .find(|record| record.canonical_url == active)
    }

    pub fn cdn(&self) -> &CdnTransformer {
        &self.cdn
    }

    pub fn add(
        &mut self,
        title: &str,
        url: &str,
        byte_size: Option<u64>,
        page_count: Option<usize>,
    ) -> Result<DocumentRecord, LibraryError> {
        let url = normalized_url(url)?;
        let record = DocumentRecord {
            id: self.fresh_id(),
            title: self.resolve_title(Some(title)),
            canonical_url: url.clone(),
            byte_size,
            page_count: page_count.unwrap_or(1).max(1),
            created_or_updated_at: self.clock.wall_now(),
        };

        let mut records = Vec::with_capacity(self.records.len() + 1);
        records.push(record.clone());
        records.extend(self.records.iter().cloned());
        self.commit(records, Some(url))?;
        info!(
            id = %record.id,
            title = %record.title,
            url = %record.canonical_url,
            pages = record.page_count,
            "Added document"
        );
        Ok(record)
    }

    pub fn add_upload(&mut self, upload: UploadResult) -> Result<DocumentRecord, LibraryError> {
        let title = self.resolve_title(upload.title.as_deref());
        self.add(&title, &upload.url, upload.byte_size, upload.page_count)
    }

    /// Swap the asset behind an existing id. The new URL becomes active.
    pub fn replace(
        &mut self,
        id: &DocumentId,
        title: &str,
        url: &str,
        byte_size: Option<u64>,
        page_count: Option<usize>,
    ) -> Result<DocumentRecord, LibraryError> {
        let idx = self.position(id)?;
        let url = normalized_url(url)?;
        let mut records = self.records.clone();
        let record = &mut records[idx];
        record.title = self.resolve_title(Some(title));
        record.canonical_url = url.clone();
        record.byte_size = byte_size;
        record.page_count = page_count.unwrap_or(1).max(1);
        record.created_or_updated_at = self.clock.wall_now();
        let updated = record.clone();

        self.commit(records, Some(url))?;
        info!(
            id = %updated.id,
            url = %updated.canonical_url,
            pages = updated.page_count,
            "Replaced document"
        );
        Ok(updated)
    }

    pub fn replace_upload(
        &mut self,
        id: &DocumentId,
        upload: UploadResult,
    ) -> Result<DocumentRecord, LibraryError> {
        let title = self.resolve_title(upload.title.as_deref());
        self.replace(id, &title, &upload.url, upload.byte_size, upload.page_count)
    }

    /// Change only the display label. The active pointer is left alone.
    pub fn rename(&mut self, id: &DocumentId, title: &str) -> Result<DocumentRecord, LibraryError> {
        let idx = self.position(id)?;
        let mut records = self.records.clone();
        records[idx].title = self.resolve_title(Some(title));
        let updated = records[idx].clone();
        let active = self.active_url.clone();
        self.commit(records, active)?;
        debug!(id = %updated.id, title = %updated.title, "Renamed document");
        Ok(updated)
    }

    /// Remove a record. Clears the active pointer when it held this record's
    /// URL; another record is not selected in its place.
    pub fn remove(&mut self, id: &DocumentId) -> Result<Option<DocumentRecord>, LibraryError> {
        let Some(idx) = self.records.iter().position(|record| &record.id == id) else {
            debug!(%id, "Remove requested for unknown document");
            return Ok(None);
        };
        let mut records = self.records.clone();
        let removed = records.remove(idx);
        let active = match self.active_url.as_deref() {
            Some(active) if active == removed.canonical_url => None,
            _ => self.active_url.clone(),
        };
        let cleared = active.is_none() && self.active_url.is_some();
        self.commit(records, active)?;
        info!(%id, cleared_active = cleared, "Removed document");
        Ok(Some(removed))
    }

    pub fn set_active(&mut self, url: &str) -> Result<(), LibraryError> {
        let url = normalized_url(url)?;
        let records = self.records.clone();
        self.commit(records, Some(url))?;
        debug!(url = self.active_url.as_deref().unwrap_or(""), "Set active document");
        Ok(())
    }

    pub fn clear_active(&mut self) -> Result<(), LibraryError> {
        let records = self.records.clone();
        self.commit(records, None)?;
        debug!("Cleared active document");
        Ok(())
    }

    /// `(url, page_count)` used to open a preview; unknown URLs get one page.
    pub fn preview_seed(&self, url: &str) -> PreviewSeed {
        let url = url.trim();
        let page_count = self
            .records
            .iter()
            .find(|record| record.canonical_url == url)
            .map_or(1, |record| record.page_count);
        PreviewSeed {
            url: url.to_string(),
            page_count,
        }
    }

    pub fn thumbnail(&self, record: &DocumentRecord) -> Thumbnail {
        match self.cdn.single_page_preview_url(&record.canonical_url) {
            Some(url) => Thumbnail::Raster { url },
            None => Thumbnail::Frame {
                url: self.cdn.external_viewer_url(&record.canonical_url),
            },
        }
    }

    fn position(&self, id: &DocumentId) -> Result<usize, LibraryError> {
        self.records
            .iter()
            .position(|record| &record.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.clone()))
    }

    fn fresh_id(&self) -> DocumentId {
        loop {
            let id = DocumentId::generate();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    fn resolve_title(&self, title: Option<&str>) -> String {
        match title.map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!(
                "{} {}",
                self.title_prefix,
                format_date(&self.clock.wall_now())
            ),
        }
    }

    /// Write collection and pointer as one batch, then adopt them.
    fn commit(
        &mut self,
        records: Vec<DocumentRecord>,
        active_url: Option<String>,
    ) -> Result<(), LibraryError> {
        let encoded_records = serde_json::to_string(&records)?;
        let active_write = match active_url.as_deref() {
            Some(url) => StorageWrite::set(&self.active_key, serde_json::to_string(url)?),
            None => StorageWrite::remove(&self.active_key),
        };
        let writes = vec![
            StorageWrite::set(&self.library_key, encoded_records),
            active_write,
        ];
        if let Err(err) = self.storage.commit(writes) {
            warn!("Library state not persisted; keeping previous state: {err}");
            return Err(LibraryError::Persistence(err));
        }
        self.records = records;
        self.active_url = active_url;
        Ok(())
    }

    fn load_records(&self) -> Vec<DocumentRecord> {
        let raw = match self.storage.get(&self.library_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(key = %self.library_key, "Library state unreadable; starting empty: {err}");
                return Vec::new();
            }
        };
        let entries = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(serde_json::Value::Array(entries)) => entries,
            Ok(_) => {
                warn!(key = %self.library_key, "Persisted library is not an array; starting empty");
                return Vec::new();
            }
            Err(err) => {
                warn!(key = %self.library_key, "Persisted library is malformed; starting empty: {err}");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(entries.len());
        for (idx, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<DocumentRecord>(entry) {
                Ok(record) if seen.insert(record.id.clone()) => records.push(record),
                Ok(record) => {
                    warn!(id = %record.id, idx, "Skipping duplicate persisted document id");
                }
                Err(err) => {
                    warn!(idx, "Skipping malformed persisted document: {err}");
                }
            }
        }
        records
    }

    fn load_active_url(&self) -> Option<String> {
        let raw = match self.storage.get(&self.active_key) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(key = %self.active_key, "Active pointer unreadable; ignoring: {err}");
                return None;
            }
        };
        // Older state stored the bare URL rather than a JSON string.
        let url = serde_json::from_str::<String>(&raw).unwrap_or(raw);
        let url = url.trim();
        if url.is_empty() {
            None
        } else {
            Some(url.to_string())
        }
    }
}

fn normalized_url(url: &str) -> Result<String, LibraryError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(LibraryError::EmptyUrl);
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::ManualClock;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    const R1_URL: &str = "https://cdn.example.com/upload/abc.pdf";

    fn config() -> PreviewConfig {
        PreviewConfig {
            cdn_host: "cdn.example.com".to_string(),
            ..PreviewConfig::default()
        }
    }

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap())
    }

    fn library_with(storage: MemoryStore) -> (Library<MemoryStore>, ManualClock) {
        let clock = clock();
        let library = Library::open(storage, &config(), Arc::new(clock.clone()));
        (library, clock)
    }

    fn library() -> (Library<MemoryStore>, ManualClock) {
        library_with(MemoryStore::new())
    }

    /// Store whose writes can be switched off.
    struct FlakyStore {
        inner: MemoryStore,
        fail: bool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn commit(&mut self, writes: Vec<StorageWrite>) -> Result<(), StorageError> {
            if self.fail {
                return Err(StorageError::Rejected("quota exceeded".to_string()));
            }
            self.inner.commit(writes)
        }
    }

    #[test]
    fn add_prepends_assigns_unique_ids_and_activates() {
        let (mut library, _) = library();
        let first = library
            .add("R1", R1_URL, Some(2048), Some(3))
            .expect("add first");
        let second = library
            .add("R2", "https://files.example.org/b.pdf", None, None)
            .expect("add second");

        assert_ne!(first.id, second.id);
        assert_eq!(library.records()[0].id, second.id);
        assert_eq!(library.records()[1].id, first.id);
        assert_eq!(second.page_count, 1);
        assert_eq!(library.active_url(), Some("https://files.example.org/b.pdf"));
        assert_eq!(library.active_record().map(|r| &r.id), Some(&second.id));
    }

    #[test]
    fn scenario_add_then_derive_page_raster() {
        let (mut library, _) = library();
        library.add("R1", R1_URL, None, Some(3)).expect("add");
        assert_eq!(library.active_url(), Some(R1_URL));

        let active = library.active_record().expect("active record");
        assert_eq!(active.page_count, 3);
        let raster = library
            .cdn()
            .page_raster_url(&active.canonical_url, 1)
            .expect("cdn asset");
        assert!(raster.contains("pg_2"));
        assert!(raster.ends_with(".jpg"));
        assert!(!raster.ends_with(".pdf"));
    }

    #[test]
    fn replace_requires_existing_id_and_leaves_state_untouched() {
        let (mut library, _) = library();
        library.add("R1", R1_URL, None, Some(3)).expect("add");
        let before = library.records().to_vec();

        let err = library
            .replace(&DocumentId::from("missing"), "X", "https://x/y.pdf", None, None)
            .expect_err("unknown id");
        assert!(matches!(err, LibraryError::NotFound(_)));
        assert_eq!(library.records(), before.as_slice());
        assert_eq!(library.active_url(), Some(R1_URL));
    }

    #[test]
    fn replace_overwrites_fields_refreshes_timestamp_and_activates() {
        let (mut library, clock) = library();
        let original = library.add("R1", R1_URL, Some(10), Some(3)).expect("add");
        library
            .add("R2", "https://files.example.org/b.pdf", None, None)
            .expect("add");
        clock.advance(Duration::from_secs(3600));

        let replaced = library
            .replace(
                &original.id,
                "R1 v2",
                "https://cdn.example.com/upload/abc-v2.pdf",
                None,
                Some(4),
            )
            .expect("replace");
        assert_eq!(replaced.id, original.id);
        assert_eq!(replaced.title, "R1 v2");
        assert_eq!(replaced.byte_size, None);
        assert_eq!(replaced.page_count, 4);
        assert!(replaced.created_or_updated_at > original.created_or_updated_at);
        assert_eq!(
            library.active_url(),
            Some("https://cdn.example.com/upload/abc-v2.pdf")
        );
        assert_eq!(library.records()[1], replaced);
    }

    #[test]
    fn removing_active_record_clears_pointer_without_reselecting() {
        let (mut library, _) = library();
        library
            .add("R1", "https://files.example.org/a.pdf", None, None)
            .expect("add");
        let active = library.add("R2", R1_URL, None, None).expect("add");

        let removed = library.remove(&active.id).expect("remove");
        assert_eq!(removed.map(|r| r.id), Some(active.id));
        assert_eq!(library.active_url(), None);
        assert!(library.active_record().is_none());
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn removing_inactive_record_keeps_pointer() {
        let (mut library, _) = library();
        let inactive = library
            .add("R1", "https://files.example.org/a.pdf", None, None)
            .expect("add");
        library.add("R2", R1_URL, None, None).expect("add");
        library.remove(&inactive.id).expect("remove");
        assert_eq!(library.active_url(), Some(R1_URL));
        assert_eq!(library.remove(&inactive.id).expect("second remove"), None);
    }

    #[test]
    fn active_pointer_may_dangle() {
        let (mut library, _) = library();
        library.add("R1", R1_URL, None, None).expect("add");
        library
            .set_active("https://elsewhere.example.net/x.pdf")
            .expect("set active");
        assert_eq!(library.active_url(), Some("https://elsewhere.example.net/x.pdf"));
        assert!(library.active_record().is_none());

        library.clear_active().expect("clear");
        assert_eq!(library.active_url(), None);
    }

    #[test]
    fn rename_keeps_url_and_active_pointer() {
        let (mut library, _) = library();
        let record = library.add("R1", R1_URL, None, None).expect("add");
        library.clear_active().expect("clear");
        let renamed = library.rename(&record.id, "  Curriculum  ").expect("rename");
        assert_eq!(renamed.title, "Curriculum");
        assert_eq!(renamed.canonical_url, R1_URL);
        assert_eq!(library.active_url(), None);
        assert!(matches!(
            library.rename(&DocumentId::from("nope"), "x"),
            Err(LibraryError::NotFound(_))
        ));
    }

    #[test]
    fn upload_defaults_title_and_page_count() {
        let (mut library, _) = library();
        let record = library
            .add_upload(UploadResult {
                url: R1_URL.to_string(),
                ..UploadResult::default()
            })
            .expect("add upload");
        assert_eq!(record.title, "Resume 2026-10-19");
        assert_eq!(record.page_count, 1);

        let replaced = library
            .replace_upload(
                &record.id,
                UploadResult {
                    url: "https://cdn.example.com/upload/new.pdf".to_string(),
                    byte_size: Some(99),
                    page_count: Some(2),
                    title: Some("cv-final".to_string()),
                },
            )
            .expect("replace upload");
        assert_eq!(replaced.title, "cv-final");
        assert_eq!(replaced.byte_size, Some(99));
    }

    #[test]
    fn empty_url_is_rejected() {
        let (mut library, _) = library();
        assert!(matches!(
            library.add("R1", "   ", None, None),
            Err(LibraryError::EmptyUrl)
        ));
        assert!(library.is_empty());
    }

    #[test]
    fn state_round_trips_through_storage() {
        let (mut library, _) = library();
        library.add("R1", R1_URL, Some(1), Some(3)).expect("add");
        library
            .add("R2", "https://files.example.org/b.pdf", None, Some(2))
            .expect("add");
        library
            .add("R3", "https://files.example.org/c.pdf", Some(7), None)
            .expect("add");
        library.set_active(R1_URL).expect("set active");

        let records = library.records().to_vec();
        let storage = library.storage.clone();
        let (reloaded, _) = library_with(storage);
        assert_eq!(reloaded.records(), records.as_slice());
        assert_eq!(reloaded.active_url(), Some(R1_URL));
    }

    #[test]
    fn file_backed_library_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("library.json");
        let clock = clock();
        let mut library = Library::open(FileStore::new(&path), &config(), Arc::new(clock.clone()));
        let record = library.add("R1", R1_URL, None, Some(3)).expect("add");

        let reopened = Library::open(FileStore::new(&path), &config(), Arc::new(clock));
        assert_eq!(reopened.records(), &[record]);
        assert_eq!(reopened.active_url(), Some(R1_URL));
    }

    #[test]
    fn malformed_or_non_array_state_loads_empty() {
        for raw in ["{not json", r#"{"id":"x"}"#, "42"] {
            let mut storage = MemoryStore::new();
            storage.set("admin_resumes", raw).expect("seed");
            storage.set("active_resume_url", R1_URL).expect("seed");
            let (library, _) = library_with(storage);
            assert!(library.is_empty(), "raw state {raw:?} should load empty");
            assert_eq!(library.active_url(), Some(R1_URL));
        }
    }

    #[test]
    fn legacy_state_loads_and_skips_bad_entries() {
        let mut storage = MemoryStore::new();
        storage
            .set(
                "admin_resumes",
                r#"[
                    {"id":"1","title":"A","url":"https://x/a.pdf","uploadedAt":"2025-05-01T10:00:00.000Z","pages":2,"size":100},
                    {"id":"2","title":"B"},
                    {"id":"1","title":"dup","url":"https://x/dup.pdf","uploadedAt":"2025-05-01T10:00:00.000Z"},
                    {"id":"3","title":"C","url":"https://x/c.pdf","uploadedAt":"2025-05-02T10:00:00Z"}
                ]"#,
            )
            .expect("seed");
        storage.set("active_resume_url", "").expect("seed");
        let (library, _) = library_with(storage);
        let ids: Vec<&str> = library.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(library.records()[1].page_count, 1);
        assert_eq!(library.active_url(), None);
    }

    #[test]
    fn failed_write_leaves_memory_state_unchanged() {
        let clock = clock();
        let mut library = Library::open(
            FlakyStore {
                inner: MemoryStore::new(),
                fail: false,
            },
            &config(),
            Arc::new(clock),
        );
        let record = library.add("R1", R1_URL, None, None).expect("add");
        library.storage.fail = true;

        assert!(matches!(
            library.remove(&record.id),
            Err(LibraryError::Persistence(_))
        ));
        assert_eq!(library.len(), 1);
        assert_eq!(library.active_url(), Some(R1_URL));

        library.storage.fail = false;
        library.reload();
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn preview_seed_and_thumbnail_follow_records() {
        let (mut library, _) = library();
        let cdn_record = library.add("R1", R1_URL, None, Some(3)).expect("add");
        let plain = library
            .add("R2", "https://files.example.org/b.pdf", None, None)
            .expect("add");

        assert_eq!(
            library.preview_seed(R1_URL),
            PreviewSeed {
                url: R1_URL.to_string(),
                page_count: 3
            }
        );
        assert_eq!(library.preview_seed("https://unknown/x.pdf").page_count, 1);

        assert!(matches!(
            library.thumbnail(&cdn_record),
            Thumbnail::Raster { url } if url.contains("pg_1,") && url.contains("w_1200")
        ));
        assert!(matches!(
            library.thumbnail(&plain),
            Thumbnail::Frame { url } if url.starts_with("https://docs.google.com/gview?embedded=1&url=")
        ));
    }
}
