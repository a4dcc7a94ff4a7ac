use super::format::{format_bytes, format_date};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque record identifier. Fresh ids are random v4 UUIDs; ids loaded from
/// older state are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One known document. Persisted with the upload tool's field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredRecord")]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub title: String,
    #[serde(rename = "url")]
    pub canonical_url: String,
    #[serde(rename = "size", skip_serializing_if = "Option::is_none")]
    pub byte_size: Option<u64>,
    #[serde(rename = "pages")]
    pub page_count: usize,
    #[serde(rename = "uploadedAt")]
    pub created_or_updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn size_label(&self) -> Option<String> {
        self.byte_size.map(format_bytes)
    }

    pub fn date_label(&self) -> String {
        format_date(&self.created_or_updated_at)
    }
}

/// Lenient read shape: missing or zero page counts become 1.
#[derive(Deserialize)]
struct StoredRecord {
    id: DocumentId,
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    pages: Option<usize>,
    #[serde(rename = "uploadedAt")]
    uploaded_at: DateTime<Utc>,
}

impl From<StoredRecord> for DocumentRecord {
    fn from(stored: StoredRecord) -> Self {
        DocumentRecord {
            id: stored.id,
            title: stored.title,
            canonical_url: stored.url,
            byte_size: stored.size,
            page_count: stored.pages.unwrap_or(1).max(1),
            created_or_updated_at: stored.uploaded_at,
        }
    }
}

/// What the upload provider reports for a finished upload.
///
/// Accepts both the engine's camelCase names and the provider's raw names
/// (`secure_url`, `bytes`, `pages`, `original_filename`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    #[serde(alias = "secure_url")]
    pub url: String,
    #[serde(default, alias = "bytes")]
    pub byte_size: Option<u64>,
    #[serde(default, alias = "pages")]
    pub page_count: Option<usize>,
    #[serde(default, alias = "original_filename")]
    pub title: Option<String>,
}
