use chrono::{DateTime, Utc};
use common::FileCategory;
use serde::{Deserialize, Serialize};

/// Metadata record for an uploaded object, as stored in the `files`
/// collection. The bytes themselves live in the object store under
/// `storage_key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub owner_id: String,
    /// Generated collision-resistant name within the category prefix.
    pub stored_name: String,
    /// Full object-store key (`{category prefix}/{stored name}`).
    pub storage_key: String,
    pub original_name: String,
    pub size: u64,
    pub mime_type: String,
    pub category: FileCategory,
    /// Derived from the category; public files are readable by anyone.
    pub is_public: bool,
    /// SHA-256 of the content, hex-encoded.
    pub checksum: String,
    pub project_id: Option<String>,
    pub proposal_id: Option<String>,
    pub message_id: Option<String>,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub uploaded_at: DateTime<Utc>,
}

/// An upload request from the presentation layer.
#[derive(Debug, Clone)]
pub struct UploadFileInput {
    pub data: Vec<u8>,
    pub original_name: String,
    /// MIME type reported by the picker; guessed from the name if absent.
    pub content_type: Option<String>,
    pub category: FileCategory,
    pub project_id: Option<String>,
    pub proposal_id: Option<String>,
    pub message_id: Option<String>,
}

impl UploadFileInput {
    pub fn new(data: Vec<u8>, original_name: impl Into<String>, category: FileCategory) -> Self {
        Self {
            data,
            original_name: original_name.into(),
            content_type: None,
            category,
            project_id: None,
            proposal_id: None,
            message_id: None,
        }
    }
}

/// Partial update to a file record. A category change recomputes the
/// public flag; the stored object keeps its original key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePatch {
    pub original_name: Option<String>,
    pub category: Option<FileCategory>,
}

/// Per-item outcome of a best-effort batch deletion.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteOutcome {
    pub deleted: Vec<String>,
    pub failed: Vec<BatchDeleteFailure>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteFailure {
    pub id: String,
    pub error: String,
}
