use bytes::Bytes;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File metadata as described by the file service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    #[serde(rename = "uuId")]
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub file_type: String,
    pub size: u64,
    pub creation_time: NaiveDateTime,
    pub last_modified_time: NaiveDateTime,
    pub file_url: String,
    pub preferred_file_name: String,
}

impl DocumentRecord {
    pub fn is_pdf(&self) -> bool {
        self.file_type.eq_ignore_ascii_case("pdf")
    }
}

/// One page of a list call. `total_count` is the server-side total across
/// all pages, not the length of `items`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPage {
    pub items: Vec<DocumentRecord>,
    pub total_count: u64,
}

/// Editable subset of a record's metadata. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

/// File content selected by the user for upload or replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl FilePayload {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, sent as `application/octet-stream`.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());

        Ok(Self::new(name, "application/octet-stream", bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}
