use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ActorId;
use crate::constants::DEFAULT_CONTENT_TYPE;

/// A file offered for upload. Lives for one upload attempt and is owned by the caller.
///
/// The size checked by the upload guard and recorded in metadata is always the
/// payload length; there is no separately declared size to disagree with it.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    /// Declared content type. Untrusted; never used to accept or reject a file.
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, content_type: Option<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type,
            data: data.into(),
        }
    }

    /// Payload length in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Read a file from disk. The content type is declared from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();
        let content_type = content_type_for_name(&name).map(String::from);

        Ok(Self::new(name, content_type, data))
    }

    /// Declared content type, or `application/octet-stream` when absent or blank.
    pub fn effective_content_type(&self) -> &str {
        match self.content_type.as_deref().map(str::trim) {
            Some(ct) if !ct.is_empty() => ct,
            _ => DEFAULT_CONTENT_TYPE,
        }
    }
}

/// Map a file name's extension to a content type declaration.
pub fn content_type_for_name(name: &str) -> Option<&'static str> {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())?
        .to_lowercase();

    let content_type = match extension.as_str() {
        // Images
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        // Video / audio
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        // Documents
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "zip" => "application/zip",
        "tar" => "application/x-tar",
        "gz" => "application/gzip",
        _ => return None,
    };

    Some(content_type)
}

/// Metadata row written after a successful object write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFileMetadata {
    pub name: String,
    pub size: i64,
    #[serde(rename = "type")]
    pub content_type: String,
    pub storage_path: String,
    pub user_id: ActorId,
}

/// Metadata row as stored, with store-assigned identity and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub id: Uuid,
    pub name: String,
    pub size: i64,
    #[serde(rename = "type")]
    pub content_type: String,
    pub storage_path: String,
    pub user_id: ActorId,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn effective_content_type_defaults_when_blank() {
        let file = CandidateFile::new("a.bin", None, vec![1u8]);
        assert_eq!(file.effective_content_type(), "application/octet-stream");

        let file = CandidateFile::new("a.bin", Some("  ".to_string()), vec![1u8]);
        assert_eq!(file.effective_content_type(), "application/octet-stream");

        let file = CandidateFile::new("a.pdf", Some("application/pdf".to_string()), vec![1u8]);
        assert_eq!(file.effective_content_type(), "application/pdf");
    }

    #[test]
    fn content_type_lookup_is_case_insensitive() {
        assert_eq!(content_type_for_name("Report.PDF"), Some("application/pdf"));
        assert_eq!(content_type_for_name("noext"), None);
        assert_eq!(content_type_for_name("weird.xyz"), None);
    }

    #[tokio::test]
    async fn from_path_reads_payload_and_name() {
        let mut tmp = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        tmp.write_all(b"hello").unwrap();

        let file = CandidateFile::from_path(tmp.path()).await.unwrap();
        assert_eq!(file.size(), 5);
        assert_eq!(file.data.as_ref(), b"hello");
        assert!(file.name.ends_with(".txt"));
        assert_eq!(file.content_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn size_tracks_payload() {
        let mut file = CandidateFile::new("a.bin", None, vec![0u8; 10]);
        assert_eq!(file.size(), 10);

        file.data = Bytes::from(vec![0u8; 4096]);
        assert_eq!(file.size(), 4096);
    }

    #[test]
    fn metadata_uses_type_column() {
        let row = NewFileMetadata {
            name: "resume.pdf".to_string(),
            size: 1024,
            content_type: "application/pdf".to_string(),
            storage_path: "u1/resume.pdf".to_string(),
            user_id: ActorId::new("u1"),
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["type"], "application/pdf");
        assert!(value.get("content_type").is_none());
    }
}
