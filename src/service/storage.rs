//! Local file storage for case documents and chat attachments
//!
//! Files are content-addressed: the stored name is the SHA-256 of the bytes
//! plus the uploaded extension, so identical uploads share one file.

use std::path::{Path, PathBuf};

use base64::Engine;
use chrono::{Datelike, Utc};
use sha2::{Digest, Sha256};

const CASE_DOCUMENTS_DIR: &str = "case_documents";
const CHAT_ATTACHMENTS_DIR: &str = "chat_attachments";
const MAX_FILE_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    #[error("File content is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("File is empty")]
    Empty,

    #[error("File exceeds the 20 MiB upload limit")]
    TooLarge,

    #[error("Invalid file name")]
    InvalidName,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata of a stored file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Path relative to the upload root
    pub relative_path: String,
    pub content_hash: String,
    pub size_bytes: i64,
    pub file_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    CaseDocument,
    ChatAttachment,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Decode a base64 upload and store it
    pub async fn store_base64(
        &self,
        kind: FileKind,
        file_name: &str,
        content_base64: &str,
    ) -> Result<StoredFile, FileStoreError> {
        let bytes = base64::engine::general_purpose::STANDARD.decode(content_base64.trim())?;
        self.store(kind, file_name, &bytes).await
    }

    pub async fn store(
        &self,
        kind: FileKind,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, FileStoreError> {
        let file_name = sanitize_file_name(file_name).ok_or(FileStoreError::InvalidName)?;
        if bytes.is_empty() {
            return Err(FileStoreError::Empty);
        }
        if bytes.len() > MAX_FILE_BYTES {
            return Err(FileStoreError::TooLarge);
        }

        let content_hash = content_hash(bytes);
        let stored_name = match Path::new(&file_name).extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{}", content_hash, ext.to_lowercase()),
            None => content_hash.clone(),
        };

        let directory = match kind {
            FileKind::CaseDocument => {
                let now = Utc::now();
                format!("{}/{:04}/{:02}", CASE_DOCUMENTS_DIR, now.year(), now.month())
            }
            FileKind::ChatAttachment => CHAT_ATTACHMENTS_DIR.to_string(),
        };
        let relative_path = format!("{}/{}", directory, stored_name);

        let absolute_dir = self.root.join(&directory);
        tokio::fs::create_dir_all(&absolute_dir).await?;

        let absolute_path = absolute_dir.join(&stored_name);
        if tokio::fs::try_exists(&absolute_path).await? {
            tracing::debug!(path = %relative_path, "File already stored");
        } else {
            tokio::fs::write(&absolute_path, bytes).await?;
            tracing::debug!(path = %relative_path, size = bytes.len(), "Stored file");
        }

        Ok(StoredFile {
            relative_path,
            content_hash,
            size_bytes: bytes.len() as i64,
            file_name,
        })
    }
}

/// Compute SHA-256 hash of content
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Keep only the final path component of a client-supplied name
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let name = name.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("report.pdf").as_deref(), Some("report.pdf"));
        assert_eq!(
            sanitize_file_name("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(sanitize_file_name("C:\\evidence\\photo.JPG").as_deref(), Some("photo.JPG"));
        assert_eq!(sanitize_file_name(" .. "), None);
        assert_eq!(sanitize_file_name("dir/"), None);
    }

    #[tokio::test]
    async fn test_store_is_content_addressed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let first = store
            .store(FileKind::ChatAttachment, "Voice.MP3", b"audio bytes")
            .await
            .unwrap();
        let second = store
            .store(FileKind::ChatAttachment, "copy.mp3", b"audio bytes")
            .await
            .unwrap();

        assert_eq!(first.content_hash, content_hash(b"audio bytes"));
        assert_eq!(first.relative_path, second.relative_path);
        assert!(first.relative_path.starts_with("chat_attachments/"));
        assert!(first.relative_path.ends_with(".mp3"));
        assert_eq!(first.size_bytes, 11);

        let on_disk = std::fs::read(dir.path().join(&first.relative_path)).unwrap();
        assert_eq!(on_disk, b"audio bytes");
    }

    #[tokio::test]
    async fn test_case_documents_are_dated() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.4");

        let stored = store
            .store_base64(FileKind::CaseDocument, "fir.pdf", &encoded)
            .await
            .unwrap();

        let now = Utc::now();
        let prefix = format!("case_documents/{:04}/{:02}/", now.year(), now.month());
        assert!(stored.relative_path.starts_with(&prefix));
        assert_eq!(stored.file_name, "fir.pdf");
    }

    #[tokio::test]
    async fn test_rejects_bad_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert!(matches!(
            store.store_base64(FileKind::CaseDocument, "a.txt", "not base64!").await,
            Err(FileStoreError::InvalidEncoding(_))
        ));
        assert!(matches!(
            store.store(FileKind::CaseDocument, "a.txt", b"").await,
            Err(FileStoreError::Empty)
        ));
        assert!(matches!(
            store.store(FileKind::CaseDocument, "", b"x").await,
            Err(FileStoreError::InvalidName)
        ));
    }
}
