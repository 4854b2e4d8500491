//! File storage for uploads attached to form submissions.

use std::path::PathBuf;

use chrono::Utc;

use crate::{AppError, AppResult, IdGenerator};

/// Metadata of a file written to a storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Storage key (path relative to the backend root).
    pub key: String,
    /// File size in bytes.
    pub size: u64,
    /// MD5 hash of the file.
    pub md5: String,
}

impl StoredFile {
    fn describe(key: &str, data: &[u8]) -> Self {
        Self {
            key: key.to_string(),
            size: data.len() as u64,
            md5: format!("{:x}", md5::compute(data)),
        }
    }
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write a file under `key`.
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<StoredFile>;
}

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        if key.split('/').any(|part| part.is_empty() || part == "..") {
            return Err(AppError::Storage(format!("Invalid storage key: {key}")));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<StoredFile> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        tracing::debug!(key = %key, size = data.len(), "Stored uploaded file");

        Ok(StoredFile::describe(key, data))
    }
}

/// Storage backend that discards everything, for tests and dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpStorage;

#[async_trait::async_trait]
impl StorageBackend for NoOpStorage {
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<StoredFile> {
        Ok(StoredFile::describe(key, data))
    }
}

/// Extract the lower-cased extension of a file name.
///
/// Returns `None` when the name has no dot or ends with one.
#[must_use]
pub fn file_extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Generate a unique storage key for an uploaded file.
///
/// Keys look like `form_submissions/20250101_120000_0a1b2c3d.pdf`; the original
/// name only contributes its extension.
#[must_use]
pub fn generate_storage_key(category: &str, original_name: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let suffix = IdGenerator::new().generate_short();

    let extension = file_extension(original_name)
        .filter(|ext| ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string());

    format!("{category}/{timestamp}_{suffix}.{extension}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_storage_key() {
        let key = generate_storage_key("form_submissions", "Resume.PDF");
        assert!(key.starts_with("form_submissions/"));
        assert!(key.ends_with(".pdf"));
        assert!(!key.contains("Resume"));
    }

    #[test]
    fn test_generate_storage_key_no_extension() {
        let key = generate_storage_key("form_submissions", "file");
        assert!(key.ends_with(".bin"));
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension("trailing."), None);
    }

    #[tokio::test]
    async fn test_local_storage_writes_file() {
        let root =
            std::env::temp_dir().join(format!("collexo-test-{}", IdGenerator::new().generate()));
        let storage = LocalStorage::new(root.clone());

        let stored = storage.save("form_submissions/a.txt", b"hello").await.unwrap();
        assert_eq!(stored.key, "form_submissions/a.txt");
        assert_eq!(stored.size, 5);
        assert_eq!(stored.md5, "5d41402abc4b2a76b9719d911017c592");

        let written = tokio::fs::read(root.join("form_submissions/a.txt")).await.unwrap();
        assert_eq!(written, b"hello");

        let _ = tokio::fs::remove_dir_all(root).await;
    }

    #[tokio::test]
    async fn test_local_storage_rejects_traversal() {
        let storage = LocalStorage::new(std::env::temp_dir());
        let result = storage.save("../escape.txt", b"x").await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }

    #[tokio::test]
    async fn test_noop_storage_describes_without_writing() {
        let stored = NoOpStorage.save("form_submissions/b.pdf", b"%PDF").await.unwrap();
        assert_eq!(stored.size, 4);
        assert_eq!(stored.md5.len(), 32);
    }
}
