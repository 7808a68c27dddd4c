//! On-disk storage for uploaded files.
//!
//! Files land in `<root>/<kind>/<uuid>.<ext>` and are referred to by the
//! relative name `<kind>/<uuid>.<ext>`. The original file name only
//! contributes its extension.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Profile photos, served publicly.
    Photo,
    /// Doctor application documents, admin download only.
    Document,
}

impl UploadKind {
    pub fn dir(&self) -> &'static str {
        match self {
            Self::Photo => "photos",
            Self::Document => "documents",
        }
    }

    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Photo => &["jpg", "jpeg", "png", "webp"],
            Self::Document => &["pdf", "jpg", "jpeg", "png"],
        }
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please choose a file to upload")]
    Empty,

    #[error("The file is too large (maximum {max_mib} MiB)")]
    TooLarge { max_mib: usize },

    #[error("Only {allowed} files are accepted")]
    ExtensionNotAllowed { allowed: String },

    #[error("The upload could not be read: {0}")]
    Malformed(String),

    #[error("invalid stored file name: {0}")]
    InvalidName(String),

    #[error("upload I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Errors caused by the submitted file rather than the server.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Empty
                | Self::TooLarge { .. }
                | Self::ExtensionNotAllowed { .. }
                | Self::Malformed(_)
        )
    }
}

/// Lowercased extension of `file_name` if `kind` accepts it.
pub fn accepted_extension(kind: UploadKind, file_name: &str) -> Result<String, UploadError> {
    let allowed = kind.allowed_extensions();
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| allowed.contains(&ext.as_str()))
        .ok_or_else(|| UploadError::ExtensionNotAllowed {
            allowed: allowed.join(", "),
        })
}

/// MIME type for a stored file, by extension.
pub fn content_type(stored: &str) -> &'static str {
    match Path::new(stored).extension().and_then(|ext| ext.to_str()) {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    /// Creates the per-kind directories.
    pub async fn init(&self) -> Result<(), UploadError> {
        for kind in [UploadKind::Photo, UploadKind::Document] {
            tokio::fs::create_dir_all(self.dir(kind)).await?;
        }
        Ok(())
    }

    pub fn dir(&self, kind: UploadKind) -> PathBuf {
        self.root.join(kind.dir())
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Validates and writes a file, returning its stored name.
    pub async fn save(
        &self,
        kind: UploadKind,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                max_mib: self.max_bytes.div_ceil(1024 * 1024),
            });
        }
        let ext = accepted_extension(kind, file_name)?;

        let stored = format!("{}/{}.{ext}", kind.dir(), Uuid::new_v4());
        tokio::fs::create_dir_all(self.dir(kind)).await?;
        tokio::fs::write(self.root.join(&stored), bytes).await?;

        tracing::debug!(stored = %stored, size = bytes.len(), "Upload saved");
        Ok(stored)
    }

    /// Reads a stored file back. Only names produced by [`Self::save`] resolve.
    pub async fn read(&self, stored: &str) -> Result<Vec<u8>, UploadError> {
        let path = self.resolve(stored)?;
        Ok(tokio::fs::read(path).await?)
    }

    /// Deletes a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, stored: &str) -> Result<(), UploadError> {
        let path = self.resolve(stored)?;
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!(stored = %stored, "Upload removed");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Removes a file nothing refers to anymore, logging instead of failing.
    pub async fn discard(&self, stored: &str) {
        if let Err(err) = self.remove(stored).await {
            tracing::warn!(error = %err, stored = %stored, "Failed to remove upload");
        }
    }

    fn resolve(&self, stored: &str) -> Result<PathBuf, UploadError> {
        let invalid = || UploadError::InvalidName(stored.to_string());
        let (dir, file) = stored.split_once('/').ok_or_else(invalid)?;
        if ![UploadKind::Photo.dir(), UploadKind::Document.dir()].contains(&dir)
            || file.contains(['/', '\\'])
        {
            return Err(invalid());
        }
        let (stem, _) = file.split_once('.').ok_or_else(invalid)?;
        Uuid::parse_str(stem).map_err(|_| invalid())?;
        Ok(self.root.join(dir).join(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> UploadStore {
        UploadStore::new(dir.path(), 16)
    }

    #[test]
    fn test_extension_whitelist_per_kind() {
        assert_eq!(
            accepted_extension(UploadKind::Photo, "me.JPG").unwrap(),
            "jpg"
        );
        assert!(accepted_extension(UploadKind::Photo, "cv.pdf").is_err());
        assert_eq!(
            accepted_extension(UploadKind::Document, "license.pdf").unwrap(),
            "pdf"
        );
        assert!(accepted_extension(UploadKind::Document, "script.exe").is_err());
        assert!(accepted_extension(UploadKind::Document, "noextension").is_err());
    }

    #[tokio::test]
    async fn test_save_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let stored = store
            .save(UploadKind::Document, "license.PDF", b"%PDF-1.4")
            .await
            .unwrap();
        assert!(stored.starts_with("documents/"));
        assert!(stored.ends_with(".pdf"));
        assert_eq!(content_type(&stored), "application/pdf");

        assert_eq!(store.read(&stored).await.unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_size_limit_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let too_big = store
            .save(UploadKind::Photo, "me.png", &[0u8; 17])
            .await
            .unwrap_err();
        assert!(matches!(too_big, UploadError::TooLarge { .. }));
        assert!(too_big.is_user_facing());

        let empty = store.save(UploadKind::Photo, "me.png", &[]).await;
        assert!(matches!(empty, Err(UploadError::Empty)));
    }

    #[tokio::test]
    async fn test_remove_deletes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let stored = store
            .save(UploadKind::Photo, "me.png", b"png")
            .await
            .unwrap();
        assert!(dir.path().join(&stored).exists());

        store.remove(&stored).await.unwrap();
        assert!(!dir.path().join(&stored).exists());
        assert!(store.read(&stored).await.is_err());

        // Removing twice is fine.
        store.remove(&stored).await.unwrap();
        assert!(matches!(
            store.remove("../outside.png").await,
            Err(UploadError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_read_rejects_foreign_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        for name in ["../secret.txt", "documents/../../etc/passwd", "other/x.pdf"] {
            assert!(matches!(
                store.read(name).await,
                Err(UploadError::InvalidName(_))
            ));
        }
    }
}
