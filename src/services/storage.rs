//! Local disk storage for uploaded documents.
//!
//! Files live under the upload directory at `{report_id}/{document_id}-{name}`.
//! Rows store that relative key; it is resolved against the root on access.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Upload directory wrapper.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Open the upload directory, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            AppError::FileSystem(format!(
                "Failed to create upload directory {}: {}",
                root.display(),
                e
            ))
        })?;
        info!("Upload storage initialized at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build the storage key for a document.
    pub fn document_key(report_id: Uuid, document_id: Uuid, filename: &str) -> String {
        format!(
            "{}/{}-{}",
            report_id,
            document_id,
            sanitize_filename(filename)
        )
    }

    /// Resolve a key to a path under the root, rejecting traversal.
    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || key.is_empty() {
            return Err(AppError::InvalidInput(format!("Invalid storage key: {}", key)));
        }
        Ok(self.root.join(relative))
    }

    /// Write a file.
    pub async fn put(&self, key: &str, data: &[u8]) -> AppResult<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::FileSystem(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        tokio::fs::write(&path, data).await.map_err(|e| {
            AppError::FileSystem(format!("Failed to write {}: {}", path.display(), e))
        })?;
        debug!("Stored {} ({} bytes)", key, data.len());
        Ok(())
    }

    /// Read a file. Missing files are `NotFound`.
    pub async fn get(&self, key: &str) -> AppResult<Vec<u8>> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("File {}", key)))
            }
            Err(e) => Err(AppError::FileSystem(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Remove a file. Returns false when it was already gone.
    pub async fn remove(&self, key: &str) -> AppResult<bool> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                // Drop the report directory once it is empty; failure is harmless
                if let Some(parent) = path.parent()
                    && parent != self.root
                {
                    let _ = tokio::fs::remove_dir(parent).await;
                }
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::FileSystem(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Remove many files, logging individual failures.
    ///
    /// Returns how many files were actually removed.
    pub async fn remove_all<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> usize {
        let mut removed = 0;
        for key in keys {
            match self.remove(key).await {
                Ok(true) => removed += 1,
                Ok(false) => warn!("Document file {} was already missing", key),
                Err(e) => warn!("Failed to delete document file {}: {}", key, e),
            }
        }
        removed
    }
}

/// Reduce a client-supplied filename to a safe final component.
pub fn sanitize_filename(filename: &str) -> String {
    let last = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();

    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Get the content type for a file based on its extension.
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    }
}

/// Media type for an upload: the declared one, or inferred from the name.
pub fn resolve_mime_type(declared: Option<&str>, filename: &str) -> String {
    match declared.map(str::trim) {
        Some(mime) if !mime.is_empty() && mime != "application/octet-stream" => mime.to_string(),
        _ => {
            let ext = Path::new(filename)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("");
            content_type_for_extension(ext).to_string()
        }
    }
}
