/// Attachment storage
///
/// Uploaded files live flat in one directory, keyed by a sanitized version of
/// the client's filename. A sanitized name never contains a path separator or
/// a leading dot, so joining it onto the upload directory cannot escape it.
///
/// Two uploads that sanitize to the same name share one file; the later
/// upload overwrites the earlier.
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::storage::{PendingUpload, UploadStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = UploadStore::new("uploads");
/// store.ensure_dir().await?;
///
/// let saved = store
///     .store(PendingUpload::new(Some("../../etc/passwd".into()), "data".into()))
///     .await?;
/// assert_eq!(saved.as_deref(), Some("etc_passwd"));
/// # Ok(())
/// # }
/// ```

use bytes::Bytes;
use std::path::PathBuf;
use tracing::{debug, info};

/// Longest filename written to disk
pub const MAX_FILENAME_LEN: usize = 255;

/// Device names Windows refuses to use as ordinary files
const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "AUX", "COM1", "COM2", "COM3", "COM4", "LPT1", "LPT2", "LPT3", "PRN", "NUL",
];

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to create upload directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write upload {name}: {source}")]
    Write {
        name: String,
        source: std::io::Error,
    },
}

/// A file part received with a request, not yet written
#[derive(Debug, Clone)]
pub struct PendingUpload {
    /// Filename as sent by the client
    pub file_name: Option<String>,

    pub data: Bytes,
}

impl PendingUpload {
    pub fn new(file_name: Option<String>, data: Bytes) -> Self {
        Self { file_name, data }
    }
}

/// Reduces a client-supplied filename to a safe flat name
///
/// Path separators and whitespace become `_`, anything outside
/// `[A-Za-z0-9_.-]` is dropped, and leading/trailing `.`/`_` are stripped.
/// Windows device names get a `_` prefix. Returns `None` when nothing usable
/// is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let spaced = name.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let mut sanitized = kept.trim_matches(|c: char| c == '.' || c == '_').to_string();

    if sanitized.len() > MAX_FILENAME_LEN {
        // the cut can land on a separator; strip it again so the result is stable
        sanitized = truncate_keeping_extension(&sanitized)
            .trim_end_matches(|c: char| c == '.' || c == '_')
            .to_string();
    }

    if sanitized.is_empty() {
        return None;
    }

    let stem = sanitized.split('.').next().unwrap_or_default();
    if WINDOWS_DEVICE_NAMES.contains(&stem.to_ascii_uppercase().as_str()) {
        sanitized.insert(0, '_');
    }

    Some(sanitized)
}

// input is ASCII, so byte offsets are char boundaries
fn truncate_keeping_extension(name: &str) -> String {
    match name.rfind('.') {
        Some(dot) if name.len() - dot < MAX_FILENAME_LEN => {
            let ext = &name[dot..];
            format!("{}{}", &name[..MAX_FILENAME_LEN - ext.len()], ext)
        }
        _ => name[..MAX_FILENAME_LEN].to_string(),
    }
}

/// Flat directory of uploaded attachments
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates the upload directory if it is missing
    pub async fn ensure_dir(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: self.dir.clone(),
                source,
            })?;

        info!(dir = %self.dir.display(), "Upload directory ready");
        Ok(())
    }

    /// Writes an upload under its sanitized name
    ///
    /// Returns the stored name, or `None` when the upload has no usable
    /// filename (nothing is written in that case).
    pub async fn store(&self, upload: PendingUpload) -> Result<Option<String>, StorageError> {
        let Some(name) = upload.file_name.as_deref().and_then(sanitize_filename) else {
            debug!(client_name = ?upload.file_name, "Upload has no usable filename, skipping");
            return Ok(None);
        };

        let path = self.dir.join(&name);
        tokio::fs::write(&path, &upload.data)
            .await
            .map_err(|source| StorageError::Write {
                name: name.clone(),
                source,
            })?;

        info!(
            file = %name,
            bytes = upload.data.len(),
            "Stored attachment"
        );
        Ok(Some(name))
    }

    /// Path of a stored attachment
    ///
    /// Returns `None` for anything that is not already a sanitized name, so
    /// a request path can never point outside the directory.
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        match sanitize_filename(name) {
            Some(clean) if clean == name => Some(self.dir.join(clean)),
            _ => None,
        }
    }
}
