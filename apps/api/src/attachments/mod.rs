//! Attachment storage: uploaded binaries are written to a backend and
//! reduced to a stable relative path (`uploads/<folder>/<name>`) that is
//! stored inline on records.
//!
//! `AppState` holds an `Arc<dyn AttachmentStorage>`, chosen at startup via
//! `STORAGE_BACKEND`.

pub mod local;
pub mod multipart;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

pub const JOB_FOLDER: &str = "jobs";
pub const CATEGORY_FOLDER: &str = "";
pub const SUBCATEGORY_FOLDER: &str = "subcategories";

/// One file taken from a multipart request.
#[derive(Debug, Clone)]
pub struct Upload {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Where a backend put a binary. `location` is backend specific (an absolute
/// filesystem path or an object key); `public_path` is what records store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub location: String,
    pub public_path: String,
}

impl StoredObject {
    pub fn new(location: String) -> Self {
        let public_path = to_public_path(&location);
        StoredObject {
            location,
            public_path,
        }
    }
}

#[async_trait]
pub trait AttachmentStorage: Send + Sync {
    /// Writes `upload` under `folder` with a freshly generated file name.
    async fn put(&self, folder: &str, upload: &Upload) -> Result<StoredObject, AppError>;

    /// Removes a binary by the public path recorded for it.
    async fn remove(&self, public_path: &str) -> Result<(), AppError>;
}

/// Reduces a stored location to the path recorded on a record.
///
/// Locations containing an `uploads/` segment keep everything from the last
/// such segment on; anything else maps to `uploads/jobs/<basename>`, which is how
/// older records were written.
pub fn to_public_path(location: &str) -> String {
    let normalized = location.replace('\\', "/");
    if normalized.starts_with("uploads/") {
        return normalized;
    }
    if let Some(idx) = normalized.rfind("/uploads/") {
        return normalized[idx + 1..].to_string();
    }
    let base = normalized.rsplit('/').next().unwrap_or_default();
    format!("uploads/{JOB_FOLDER}/{base}")
}

/// `<unix-millis>-<8 hex><ext>`, keeping a sanitized original extension.
pub fn generate_file_name(original: &str) -> String {
    let ext = std::path::Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}{}", Utc::now().timestamp_millis(), &suffix[..8], ext)
}

/// Splits a public path into the segments below `uploads/`, rejecting
/// anything that could escape the upload tree.
pub fn relative_segments(public_path: &str) -> Result<Vec<&str>, AppError> {
    let rest = public_path
        .trim_start_matches('/')
        .strip_prefix("uploads/")
        .ok_or_else(|| AppError::Validation(format!("'{public_path}' is not under uploads/")))?;
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() || segments.iter().any(|s| *s == ".." || *s == ".") {
        return Err(AppError::Validation(format!(
            "'{public_path}' is not a valid attachment path"
        )));
    }
    Ok(segments)
}

/// Stores every upload, or none: on the first failure the binaries already
/// written by this call are removed before the error is returned.
pub async fn store_all(
    storage: &dyn AttachmentStorage,
    folder: &str,
    uploads: &[Upload],
) -> Result<Vec<StoredObject>, AppError> {
    let mut stored = Vec::with_capacity(uploads.len());
    for upload in uploads {
        match storage.put(folder, upload).await {
            Ok(obj) => stored.push(obj),
            Err(e) => {
                discard(storage, &stored).await;
                return Err(e);
            }
        }
    }
    Ok(stored)
}

/// Best-effort removal of binaries whose record write did not happen.
pub async fn discard(storage: &dyn AttachmentStorage, stored: &[StoredObject]) {
    for obj in stored {
        if let Err(e) = storage.remove(&obj.public_path).await {
            warn!("Failed to remove orphaned attachment {}: {e}", obj.public_path);
        }
    }
}

/// Best-effort removal of attachments referenced by a deleted record.
pub async fn remove_paths(storage: &dyn AttachmentStorage, paths: &[String]) {
    for path in paths {
        if let Err(e) = storage.remove(path).await {
            warn!("Failed to remove attachment {path}: {e}");
        }
    }
}
