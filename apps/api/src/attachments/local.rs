use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::attachments::{
    generate_file_name, relative_segments, AttachmentStorage, StoredObject, Upload,
};
use crate::errors::AppError;

/// Writes binaries below a local directory that is served at `/uploads`.
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    /// Creates the directory if needed. Its last component must be
    /// `uploads` so stored locations reduce to `uploads/...` paths.
    pub async fn new(root: impl AsRef<Path>) -> anyhow::Result<Self> {
        let root = root.as_ref();
        if root.file_name().and_then(|n| n.to_str()) != Some("uploads") {
            anyhow::bail!(
                "upload directory must be named 'uploads', got '{}'",
                root.display()
            );
        }
        tokio::fs::create_dir_all(root).await?;
        let root = tokio::fs::canonicalize(root).await?;
        Ok(LocalDiskStorage { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl AttachmentStorage for LocalDiskStorage {
    async fn put(&self, folder: &str, upload: &Upload) -> Result<StoredObject, AppError> {
        let dir = if folder.is_empty() {
            self.root.clone()
        } else {
            self.root.join(folder)
        };
        tokio::fs::create_dir_all(&dir).await?;

        let name = generate_file_name(&upload.file_name);
        let path = dir.join(&name);
        tokio::fs::write(&path, &upload.data).await?;
        debug!("Stored {} ({} bytes) at {}", upload.file_name, upload.data.len(), path.display());

        // relative to the root, which may itself sit below another `uploads`
        let public_path = if folder.is_empty() {
            format!("uploads/{name}")
        } else {
            format!("uploads/{folder}/{name}")
        };
        Ok(StoredObject {
            location: path.to_string_lossy().into_owned(),
            public_path,
        })
    }

    async fn remove(&self, public_path: &str) -> Result<(), AppError> {
        let path = relative_segments(public_path)?
            .into_iter()
            .fold(self.root.clone(), |acc, seg| acc.join(seg));
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
