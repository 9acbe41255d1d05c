use std::sync::Arc;

use sqlx::PgPool;

use crate::attachments::multipart::UploadLimits;
use crate::attachments::AttachmentStorage;
use crate::config::Config;
use crate::jobs::store::JobStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Category tables are queried directly through the pool.
    pub db: PgPool,
    /// Job records. Default: PgJobStore over `db`.
    pub jobs: Arc<dyn JobStore>,
    /// Attachment binaries. Local disk or S3, chosen by STORAGE_BACKEND.
    pub storage: Arc<dyn AttachmentStorage>,
    pub config: Config,
}

impl AppState {
    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_file_bytes: self.config.max_upload_bytes,
            max_files: self.config.max_files_per_request,
        }
    }
}
