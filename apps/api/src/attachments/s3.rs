use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use tracing::{debug, info};

use crate::attachments::{
    generate_file_name, relative_segments, AttachmentStorage, StoredObject, Upload,
};
use crate::config::S3Config;
use crate::errors::AppError;

/// Object storage backend (S3 or MinIO). Keys mirror the public paths:
/// `uploads/<folder>/<name>`.
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        S3Storage {
            client,
            bucket: bucket.into(),
        }
    }

    /// Constructs an S3 client configured for MinIO (local) or AWS (production).
    pub async fn from_config(config: &S3Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "jobboard-static",
        );

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&config.endpoint)
            .load()
            .await;

        info!("S3 client initialized (bucket: {})", config.bucket);
        S3Storage::new(aws_sdk_s3::Client::new(&s3_config), config.bucket.clone())
    }
}

pub fn object_key(folder: &str, file_name: &str) -> String {
    if folder.is_empty() {
        format!("uploads/{file_name}")
    } else {
        format!("uploads/{folder}/{file_name}")
    }
}

#[async_trait]
impl AttachmentStorage for S3Storage {
    async fn put(&self, folder: &str, upload: &Upload) -> Result<StoredObject, AppError> {
        let key = object_key(folder, &generate_file_name(&upload.file_name));
        let content_type = upload
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(upload.data.to_vec()))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        debug!("Uploaded s3://{}/{}", self.bucket, key);
        Ok(StoredObject::new(key))
    }

    async fn remove(&self, public_path: &str) -> Result<(), AppError> {
        let key = format!("uploads/{}", relative_segments(public_path)?.join("/"));
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 delete failed: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachments::to_public_path;

    #[test]
    fn test_keys_are_public_paths() {
        let key = object_key("jobs", "1-abcd1234.pdf");
        assert_eq!(key, "uploads/jobs/1-abcd1234.pdf");
        assert_eq!(to_public_path(&key), key);
        assert_eq!(object_key("", "x.png"), "uploads/x.png");
    }
}
