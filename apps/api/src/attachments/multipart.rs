use std::collections::HashMap;

use axum::extract::Multipart;

use crate::attachments::Upload;
use crate::errors::AppError;

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_file_bytes: usize,
    pub max_files: usize,
}

/// A fully buffered multipart form: text fields by name, files in order.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: Vec<Upload>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart, limits: UploadLimits) -> Result<Self, AppError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await?;
                    form.push_file(
                        Upload {
                            field: name,
                            file_name,
                            content_type,
                            data,
                        },
                        limits,
                    )?;
                }
                None => {
                    let text = field.text().await?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    fn push_file(&mut self, upload: Upload, limits: UploadLimits) -> Result<(), AppError> {
        // empty file inputs still arrive as a part with a blank name
        if upload.file_name.is_empty() && upload.data.is_empty() {
            return Ok(());
        }
        if upload.data.len() > limits.max_file_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "{} exceeds the {} byte limit",
                upload.file_name, limits.max_file_bytes
            )));
        }
        if self.files.len() >= limits.max_files {
            return Err(AppError::Validation(format!(
                "At most {} files may be uploaded per request",
                limits.max_files
            )));
        }
        self.files.push(upload);
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Removes and returns the files sent under `name`, in request order.
    pub fn take_files(&mut self, name: &str) -> Vec<Upload> {
        let (taken, rest): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.files).into_iter().partition(|f| f.field == name);
        self.files = rest;
        taken
    }

    /// Files under field names the handler did not ask for.
    pub fn remaining_files(&self) -> &[Upload] {
        &self.files
    }
}
