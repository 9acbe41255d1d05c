//! Job operations. Handlers parse the request, these functions enforce the
//! record contract against whichever `JobStore` and `AttachmentStorage` the
//! application was started with.

use chrono::Utc;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::attachments::{discard, remove_paths, store_all, AttachmentStorage, StoredObject, Upload, JOB_FOLDER};
use crate::errors::AppError;
use crate::jobs::completion::{completion_report, CompletionReport};
use crate::jobs::mutation::JobMutation;
use crate::jobs::payload::{DraftSeed, JobPayload, SectionWrite, UNTITLED_POST};
use crate::jobs::section::Section;
use crate::jobs::store::{JobFilter, JobStore};
use crate::models::job::JobRecord;

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Job {id} not found"))
}

/// Parses a job id from a path segment or body field.
pub fn parse_job_id(raw: &str) -> Result<Uuid, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::Validation("jobId is required".to_string()));
    }
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("'{raw}' is not a valid job id")))
}

/// Parses an array index from a path segment. Only plain non-negative
/// integers are accepted.
pub fn parse_index(raw: &str) -> Result<usize, AppError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::Validation(format!("Invalid index '{raw}'")));
    }
    raw.parse()
        .map_err(|_| AppError::Validation(format!("Invalid index '{raw}'")))
}

// ────────────────────────────────────────────────────────────────────────────
// Draft lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// Creates a record with every section in its empty shape.
pub async fn create_draft(store: &dyn JobStore, seed: DraftSeed) -> Result<JobRecord, AppError> {
    let mut record = JobRecord::empty(Uuid::new_v4(), Utc::now());
    record.post_name = Some(seed.post_name.unwrap_or_else(|| UNTITLED_POST.to_string()));
    record.organization = Some(seed.organization.unwrap_or_default());
    record.advt_number = Some(seed.advt_number.unwrap_or_default());

    store.insert(&record).await?;
    info!("Created draft job {}", record.id);
    Ok(record)
}

// ────────────────────────────────────────────────────────────────────────────
// Section-wise save
// ────────────────────────────────────────────────────────────────────────────

pub async fn save_section(
    store: &dyn JobStore,
    id: Uuid,
    section_name: &str,
    data: Value,
    expected_version: Option<i32>,
) -> Result<JobRecord, AppError> {
    if section_name.trim().is_empty() {
        return Err(AppError::Validation("section is required".to_string()));
    }
    let section: Section = section_name.parse()?;
    let write = SectionWrite::parse(section, data)?;

    let record = store
        .mutate(id, &JobMutation::SaveSection(write), expected_version)
        .await?
        .ok_or_else(|| not_found(id))?;
    info!("Saved section {section} of job {id} (version {})", record.version);
    Ok(record)
}

// ────────────────────────────────────────────────────────────────────────────
// Attachments
// ────────────────────────────────────────────────────────────────────────────

/// Stores `uploads` and appends their paths to the record's `files`.
/// Returns the new paths along with the updated record.
pub async fn attach_files(
    store: &dyn JobStore,
    storage: &dyn AttachmentStorage,
    id: Uuid,
    uploads: &[Upload],
) -> Result<(Vec<String>, JobRecord), AppError> {
    if uploads.is_empty() {
        return Err(AppError::Validation("No files uploaded".to_string()));
    }
    if store.get(id).await?.is_none() {
        return Err(not_found(id));
    }

    let stored = store_all(storage, JOB_FOLDER, uploads).await?;
    let paths: Vec<String> = stored.iter().map(|s| s.public_path.clone()).collect();

    let record = finish_or_discard(
        storage,
        &stored,
        store.mutate(id, &JobMutation::AppendFiles(paths.clone()), None).await,
        id,
    )
    .await?;
    info!("Attached {} file(s) to job {id}", paths.len());
    Ok((paths, record))
}

/// Removes the binaries written for a mutation that did not land.
async fn finish_or_discard(
    storage: &dyn AttachmentStorage,
    stored: &[StoredObject],
    outcome: Result<Option<JobRecord>, AppError>,
    id: Uuid,
) -> Result<JobRecord, AppError> {
    match outcome {
        Ok(Some(record)) => Ok(record),
        Ok(None) => {
            discard(storage, stored).await;
            Err(not_found(id))
        }
        Err(e) => {
            discard(storage, stored).await;
            Err(e)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Array items
// ────────────────────────────────────────────────────────────────────────────

pub async fn delete_array_item(
    store: &dyn JobStore,
    id: Uuid,
    section_name: &str,
    raw_index: &str,
) -> Result<JobRecord, AppError> {
    let section: Section = section_name.parse()?;
    if !section.is_array() {
        return Err(AppError::Validation(format!("{section} is not an array")));
    }
    let index = parse_index(raw_index)?;

    let record = store
        .mutate(id, &JobMutation::RemoveItem { section, index }, None)
        .await?
        .ok_or_else(|| not_found(id))?;
    info!("Removed {section}[{index}] from job {id}");
    Ok(record)
}

// ────────────────────────────────────────────────────────────────────────────
// Full create / update
// ────────────────────────────────────────────────────────────────────────────

/// Files and logo uploaded alongside `jobData`.
#[derive(Debug, Default)]
pub struct JobUploads {
    pub files: Vec<Upload>,
    pub logo: Option<Upload>,
}

struct StoredUploads {
    files: Vec<StoredObject>,
    logo: Option<StoredObject>,
}

impl StoredUploads {
    fn all(&self) -> Vec<StoredObject> {
        self.files.iter().cloned().chain(self.logo.clone()).collect()
    }

    fn mutation(&self, payload: JobPayload) -> JobMutation {
        JobMutation::Merge {
            payload,
            uploaded_files: self.files.iter().map(|s| s.public_path.clone()).collect(),
            uploaded_logo: self.logo.as_ref().map(|s| s.public_path.clone()),
        }
    }
}

async fn store_uploads(
    storage: &dyn AttachmentStorage,
    uploads: &JobUploads,
) -> Result<StoredUploads, AppError> {
    let files = store_all(storage, JOB_FOLDER, &uploads.files).await?;
    let logo = match &uploads.logo {
        Some(logo) => match storage.put(JOB_FOLDER, logo).await {
            Ok(stored) => Some(stored),
            Err(e) => {
                discard(storage, &files).await;
                return Err(e);
            }
        },
        None => None,
    };
    Ok(StoredUploads { files, logo })
}

pub async fn create_job(
    store: &dyn JobStore,
    storage: &dyn AttachmentStorage,
    payload: JobPayload,
    uploads: &JobUploads,
) -> Result<JobRecord, AppError> {
    payload.validate_for_create()?;

    let stored = store_uploads(storage, uploads).await?;
    let mutation = stored.mutation(payload);

    let mut record = JobRecord::empty(Uuid::new_v4(), Utc::now());
    if let Err(e) = mutation.apply(&mut record) {
        discard(storage, &stored.all()).await;
        return Err(e);
    }
    record.mark_saved(&mutation.written_sections());

    if let Err(e) = store.insert(&record).await {
        discard(storage, &stored.all()).await;
        return Err(e);
    }
    info!("Created job {} ({} file(s))", record.id, record.files.len());
    Ok(record)
}

pub async fn update_job(
    store: &dyn JobStore,
    storage: &dyn AttachmentStorage,
    id: Uuid,
    payload: JobPayload,
    uploads: &JobUploads,
) -> Result<JobRecord, AppError> {
    payload.validate()?;
    if store.get(id).await?.is_none() {
        return Err(not_found(id));
    }

    let stored = store_uploads(storage, uploads).await?;
    let outcome = store.mutate(id, &stored.mutation(payload), None).await;
    let record = finish_or_discard(storage, &stored.all(), outcome, id).await?;
    info!("Updated job {id} (version {})", record.version);
    Ok(record)
}

// ────────────────────────────────────────────────────────────────────────────
// Reads and delete
// ────────────────────────────────────────────────────────────────────────────

pub async fn get_job(store: &dyn JobStore, id: Uuid) -> Result<JobRecord, AppError> {
    store.get(id).await?.ok_or_else(|| not_found(id))
}

pub async fn list_jobs(store: &dyn JobStore, filter: &JobFilter) -> Result<Vec<JobRecord>, AppError> {
    store.list(filter).await
}

pub async fn job_completion(store: &dyn JobStore, id: Uuid) -> Result<CompletionReport, AppError> {
    Ok(completion_report(&get_job(store, id).await?))
}

/// Deletes the record, then its attachments (best effort).
pub async fn delete_job(
    store: &dyn JobStore,
    storage: &dyn AttachmentStorage,
    id: Uuid,
) -> Result<(), AppError> {
    let record = store.delete(id).await?.ok_or_else(|| not_found(id))?;
    remove_paths(storage, &record.attachment_paths()).await;
    info!("Deleted job {id}");
    Ok(())
}
