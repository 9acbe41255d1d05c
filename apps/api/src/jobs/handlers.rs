use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::attachments::multipart::UploadForm;
use crate::errors::AppError;
use crate::extract::{AppJson, AppQuery};
use crate::jobs::completion::CompletionReport;
use crate::jobs::payload::{DraftSeed, JobPayload};
use crate::jobs::service::{self, parse_job_id, JobUploads};
use crate::jobs::store::JobFilter;
use crate::models::job::JobRecord;
use crate::models::serde_helpers::double_option;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CreatedJobResponse {
    pub message: &'static str,
    pub id: Uuid,
    pub job: JobRecord,
}

#[derive(Serialize)]
pub struct JobResponse {
    pub message: &'static str,
    pub job: JobRecord,
}

#[derive(Serialize)]
pub struct FilesResponse {
    pub message: &'static str,
    pub files: Vec<String>,
    pub job: JobRecord,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSectionRequest {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    /// `Some(None)` is an explicit `null`, which clears the logo.
    #[serde(default, deserialize_with = "double_option")]
    pub data: Option<Option<Value>>,
    #[serde(default)]
    pub expected_version: Option<i32>,
}

fn created(message: &'static str, job: JobRecord) -> (StatusCode, Json<CreatedJobResponse>) {
    (
        StatusCode::CREATED,
        Json(CreatedJobResponse {
            message,
            id: job.id,
            job,
        }),
    )
}

/// Splits a create/update form into `jobData` and its attachments.
fn job_form(mut form: UploadForm) -> Result<(JobPayload, JobUploads), AppError> {
    let payload = JobPayload::parse(form.field("jobData").unwrap_or_default())?;
    let files = form.take_files("files");
    let mut logos = form.take_files("logo");
    if logos.len() > 1 {
        return Err(AppError::Validation("Only one logo may be uploaded".to_string()));
    }
    reject_unexpected(&form)?;
    Ok((
        payload,
        JobUploads {
            files,
            logo: logos.pop(),
        },
    ))
}

fn reject_unexpected(form: &UploadForm) -> Result<(), AppError> {
    match form.remaining_files().first() {
        Some(extra) => Err(AppError::Validation(format!(
            "Unexpected file field '{}'",
            extra.field
        ))),
        None => Ok(()),
    }
}

/// POST /api/jobs/draft
pub async fn handle_create_draft(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedJobResponse>), AppError> {
    let seed = DraftSeed::parse(&body)?;
    let job = service::create_draft(state.jobs.as_ref(), seed).await?;
    Ok(created("Draft created", job))
}

/// POST /api/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreatedJobResponse>), AppError> {
    let form = UploadForm::read(multipart, state.upload_limits()).await?;
    let (payload, uploads) = job_form(form)?;
    let job = service::create_job(state.jobs.as_ref(), state.storage.as_ref(), payload, &uploads).await?;
    Ok(created("Job created", job))
}

/// PUT /api/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<JobResponse>, AppError> {
    let id = parse_job_id(&id)?;
    let form = UploadForm::read(multipart, state.upload_limits()).await?;
    let (payload, uploads) = job_form(form)?;
    let job =
        service::update_job(state.jobs.as_ref(), state.storage.as_ref(), id, payload, &uploads)
            .await?;
    Ok(Json(JobResponse {
        message: "Job updated",
        job,
    }))
}

/// POST /api/jobs/save-section
pub async fn handle_save_section(
    State(state): State<AppState>,
    AppJson(req): AppJson<SaveSectionRequest>,
) -> Result<Json<JobResponse>, AppError> {
    let id = parse_job_id(req.job_id.as_deref().unwrap_or_default())?;
    let section = req.section.unwrap_or_default();
    let data = req
        .data
        .ok_or_else(|| AppError::Validation("data is required".to_string()))?
        .unwrap_or(Value::Null);

    let job = service::save_section(state.jobs.as_ref(), id, &section, data, req.expected_version)
        .await?;
    Ok(Json(JobResponse {
        message: "Section saved",
        job,
    }))
}

/// POST /api/jobs/files
pub async fn handle_upload_files(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<FilesResponse>, AppError> {
    let mut form = UploadForm::read(multipart, state.upload_limits()).await?;
    let id = parse_job_id(form.field("jobId").unwrap_or_default())?;
    let uploads = form.take_files("files");
    reject_unexpected(&form)?;

    let (files, job) =
        service::attach_files(state.jobs.as_ref(), state.storage.as_ref(), id, &uploads).await?;
    Ok(Json(FilesResponse {
        message: "Files uploaded",
        files,
        job,
    }))
}

/// DELETE /api/jobs/:id/section/:section/:index
pub async fn handle_delete_array_item(
    State(state): State<AppState>,
    Path((id, section, index)): Path<(String, String, String)>,
) -> Result<Json<JobResponse>, AppError> {
    let id = parse_job_id(&id)?;
    let job = service::delete_array_item(state.jobs.as_ref(), id, &section, &index).await?;
    Ok(Json(JobResponse {
        message: "Item removed",
        job,
    }))
}

/// DELETE /api/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_job_id(&id)?;
    service::delete_job(state.jobs.as_ref(), state.storage.as_ref(), id).await?;
    Ok(Json(MessageResponse {
        message: "Job deleted",
    }))
}

/// GET /api/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<JobFilter>,
) -> Result<Json<Vec<JobRecord>>, AppError> {
    Ok(Json(service::list_jobs(state.jobs.as_ref(), &filter).await?))
}

/// GET /api/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobRecord>, AppError> {
    let id = parse_job_id(&id)?;
    Ok(Json(service::get_job(state.jobs.as_ref(), id).await?))
}

/// GET /api/jobs/:id/completion
pub async fn handle_job_completion(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CompletionReport>, AppError> {
    let id = parse_job_id(&id)?;
    Ok(Json(service::job_completion(state.jobs.as_ref(), id).await?))
}
