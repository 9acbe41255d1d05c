//! Record mutations shared by every `JobStore` backend.
//!
//! A store loads the current record under a lock, calls [`commit`], and then
//! persists only the [`JobField`]s it reports as touched plus bookkeeping
//! (`saved_sections`, `status`, `version`, `updated_at`). Writes to different
//! sections therefore never overwrite each other.

use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::jobs::payload::{BasicDetailsPatch, JobPayload, SectionWrite};
use crate::jobs::section::Section;
use crate::models::job::JobRecord;

/// Persisted columns a mutation can touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobField {
    PostName,
    Organization,
    AdvtNumber,
    JobType,
    Sector,
    JobCategory,
    JobLocation,
    Experience,
    ModeOfExam,
    ShortDescription,
    ExpiryDate,
    Category,
    SubCategory,
    MetaDetails,
    Dates,
    Fees,
    Vacancies,
    Eligibility,
    Salary,
    Selection,
    Links,
    HowToApply,
    Files,
    Logo,
}

impl JobField {
    pub fn column(&self) -> &'static str {
        match self {
            JobField::PostName => "post_name",
            JobField::Organization => "organization",
            JobField::AdvtNumber => "advt_number",
            JobField::JobType => "job_type",
            JobField::Sector => "sector",
            JobField::JobCategory => "job_category",
            JobField::JobLocation => "job_location",
            JobField::Experience => "experience",
            JobField::ModeOfExam => "mode_of_exam",
            JobField::ShortDescription => "short_description",
            JobField::ExpiryDate => "expiry_date",
            JobField::Category => "category",
            JobField::SubCategory => "sub_category",
            JobField::MetaDetails => "meta_details",
            JobField::Dates => "dates",
            JobField::Fees => "fees",
            JobField::Vacancies => "vacancies",
            JobField::Eligibility => "eligibility",
            JobField::Salary => "salary",
            JobField::Selection => "selection",
            JobField::Links => "links",
            JobField::HowToApply => "how_to_apply",
            JobField::Files => "files",
            JobField::Logo => "logo",
        }
    }
}

#[derive(Debug, Clone)]
pub enum JobMutation {
    /// Section-wise save.
    SaveSection(SectionWrite),
    /// Full update: keys present in the payload, then uploaded attachments.
    Merge {
        payload: JobPayload,
        uploaded_files: Vec<String>,
        uploaded_logo: Option<String>,
    },
    /// Attachment association; paths are appended in order.
    AppendFiles(Vec<String>),
    /// Positional removal from an array-valued section.
    RemoveItem { section: Section, index: usize },
}

impl JobMutation {
    /// Applies the data change and returns the touched fields.
    pub fn apply(&self, record: &mut JobRecord) -> Result<Vec<JobField>, AppError> {
        match self {
            JobMutation::SaveSection(write) => Ok(apply_section(record, write.clone())),
            JobMutation::Merge {
                payload,
                uploaded_files,
                uploaded_logo,
            } => Ok(apply_merge(record, payload, uploaded_files, uploaded_logo)),
            JobMutation::AppendFiles(paths) => {
                record.files.extend(paths.iter().cloned());
                Ok(vec![JobField::Files])
            }
            JobMutation::RemoveItem { section, index } => {
                remove_item(record, *section, *index).map(|field| vec![field])
            }
        }
    }

    /// Sections that count as written once this mutation succeeds.
    pub fn written_sections(&self) -> Vec<Section> {
        match self {
            JobMutation::SaveSection(write) => vec![write.section()],
            JobMutation::Merge {
                payload,
                uploaded_files,
                uploaded_logo,
            } => {
                let mut sections = payload.present_sections();
                if !uploaded_files.is_empty() && !sections.contains(&Section::Files) {
                    sections.push(Section::Files);
                }
                if uploaded_logo.is_some() && !sections.contains(&Section::Logo) {
                    sections.push(Section::Logo);
                }
                sections
            }
            JobMutation::AppendFiles(_) => vec![Section::Files],
            JobMutation::RemoveItem { .. } => Vec::new(),
        }
    }
}

/// Checks the optimistic-concurrency token, applies `mutation`, and updates
/// the bookkeeping fields. On error `record` may be partially modified and
/// must be discarded by the caller.
pub fn commit(
    record: &mut JobRecord,
    mutation: &JobMutation,
    expected_version: Option<i32>,
    now: DateTime<Utc>,
) -> Result<Vec<JobField>, AppError> {
    if let Some(expected) = expected_version {
        if expected != record.version {
            return Err(AppError::Conflict(format!(
                "job {} is at version {}, expected {}",
                record.id, record.version, expected
            )));
        }
    }
    let touched = mutation.apply(record)?;
    record.mark_saved(&mutation.written_sections());
    record.version += 1;
    record.updated_at = now;
    Ok(touched)
}

fn apply_section(record: &mut JobRecord, write: SectionWrite) -> Vec<JobField> {
    match write {
        SectionWrite::BasicDetails(patch) => apply_basic(record, &patch),
        SectionWrite::MetaDetails(v) => {
            record.meta_details = v;
            vec![JobField::MetaDetails]
        }
        SectionWrite::Dates(v) => {
            record.dates = v;
            vec![JobField::Dates]
        }
        SectionWrite::Fees(v) => {
            record.fees = v;
            vec![JobField::Fees]
        }
        SectionWrite::Vacancies(v) => {
            record.vacancies = v;
            vec![JobField::Vacancies]
        }
        SectionWrite::Eligibility(v) => {
            record.eligibility = v;
            vec![JobField::Eligibility]
        }
        SectionWrite::Salary(v) => {
            record.salary = v;
            vec![JobField::Salary]
        }
        SectionWrite::Selection(v) => {
            record.selection = v;
            vec![JobField::Selection]
        }
        SectionWrite::Links(v) => {
            record.links = v;
            vec![JobField::Links]
        }
        SectionWrite::HowToApply(v) => {
            record.how_to_apply = v;
            vec![JobField::HowToApply]
        }
        SectionWrite::Files(v) => {
            record.files = v;
            vec![JobField::Files]
        }
        SectionWrite::Logo(v) => {
            record.logo = v;
            vec![JobField::Logo]
        }
    }
}

/// Copies each supplied key to the top level; absent keys stay as they are.
pub fn apply_basic(record: &mut JobRecord, patch: &BasicDetailsPatch) -> Vec<JobField> {
    let mut touched = Vec::new();
    let mut set = |slot: &mut Option<String>, value: &Option<Option<String>>, field: JobField| {
        if let Some(v) = value {
            *slot = v.clone();
            touched.push(field);
        }
    };
    set(&mut record.post_name, &patch.post_name, JobField::PostName);
    set(&mut record.organization, &patch.organization, JobField::Organization);
    set(&mut record.advt_number, &patch.advt_number, JobField::AdvtNumber);
    set(&mut record.job_type, &patch.job_type, JobField::JobType);
    set(&mut record.sector, &patch.sector, JobField::Sector);
    set(&mut record.job_category, &patch.job_category, JobField::JobCategory);
    set(&mut record.job_location, &patch.job_location, JobField::JobLocation);
    set(&mut record.experience, &patch.experience, JobField::Experience);
    set(&mut record.mode_of_exam, &patch.mode_of_exam, JobField::ModeOfExam);
    set(
        &mut record.short_description,
        &patch.short_description,
        JobField::ShortDescription,
    );
    if let Some(expiry) = patch.expiry_date {
        record.expiry_date = expiry;
        touched.push(JobField::ExpiryDate);
    }
    touched
}

fn apply_merge(
    record: &mut JobRecord,
    payload: &JobPayload,
    uploaded_files: &[String],
    uploaded_logo: &Option<String>,
) -> Vec<JobField> {
    let mut touched = apply_basic(record, &payload.basic);

    if let Some(v) = &payload.category {
        record.category = v.clone();
        touched.push(JobField::Category);
    }
    if let Some(v) = &payload.sub_category {
        record.sub_category = v.clone();
        touched.push(JobField::SubCategory);
    }

    for write in payload.section_writes() {
        touched.extend(apply_section(record, write));
    }

    if !uploaded_files.is_empty() {
        record.files.extend(uploaded_files.iter().cloned());
        if !touched.contains(&JobField::Files) {
            touched.push(JobField::Files);
        }
    }
    if let Some(logo) = uploaded_logo {
        record.logo = Some(logo.clone());
        if !touched.contains(&JobField::Logo) {
            touched.push(JobField::Logo);
        }
    }
    touched
}

fn remove_item(record: &mut JobRecord, section: Section, index: usize) -> Result<JobField, AppError> {
    match section {
        Section::Dates => remove_at(&mut record.dates, section, index).map(|_| JobField::Dates),
        Section::Fees => remove_at(&mut record.fees, section, index).map(|_| JobField::Fees),
        Section::Vacancies => {
            remove_at(&mut record.vacancies, section, index).map(|_| JobField::Vacancies)
        }
        Section::Selection => {
            remove_at(&mut record.selection, section, index).map(|_| JobField::Selection)
        }
        Section::Links => remove_at(&mut record.links, section, index).map(|_| JobField::Links),
        Section::Files => remove_at(&mut record.files, section, index).map(|_| JobField::Files),
        other => Err(AppError::Validation(format!("{other} is not an array"))),
    }
}

/// Order-preserving removal (shift left, not swap).
fn remove_at<T>(items: &mut Vec<T>, section: Section, index: usize) -> Result<T, AppError> {
    if index >= items.len() {
        return Err(AppError::Validation(format!(
            "Invalid index {index} for {section} (length {})",
            items.len()
        )));
    }
    Ok(items.remove(index))
}
