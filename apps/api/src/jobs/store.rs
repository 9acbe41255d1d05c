use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::completion::CompletionStatus;
use crate::jobs::mutation::{commit, JobField, JobMutation};
use crate::models::job::{JobRecord, JobRow};

/// Query parameters for `GET /jobs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobFilter {
    pub status: Option<CompletionStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl JobFilter {
    pub fn offset(&self) -> u64 {
        match self.limit {
            Some(limit) => u64::from(self.page.unwrap_or(1).max(1) - 1) * u64::from(limit),
            None => 0,
        }
    }
}

/// Persistence for job records.
///
/// `mutate` must apply the mutation atomically with respect to other
/// mutations of the same record and write nothing when it fails.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, record: &JobRecord) -> Result<(), AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<JobRecord>, AppError>;

    /// Newest first.
    async fn list(&self, filter: &JobFilter) -> Result<Vec<JobRecord>, AppError>;

    /// Returns `Ok(None)` when the record does not exist.
    async fn mutate(
        &self,
        id: Uuid,
        mutation: &JobMutation,
        expected_version: Option<i32>,
    ) -> Result<Option<JobRecord>, AppError>;

    /// Returns the deleted record, if there was one.
    async fn delete(&self, id: Uuid) -> Result<Option<JobRecord>, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ────────────────────────────────────────────────────────────────────────────

pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        PgJobStore { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn insert(&self, r: &JobRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO jobs
                (id, post_name, organization, advt_number, job_type, sector, job_category,
                 job_location, experience, mode_of_exam, short_description, expiry_date,
                 category, sub_category, meta_details, dates, fees, vacancies, eligibility,
                 salary, selection, links, how_to_apply, files, logo, saved_sections, status,
                 version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30)
            "#,
        )
        .bind(r.id)
        .bind(&r.post_name)
        .bind(&r.organization)
        .bind(&r.advt_number)
        .bind(&r.job_type)
        .bind(&r.sector)
        .bind(&r.job_category)
        .bind(&r.job_location)
        .bind(&r.experience)
        .bind(&r.mode_of_exam)
        .bind(&r.short_description)
        .bind(r.expiry_date)
        .bind(&r.category)
        .bind(&r.sub_category)
        .bind(Json(&r.meta_details))
        .bind(Json(&r.dates))
        .bind(Json(&r.fees))
        .bind(Json(&r.vacancies))
        .bind(Json(&r.eligibility))
        .bind(Json(&r.salary))
        .bind(Json(&r.selection))
        .bind(Json(&r.links))
        .bind(&r.how_to_apply)
        .bind(Json(&r.files))
        .bind(&r.logo)
        .bind(section_names(r))
        .bind(r.status.as_str())
        .bind(r.version)
        .bind(r.created_at)
        .bind(r.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<JobRecord>, AppError> {
        let row: Option<JobRow> = sqlx::query_as("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(JobRecord::from))
    }

    async fn list(&self, filter: &JobFilter) -> Result<Vec<JobRecord>, AppError> {
        let rows: Vec<JobRow> = sqlx::query_as(
            r#"
            SELECT * FROM jobs
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.limit.map(i64::from))
        .bind(filter.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(JobRecord::from).collect())
    }

    async fn mutate(
        &self,
        id: Uuid,
        mutation: &JobMutation,
        expected_version: Option<i32>,
    ) -> Result<Option<JobRecord>, AppError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes mutations of the same record.
        let row: Option<JobRow> = sqlx::query_as("SELECT * FROM jobs WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut record = JobRecord::from(row);
        let touched = commit(&mut record, mutation, expected_version, Utc::now())?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE jobs SET version = ");
        qb.push_bind(record.version)
            .push(", updated_at = ")
            .push_bind(record.updated_at)
            .push(", saved_sections = ")
            .push_bind(section_names(&record))
            .push(", status = ")
            .push_bind(record.status.as_str());
        for field in &touched {
            qb.push(", ").push(field.column()).push(" = ");
            push_value(&mut qb, *field, &record);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.build().execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(Some(record))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<JobRecord>, AppError> {
        let row: Option<JobRow> = sqlx::query_as("DELETE FROM jobs WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(JobRecord::from))
    }
}

fn section_names(record: &JobRecord) -> Vec<String> {
    record
        .saved_sections
        .iter()
        .map(|s| s.as_str().to_string())
        .collect()
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, field: JobField, r: &JobRecord) {
    match field {
        JobField::PostName => qb.push_bind(r.post_name.clone()),
        JobField::Organization => qb.push_bind(r.organization.clone()),
        JobField::AdvtNumber => qb.push_bind(r.advt_number.clone()),
        JobField::JobType => qb.push_bind(r.job_type.clone()),
        JobField::Sector => qb.push_bind(r.sector.clone()),
        JobField::JobCategory => qb.push_bind(r.job_category.clone()),
        JobField::JobLocation => qb.push_bind(r.job_location.clone()),
        JobField::Experience => qb.push_bind(r.experience.clone()),
        JobField::ModeOfExam => qb.push_bind(r.mode_of_exam.clone()),
        JobField::ShortDescription => qb.push_bind(r.short_description.clone()),
        JobField::ExpiryDate => qb.push_bind(r.expiry_date),
        JobField::Category => qb.push_bind(r.category.clone()),
        JobField::SubCategory => qb.push_bind(r.sub_category.clone()),
        JobField::MetaDetails => qb.push_bind(Json(r.meta_details.clone())),
        JobField::Dates => qb.push_bind(Json(r.dates.clone())),
        JobField::Fees => qb.push_bind(Json(r.fees.clone())),
        JobField::Vacancies => qb.push_bind(Json(r.vacancies.clone())),
        JobField::Eligibility => qb.push_bind(Json(r.eligibility.clone())),
        JobField::Salary => qb.push_bind(Json(r.salary.clone())),
        JobField::Selection => qb.push_bind(Json(r.selection.clone())),
        JobField::Links => qb.push_bind(Json(r.links.clone())),
        JobField::HowToApply => qb.push_bind(r.how_to_apply.clone()),
        JobField::Files => qb.push_bind(Json(r.files.clone())),
        JobField::Logo => qb.push_bind(r.logo.clone()),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_without_limit_is_zero() {
        let filter = JobFilter {
            page: Some(3),
            ..Default::default()
        };
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn test_offset_pages() {
        let filter = JobFilter {
            page: Some(3),
            limit: Some(20),
            status: None,
        };
        assert_eq!(filter.offset(), 40);
        let first = JobFilter {
            page: Some(0),
            limit: Some(20),
            status: None,
        };
        assert_eq!(first.offset(), 0);
    }

    #[test]
    fn test_filter_from_query() {
        let filter: JobFilter =
            serde_json::from_value(serde_json::json!({"status": "in_progress", "limit": 5}))
                .unwrap();
        assert_eq!(filter.status, Some(CompletionStatus::InProgress));
        assert_eq!(filter.limit, Some(5));
    }
}
