//! In-memory `JobStore` and `AttachmentStorage` for unit and router tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::attachments::{generate_file_name, AttachmentStorage, StoredObject, Upload};
use crate::errors::AppError;
use crate::jobs::mutation::{commit, JobMutation};
use crate::jobs::store::{JobFilter, JobStore};
use crate::models::job::JobRecord;

// ────────────────────────────────────────────────────────────────────────────
// Jobs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryJobStore {
    records: Mutex<HashMap<Uuid, JobRecord>>,
    fail_writes: AtomicBool,
}

impl MemoryJobStore {
    /// Makes every later insert and mutate fail with a database error.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn snapshot(&self, id: Uuid) -> Option<JobRecord> {
        self.records.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, record: &JobRecord) -> Result<(), AppError> {
        self.check_writable()?;
        self.records.lock().unwrap().insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<JobRecord>, AppError> {
        Ok(self.snapshot(id))
    }

    async fn list(&self, filter: &JobFilter) -> Result<Vec<JobRecord>, AppError> {
        let mut records: Vec<JobRecord> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let skipped = records.into_iter().skip(filter.offset() as usize);
        Ok(match filter.limit {
            Some(limit) => skipped.take(limit as usize).collect(),
            None => skipped.collect(),
        })
    }

    async fn mutate(
        &self,
        id: Uuid,
        mutation: &JobMutation,
        expected_version: Option<i32>,
    ) -> Result<Option<JobRecord>, AppError> {
        self.check_writable()?;
        let mut records = self.records.lock().unwrap();
        let Some(current) = records.get(&id) else {
            return Ok(None);
        };
        let mut next = current.clone();
        commit(&mut next, mutation, expected_version, Utc::now())?;
        records.insert(id, next.clone());
        Ok(Some(next))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<JobRecord>, AppError> {
        self.check_writable()?;
        Ok(self.records.lock().unwrap().remove(&id))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Attachments
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
    fail_after: Option<usize>,
    puts: Mutex<usize>,
}

impl MemoryStorage {
    /// Accepts `n` puts, then fails every later one.
    pub fn failing_after(n: usize) -> Self {
        MemoryStorage {
            fail_after: Some(n),
            ..Default::default()
        }
    }

    /// Public paths currently stored.
    pub fn paths(&self) -> Vec<String> {
        self.objects.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl AttachmentStorage for MemoryStorage {
    async fn put(&self, folder: &str, upload: &Upload) -> Result<StoredObject, AppError> {
        let mut puts = self.puts.lock().unwrap();
        if self.fail_after.is_some_and(|n| *puts >= n) {
            return Err(AppError::Storage("simulated storage failure".to_string()));
        }
        *puts += 1;

        let name = generate_file_name(&upload.file_name);
        let location = if folder.is_empty() {
            format!("/mem/uploads/{name}")
        } else {
            format!("/mem/uploads/{folder}/{name}")
        };
        let stored = StoredObject::new(location);
        self.objects.lock().unwrap().push(stored.public_path.clone());
        Ok(stored)
    }

    async fn remove(&self, public_path: &str) -> Result<(), AppError> {
        let normalized = public_path.trim_start_matches('/').to_string();
        self.objects.lock().unwrap().retain(|p| *p != normalized);
        self.removed.lock().unwrap().push(normalized);
        Ok(())
    }
}
