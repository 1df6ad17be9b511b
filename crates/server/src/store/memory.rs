//! In-memory job store.
//!
//! Mirrors the PostgreSQL store's semantics, including the version
//! compare-and-set and terminal immutability, so the orchestrator and
//! scheduler can be exercised without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::models::{Job, JobStage, Wake};
use crate::store::{JobStore, StoreError, StoreResult};

#[derive(Default)]
struct Inner {
    jobs: HashMap<Uuid, Job>,
    wakes: Vec<Wake>,
}

/// Job store held entirely in process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create_job(&self, input_ref: &str) -> StoreResult<Job> {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            stage: JobStage::Created,
            input_ref: input_ref.to_string(),
            transcription_handle: None,
            transcript: None,
            summary: None,
            attempts: 0,
            started_at: None,
            stage_deadline: None,
            error: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.lock().await;
        inner.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<Job> {
        let inner = self.inner.lock().await;
        inner.jobs.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn update_job(&self, job: &Job) -> StoreResult<Job> {
        let mut inner = self.inner.lock().await;
        let current = inner
            .jobs
            .get(&job.id)
            .cloned()
            .ok_or(StoreError::NotFound(job.id))?;

        if current.is_terminal() {
            return Ok(current);
        }
        if current.version != job.version {
            return Err(StoreError::Conflict(job.id));
        }

        let mut stored = job.clone();
        stored.version += 1;
        stored.updated_at = Utc::now();
        inner.jobs.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_jobs(&self, limit: i64) -> StoreResult<Vec<Job>> {
        let inner = self.inner.lock().await;
        let mut jobs: Vec<Job> = inner.jobs.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs.truncate(limit.max(0) as usize);
        Ok(jobs)
    }

    async fn count_jobs(&self) -> StoreResult<i64> {
        let inner = self.inner.lock().await;
        Ok(inner.jobs.len() as i64)
    }

    async fn schedule_wake(&self, job_id: Uuid, wake_at: DateTime<Utc>) -> StoreResult<Wake> {
        let wake = Wake {
            id: Uuid::new_v4(),
            job_id,
            wake_at,
            created_at: Utc::now(),
        };

        let mut inner = self.inner.lock().await;
        inner.wakes.push(wake.clone());
        Ok(wake)
    }

    async fn due_wakes(&self, now: DateTime<Utc>, limit: i64) -> StoreResult<Vec<Wake>> {
        let inner = self.inner.lock().await;
        let mut due: Vec<Wake> = inner
            .wakes
            .iter()
            .filter(|w| w.wake_at <= now)
            .cloned()
            .collect();
        due.sort_by(|a, b| (a.wake_at, a.created_at).cmp(&(b.wake_at, b.created_at)));
        due.truncate(limit.max(0) as usize);
        Ok(due)
    }

    async fn complete_wake(&self, wake_id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.wakes.retain(|w| w.id != wake_id);
        Ok(())
    }

    async fn jobs_without_wakes(&self) -> StoreResult<Vec<Uuid>> {
        let inner = self.inner.lock().await;
        let mut stranded: Vec<&Job> = inner
            .jobs
            .values()
            .filter(|j| !j.is_terminal())
            .filter(|j| !inner.wakes.iter().any(|w| w.job_id == j.id))
            .collect();
        stranded.sort_by_key(|j| j.created_at);
        Ok(stranded.into_iter().map(|j| j.id).collect())
    }

    async fn health(&self) -> bool {
        true
    }
}
