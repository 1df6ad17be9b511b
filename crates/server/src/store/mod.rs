//! Job store: persistent state for jobs and their scheduled wakes.
//!
//! [`JobStore`] is the storage contract the orchestrator and HTTP
//! handlers work against. Two backends implement it: [`PostgresStore`]
//! for durable deployments and [`MemoryStore`] for tests and local
//! development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::{Job, Wake};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Errors reported by the job store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No job with the given id
    #[error("job not found: {0}")]
    NotFound(Uuid),

    /// Compare-and-set version mismatch
    #[error("version conflict updating job {0}")]
    Conflict(Uuid),

    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored state that cannot be interpreted
    #[error("corrupt stored state: {0}")]
    Corrupt(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage contract for jobs and wakes.
///
/// Implementations must be `Send + Sync` for use behind
/// `Arc<dyn JobStore>`.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job in the `created` stage with version 1.
    async fn create_job(&self, input_ref: &str) -> StoreResult<Job>;

    /// Fetch a job by id.
    async fn get_job(&self, id: Uuid) -> StoreResult<Job>;

    /// Compare-and-set update.
    ///
    /// The write applies only when the stored version equals
    /// `job.version`; on success the stored version increments and the
    /// updated job is returned. A mismatch is [`StoreError::Conflict`],
    /// which callers resolve by abandoning their write: the job was
    /// concurrently driven by another writer. Terminal jobs are never
    /// modified; updating one returns the stored job unchanged.
    async fn update_job(&self, job: &Job) -> StoreResult<Job>;

    /// List jobs, newest first.
    async fn list_jobs(&self, limit: i64) -> StoreResult<Vec<Job>>;

    /// Count all jobs.
    async fn count_jobs(&self) -> StoreResult<i64>;

    /// Persist a wake for a job.
    async fn schedule_wake(&self, job_id: Uuid, wake_at: DateTime<Utc>) -> StoreResult<Wake>;

    /// Wakes due at or before `now`, oldest first.
    async fn due_wakes(&self, now: DateTime<Utc>, limit: i64) -> StoreResult<Vec<Wake>>;

    /// Delete a delivered wake.
    ///
    /// Called only after the wake has been handled, so an interrupted
    /// handler leaves the wake in place for redelivery (at-least-once).
    async fn complete_wake(&self, wake_id: Uuid) -> StoreResult<()>;

    /// Non-terminal jobs with no pending wake, for the recovery sweep.
    async fn jobs_without_wakes(&self) -> StoreResult<Vec<Uuid>>;

    /// Whether the backing storage is reachable.
    async fn health(&self) -> bool;
}
