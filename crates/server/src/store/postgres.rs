//! PostgreSQL-backed job store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::db::models::{Job, Wake};
use crate::db::queries;
use crate::db::{self, DbPool};
use crate::store::{JobStore, StoreResult};

/// Schema statements run at startup. All idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS jobs (
        id UUID PRIMARY KEY,
        stage TEXT NOT NULL,
        input_ref TEXT NOT NULL,
        transcription_handle TEXT,
        transcript TEXT,
        summary JSONB,
        attempts INTEGER NOT NULL DEFAULT 0,
        started_at TIMESTAMPTZ,
        stage_deadline TIMESTAMPTZ,
        error_code TEXT,
        error_message TEXT,
        version BIGINT NOT NULL DEFAULT 1,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS job_wakes (
        id UUID PRIMARY KEY,
        job_id UUID NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
        wake_at TIMESTAMPTZ NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"CREATE INDEX IF NOT EXISTS idx_job_wakes_wake_at ON job_wakes (wake_at)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_job_wakes_job_id ON job_wakes (job_id)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_jobs_created_at ON jobs (created_at)"#,
];

/// Job store backed by PostgreSQL.
#[derive(Clone)]
pub struct PostgresStore {
    pool: DbPool,
}

impl PostgresStore {
    /// Connect to the database, run the schema statements, and return
    /// the store.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = db::create_pool(config).await?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Wrap an existing pool without touching the schema.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Run the idempotent schema statements.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::debug!("Job store schema ensured");
        Ok(())
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl JobStore for PostgresStore {
    async fn create_job(&self, input_ref: &str) -> StoreResult<Job> {
        queries::job::insert_job(&self.pool, input_ref).await
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<Job> {
        queries::job::get_job(&self.pool, id).await
    }

    async fn update_job(&self, job: &Job) -> StoreResult<Job> {
        queries::job::update_job(&self.pool, job).await
    }

    async fn list_jobs(&self, limit: i64) -> StoreResult<Vec<Job>> {
        queries::job::list_jobs(&self.pool, limit).await
    }

    async fn count_jobs(&self) -> StoreResult<i64> {
        queries::job::count_jobs(&self.pool).await
    }

    async fn schedule_wake(&self, job_id: Uuid, wake_at: DateTime<Utc>) -> StoreResult<Wake> {
        queries::wake::insert_wake(&self.pool, job_id, wake_at).await
    }

    async fn due_wakes(&self, now: DateTime<Utc>, limit: i64) -> StoreResult<Vec<Wake>> {
        queries::wake::due_wakes(&self.pool, now, limit).await
    }

    async fn complete_wake(&self, wake_id: Uuid) -> StoreResult<()> {
        queries::wake::delete_wake(&self.pool, wake_id).await
    }

    async fn jobs_without_wakes(&self) -> StoreResult<Vec<Uuid>> {
        queries::job::jobs_without_wakes(&self.pool).await
    }

    async fn health(&self) -> bool {
        db::pool::health_check(&self.pool).await
    }
}
