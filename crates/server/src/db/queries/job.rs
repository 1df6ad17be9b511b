//! Job database queries.

use chrono::Utc;
use uuid::Uuid;

use crate::db::models::{Job, JobRow, JobStage};
use crate::db::DbPool;
use crate::store::{StoreError, StoreResult};

const JOB_COLUMNS: &str = "id, stage, input_ref, transcription_handle, transcript, summary, \
     attempts, started_at, stage_deadline, error_code, error_message, \
     version, created_at, updated_at";

fn into_job(row: JobRow) -> StoreResult<Job> {
    Job::try_from(row).map_err(StoreError::Corrupt)
}

/// Insert a new job in the `created` stage with version 1.
pub async fn insert_job(pool: &DbPool, input_ref: &str) -> StoreResult<Job> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, JobRow>(&format!(
        r#"
        INSERT INTO jobs (id, stage, input_ref, attempts, version, created_at, updated_at)
        VALUES ($1, $2, $3, 0, 1, $4, $4)
        RETURNING {}
        "#,
        JOB_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(JobStage::Created.to_string())
    .bind(input_ref)
    .bind(now)
    .fetch_one(pool)
    .await?;

    into_job(row)
}

/// Get a job by id.
pub async fn get_job(pool: &DbPool, id: Uuid) -> StoreResult<Job> {
    let row = sqlx::query_as::<_, JobRow>(&format!(
        r#"
        SELECT {}
        FROM jobs
        WHERE id = $1
        "#,
        JOB_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound(id))?;

    into_job(row)
}

/// Compare-and-set update of a job.
///
/// The write applies only when the stored version matches `job.version`
/// and the stored stage is not terminal; the stored version is
/// incremented in the same statement. A terminal job is returned
/// unchanged, a version mismatch is a conflict.
pub async fn update_job(pool: &DbPool, job: &Job) -> StoreResult<Job> {
    let summary = match &job.summary {
        Some(s) => Some(serde_json::to_value(s).map_err(|e| StoreError::Corrupt(e.to_string()))?),
        None => None,
    };

    let updated = sqlx::query_as::<_, JobRow>(&format!(
        r#"
        UPDATE jobs
        SET stage = $3,
            input_ref = $4,
            transcription_handle = $5,
            transcript = $6,
            summary = $7,
            attempts = $8,
            started_at = $9,
            stage_deadline = $10,
            error_code = $11,
            error_message = $12,
            version = version + 1,
            updated_at = $13
        WHERE id = $1 AND version = $2 AND stage NOT IN ('completed', 'failed')
        RETURNING {}
        "#,
        JOB_COLUMNS
    ))
    .bind(job.id)
    .bind(job.version)
    .bind(job.stage.to_string())
    .bind(&job.input_ref)
    .bind(&job.transcription_handle)
    .bind(&job.transcript)
    .bind(summary)
    .bind(job.attempts)
    .bind(job.started_at)
    .bind(job.stage_deadline)
    .bind(job.error.as_ref().map(|e| e.code.to_string()))
    .bind(job.error.as_ref().map(|e| e.message.clone()))
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(row) => into_job(row),
        None => {
            // Zero rows means the job is gone, already terminal, or the
            // version moved under us. Re-read to tell which.
            let current = get_job(pool, job.id).await?;
            if current.is_terminal() {
                Ok(current)
            } else {
                Err(StoreError::Conflict(job.id))
            }
        }
    }
}

/// List jobs, newest first.
pub async fn list_jobs(pool: &DbPool, limit: i64) -> StoreResult<Vec<Job>> {
    let rows = sqlx::query_as::<_, JobRow>(&format!(
        r#"
        SELECT {}
        FROM jobs
        ORDER BY created_at DESC
        LIMIT $1
        "#,
        JOB_COLUMNS
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(into_job).collect()
}

/// Count all jobs.
pub async fn count_jobs(pool: &DbPool) -> StoreResult<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs")
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

/// Non-terminal jobs that have no pending wake.
///
/// These are jobs stranded by a crash between a state write and the
/// follow-up wake insert; the recovery sweep reschedules them.
pub async fn jobs_without_wakes(pool: &DbPool) -> StoreResult<Vec<Uuid>> {
    let ids: Vec<Uuid> = sqlx::query_scalar(
        r#"
        SELECT j.id
        FROM jobs j
        WHERE j.stage NOT IN ('completed', 'failed')
          AND NOT EXISTS (SELECT 1 FROM job_wakes w WHERE w.job_id = j.id)
        ORDER BY j.created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
