//! Job submission and status API handlers.
//!
//! Handles accepting new recordings and reporting pipeline progress.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{Job, JobError, JobStage, Summary};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Request to submit a new job.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobRequest {
    /// Reference to the audio recording, as understood by the media store.
    pub input_ref: String,
}

impl CreateJobRequest {
    fn validate(&self) -> AppResult<()> {
        if self.input_ref.trim().is_empty() {
            return Err(AppError::Validation(
                "input_ref must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Response for a newly accepted job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobResponse {
    pub id: Uuid,
    pub status_url: String,
}

/// Job status as reported to clients.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatusResponse {
    pub id: Uuid,
    pub stage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        // Intermediate artifacts stay internal: a summary is only
        // reported once the job completed, an error once it failed.
        let summary = match job.stage {
            JobStage::Completed => job.summary,
            _ => None,
        };
        let error = match job.stage {
            JobStage::Failed => job.error,
            _ => None,
        };

        Self {
            id: job.id,
            stage: job.stage.to_string(),
            summary,
            error,
        }
    }
}

/// Query parameters for listing jobs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListJobsQuery {
    pub limit: Option<i64>,
}

/// Response for listing jobs.
#[derive(Debug, Clone, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobStatusResponse>,
    pub total: i64,
}

/// Submit a new job.
///
/// POST /jobs
pub async fn create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> AppResult<(StatusCode, Json<CreateJobResponse>)> {
    request.validate()?;

    let job = state.store.create_job(request.input_ref.trim()).await?;
    state.store.schedule_wake(job.id, Utc::now()).await?;

    tracing::info!(job_id = %job.id, "Job accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateJobResponse {
            id: job.id,
            status_url: format!("/jobs/{}", job.id),
        }),
    ))
}

/// Get job status.
///
/// GET /jobs/{job_id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> AppResult<Json<JobStatusResponse>> {
    let job = state.store.get_job(job_id).await?;
    Ok(Json(JobStatusResponse::from(job)))
}

/// List recent jobs.
///
/// GET /jobs
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> AppResult<Json<JobListResponse>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);

    let jobs = state.store.list_jobs(limit).await?;
    let total = state.store.count_jobs().await?;

    Ok(Json(JobListResponse {
        jobs: jobs.into_iter().map(JobStatusResponse::from).collect(),
        total,
    }))
}
