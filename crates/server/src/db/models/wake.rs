//! Durable wake model.
//!
//! A wake is a persisted instruction to run the orchestrator for a job
//! at or after a given instant. Wakes survive restarts; delivery is
//! at-least-once and a wake is deleted only after it has been handled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A scheduled wake for a job.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Wake {
    /// Wake identifier.
    pub id: Uuid,

    /// Job to run when the wake fires.
    pub job_id: Uuid,

    /// Earliest instant the wake may fire.
    pub wake_at: DateTime<Utc>,

    /// When the wake was scheduled.
    pub created_at: DateTime<Utc>,
}
