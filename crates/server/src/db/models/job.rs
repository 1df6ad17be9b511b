//! Job model for the recording summarization pipeline.
//!
//! A job is the unit of work: one uploaded recording moving through
//! upload, transcription, and summarization. All persisted state lives
//! on the job row; progress between stages is driven by durable wakes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Pipeline stages, in forward order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    /// Job accepted, nothing done yet
    Created,
    /// Staging the audio for the transcription provider
    Uploading,
    /// Asking the provider to begin transcription
    TranscriptionStarting,
    /// Waiting on the provider, polling for a result
    TranscriptionPolling,
    /// Transcript received, summarization not yet started
    TranscriptionDone,
    /// Calling the summarizer
    Summarizing,
    /// Terminal: summary available
    Completed,
    /// Terminal: pipeline gave up, error recorded
    Failed,
}

impl JobStage {
    /// Whether the stage is terminal. Terminal jobs are never modified again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Completed | JobStage::Failed)
    }

    /// Position in the forward stage order. `Failed` sorts last since it
    /// is reachable from anywhere.
    pub fn order(&self) -> u8 {
        match self {
            JobStage::Created => 0,
            JobStage::Uploading => 1,
            JobStage::TranscriptionStarting => 2,
            JobStage::TranscriptionPolling => 3,
            JobStage::TranscriptionDone => 4,
            JobStage::Summarizing => 5,
            JobStage::Completed => 6,
            JobStage::Failed => 7,
        }
    }
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStage::Created => "created",
            JobStage::Uploading => "uploading",
            JobStage::TranscriptionStarting => "transcription_starting",
            JobStage::TranscriptionPolling => "transcription_polling",
            JobStage::TranscriptionDone => "transcription_done",
            JobStage::Summarizing => "summarizing",
            JobStage::Completed => "completed",
            JobStage::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for JobStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(JobStage::Created),
            "uploading" => Ok(JobStage::Uploading),
            "transcription_starting" => Ok(JobStage::TranscriptionStarting),
            "transcription_polling" => Ok(JobStage::TranscriptionPolling),
            "transcription_done" => Ok(JobStage::TranscriptionDone),
            "summarizing" => Ok(JobStage::Summarizing),
            "completed" => Ok(JobStage::Completed),
            "failed" => Ok(JobStage::Failed),
            other => Err(format!("unknown job stage: {}", other)),
        }
    }
}

/// Machine-readable reasons a job can fail.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    /// Staging the audio failed
    UploadError,
    /// Transcription could not be started within the attempt budget
    TranscriptionUnavailable,
    /// Transcription stayed pending past the deadline
    TranscriptionTimeout,
    /// The provider reported the transcription failed
    TranscriptionError,
    /// Summarization failed within the attempt budget
    SummaryUnavailable,
}

impl std::fmt::Display for FailureCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureCode::UploadError => "upload_error",
            FailureCode::TranscriptionUnavailable => "transcription_unavailable",
            FailureCode::TranscriptionTimeout => "transcription_timeout",
            FailureCode::TranscriptionError => "transcription_error",
            FailureCode::SummaryUnavailable => "summary_unavailable",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for FailureCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload_error" => Ok(FailureCode::UploadError),
            "transcription_unavailable" => Ok(FailureCode::TranscriptionUnavailable),
            "transcription_timeout" => Ok(FailureCode::TranscriptionTimeout),
            "transcription_error" => Ok(FailureCode::TranscriptionError),
            "summary_unavailable" => Ok(FailureCode::SummaryUnavailable),
            other => Err(format!("unknown failure code: {}", other)),
        }
    }
}

/// Final pipeline output: summary text plus extracted action items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Summary {
    /// Summary text.
    pub summary: String,

    /// Action items extracted from the transcript.
    pub action_items: Vec<String>,
}

/// Terminal failure recorded on the job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobError {
    /// Machine-readable failure code.
    pub code: FailureCode,

    /// Human-readable message.
    pub message: String,
}

impl JobError {
    pub fn new<S: Into<String>>(code: FailureCode, message: S) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// A recording summarization job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier.
    pub id: Uuid,

    /// Current pipeline stage.
    pub stage: JobStage,

    /// Reference to the audio: the client-supplied source until upload,
    /// the canonical staged reference afterwards.
    pub input_ref: String,

    /// Provider handle for the running transcription.
    pub transcription_handle: Option<String>,

    /// Full transcript text, once transcription succeeded.
    pub transcript: Option<String>,

    /// Final summary, once the job completed.
    pub summary: Option<Summary>,

    /// Provider calls made within the current stage. Reset on advance.
    pub attempts: i32,

    /// When transcription started.
    pub started_at: Option<DateTime<Utc>>,

    /// Instant after which a still-pending transcription times out.
    pub stage_deadline: Option<DateTime<Utc>>,

    /// Terminal failure, set only in the `Failed` stage.
    pub error: Option<JobError>,

    /// Compare-and-set version. Incremented by every successful update.
    pub version: i64,

    /// When the job was created.
    pub created_at: DateTime<Utc>,

    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Whether the job is in a terminal stage.
    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Move to the next stage, resetting the per-stage attempt counter.
    pub fn advance(&mut self, stage: JobStage) {
        self.stage = stage;
        self.attempts = 0;
    }

    /// Mark the job failed with the given code and message.
    pub fn fail<S: Into<String>>(&mut self, code: FailureCode, message: S) {
        self.stage = JobStage::Failed;
        self.error = Some(JobError::new(code, message));
    }
}

/// Raw database row for a job. Stage and error fields are stored as
/// text and the summary as JSONB; conversion into [`Job`] validates them.
#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub stage: String,
    pub input_ref: String,
    pub transcription_handle: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<serde_json::Value>,
    pub attempts: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub stage_deadline: Option<DateTime<Utc>>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = String;

    fn try_from(row: JobRow) -> Result<Self, String> {
        let stage: JobStage = row.stage.parse()?;

        let summary = match row.summary {
            Some(value) => Some(
                serde_json::from_value::<Summary>(value)
                    .map_err(|e| format!("invalid summary payload: {}", e))?,
            ),
            None => None,
        };

        let error = match row.error_code {
            Some(code) => {
                let code: FailureCode = code.parse()?;
                Some(JobError {
                    code,
                    message: row.error_message.unwrap_or_default(),
                })
            }
            None => None,
        };

        Ok(Job {
            id: row.id,
            stage,
            input_ref: row.input_ref,
            transcription_handle: row.transcription_handle,
            transcript: row.transcript,
            summary,
            attempts: row.attempts,
            started_at: row.started_at,
            stage_deadline: row.stage_deadline,
            error,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_row(stage: &str) -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            stage: stage.to_string(),
            input_ref: "s3://recordings/standup.wav".to_string(),
            transcription_handle: None,
            transcript: None,
            summary: None,
            attempts: 0,
            started_at: None,
            stage_deadline: None,
            error_code: None,
            error_message: None,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(JobStage::Created.to_string(), "created");
        assert_eq!(
            JobStage::TranscriptionPolling.to_string(),
            "transcription_polling"
        );
        assert_eq!(JobStage::Completed.to_string(), "completed");
    }

    #[test]
    fn test_stage_parse_round_trip() {
        for stage in [
            JobStage::Created,
            JobStage::Uploading,
            JobStage::TranscriptionStarting,
            JobStage::TranscriptionPolling,
            JobStage::TranscriptionDone,
            JobStage::Summarizing,
            JobStage::Completed,
            JobStage::Failed,
        ] {
            assert_eq!(stage.to_string().parse::<JobStage>(), Ok(stage));
        }
    }

    #[test]
    fn test_stage_parse_rejects_unknown() {
        assert!("archived".parse::<JobStage>().is_err());
    }

    #[test]
    fn test_terminal_stages() {
        assert!(JobStage::Completed.is_terminal());
        assert!(JobStage::Failed.is_terminal());
        assert!(!JobStage::TranscriptionPolling.is_terminal());
    }

    #[test]
    fn test_stage_order_is_forward() {
        assert!(JobStage::Created.order() < JobStage::Uploading.order());
        assert!(JobStage::Uploading.order() < JobStage::TranscriptionStarting.order());
        assert!(JobStage::TranscriptionStarting.order() < JobStage::TranscriptionPolling.order());
        assert!(JobStage::TranscriptionPolling.order() < JobStage::TranscriptionDone.order());
        assert!(JobStage::TranscriptionDone.order() < JobStage::Summarizing.order());
        assert!(JobStage::Summarizing.order() < JobStage::Completed.order());
    }

    #[test]
    fn test_failure_code_display() {
        assert_eq!(FailureCode::UploadError.to_string(), "upload_error");
        assert_eq!(
            FailureCode::TranscriptionTimeout.to_string(),
            "transcription_timeout"
        );
    }

    #[test]
    fn test_row_conversion() {
        let mut row = make_row("transcription_polling");
        row.transcription_handle = Some("op-42".to_string());
        let job = Job::try_from(row).unwrap();
        assert_eq!(job.stage, JobStage::TranscriptionPolling);
        assert_eq!(job.transcription_handle.as_deref(), Some("op-42"));
    }

    #[test]
    fn test_row_conversion_rejects_bad_stage() {
        let row = make_row("uploading2");
        assert!(Job::try_from(row).is_err());
    }

    #[test]
    fn test_row_conversion_parses_summary() {
        let mut row = make_row("completed");
        row.summary = Some(serde_json::json!({
            "summary": "Weekly standup recap",
            "action_items": ["ship the release", "update the runbook"]
        }));
        let job = Job::try_from(row).unwrap();
        let summary = job.summary.unwrap();
        assert_eq!(summary.summary, "Weekly standup recap");
        assert_eq!(summary.action_items.len(), 2);
    }

    #[test]
    fn test_fail_sets_stage_and_error() {
        let mut job = Job::try_from(make_row("uploading")).unwrap();
        job.fail(FailureCode::UploadError, "bucket unreachable");
        assert_eq!(job.stage, JobStage::Failed);
        assert_eq!(
            job.error.as_ref().map(|e| e.code),
            Some(FailureCode::UploadError)
        );
    }
}
