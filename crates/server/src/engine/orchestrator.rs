//! Job orchestration engine.
//!
//! Drives a single job forward when a wake fires:
//! - Loads the job and returns immediately if it is terminal
//! - Runs stage handlers, each making at most one provider call
//! - Persists every mutation through the store's compare-and-set before
//!   the next handler runs
//!
//! A compare-and-set conflict means another writer is driving the job;
//! this orchestrator abandons the wake and lets the other writer win.
//! Durable wakes plus the terminal check make duplicate delivery
//! harmless.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::db::models::{FailureCode, Job, JobStage};
use crate::providers::{PollStatus, Providers};
use crate::store::{JobStore, StoreError, StoreResult};

/// What a stage handler decided.
enum Next {
    /// Run the next stage handler immediately.
    Continue,
    /// Wait for a wake after the given delay.
    Suspend(Duration),
    /// The job reached a terminal stage.
    Done,
}

/// Drives jobs through the pipeline.
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn JobStore>,
    providers: Providers,
    config: PipelineConfig,
}

impl Orchestrator {
    /// Create a new orchestrator.
    pub fn new(store: Arc<dyn JobStore>, providers: Providers, config: PipelineConfig) -> Self {
        Self {
            store,
            providers,
            config,
        }
    }

    /// Run one job as far as it can go right now.
    ///
    /// This is the wake entry point. It loops through stage handlers
    /// until the job suspends on a delay or reaches a terminal stage,
    /// persisting after every handler. Safe to call any number of
    /// times for the same job.
    pub async fn run_job(&self, id: Uuid) -> StoreResult<()> {
        let mut job = self.store.get_job(id).await?;

        loop {
            if job.is_terminal() {
                debug!(job_id = %job.id, stage = %job.stage, "Job already terminal, nothing to do");
                return Ok(());
            }

            let next = self.step(&mut job).await?;

            job = match self.store.update_job(&job).await {
                Ok(updated) => updated,
                Err(StoreError::Conflict(_)) => {
                    warn!(
                        job_id = %job.id,
                        stage = %job.stage,
                        "Concurrent update detected, abandoning this wake"
                    );
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            match next {
                Next::Continue => continue,
                Next::Suspend(delay) => {
                    self.schedule_wake(job.id, delay).await?;
                    return Ok(());
                }
                Next::Done => {
                    info!(job_id = %job.id, stage = %job.stage, "Job reached terminal stage");
                    return Ok(());
                }
            }
        }
    }

    /// Persist a wake for the job after `delay`.
    async fn schedule_wake(&self, job_id: Uuid, delay: Duration) -> StoreResult<()> {
        let wake_at = Utc::now() + chrono::Duration::milliseconds(delay.as_millis() as i64);
        self.store.schedule_wake(job_id, wake_at).await?;
        debug!(job_id = %job_id, wake_at = %wake_at, "Wake scheduled");
        Ok(())
    }

    /// Run the handler for the job's current stage. Each handler makes
    /// at most one provider call and only mutates the in-memory job;
    /// the caller persists.
    async fn step(&self, job: &mut Job) -> StoreResult<Next> {
        match job.stage {
            JobStage::Created => {
                job.advance(JobStage::Uploading);
                Ok(Next::Continue)
            }
            JobStage::Uploading => Ok(self.step_upload(job).await),
            JobStage::TranscriptionStarting => Ok(self.step_start_transcription(job).await),
            JobStage::TranscriptionPolling => self.step_poll_transcription(job).await,
            JobStage::TranscriptionDone => {
                job.advance(JobStage::Summarizing);
                Ok(Next::Continue)
            }
            JobStage::Summarizing => self.step_summarize(job).await,
            JobStage::Completed | JobStage::Failed => Ok(Next::Done),
        }
    }

    /// Stage the client-supplied audio. Staging failures are terminal:
    /// there is no retry for a reference we cannot read.
    async fn step_upload(&self, job: &mut Job) -> Next {
        match self.providers.media.stage(&job.input_ref).await {
            Ok(staged_ref) => {
                info!(job_id = %job.id, "Audio staged for transcription");
                job.input_ref = staged_ref;
                job.advance(JobStage::TranscriptionStarting);
                Next::Continue
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Audio staging failed");
                job.fail(FailureCode::UploadError, e.to_string());
                Next::Done
            }
        }
    }

    /// Ask the provider to begin transcribing. Start errors are retried
    /// with exponential backoff up to the configured attempt budget.
    async fn step_start_transcription(&self, job: &mut Job) -> Next {
        job.attempts += 1;

        match self.providers.transcription.start(&job.input_ref).await {
            Ok(handle) => {
                let now = Utc::now();
                let deadline = now
                    + chrono::Duration::milliseconds(
                        self.config.max_transcription_wait().as_millis() as i64,
                    );
                info!(job_id = %job.id, handle = %handle, deadline = %deadline, "Transcription started");
                job.transcription_handle = Some(handle);
                job.started_at = Some(now);
                job.stage_deadline = Some(deadline);
                job.advance(JobStage::TranscriptionPolling);
                Next::Suspend(self.config.poll_interval())
            }
            Err(e) if job.attempts >= self.config.max_start_attempts as i32 => {
                warn!(
                    job_id = %job.id,
                    attempts = job.attempts,
                    error = %e,
                    "Transcription start attempts exhausted"
                );
                job.fail(
                    FailureCode::TranscriptionUnavailable,
                    format!(
                        "could not start transcription after {} attempts: {}",
                        job.attempts, e
                    ),
                );
                Next::Done
            }
            Err(e) => {
                let delay = self.config.retry_delay(job.attempts as u32);
                warn!(
                    job_id = %job.id,
                    attempt = job.attempts,
                    max_attempts = self.config.max_start_attempts,
                    error = %e,
                    "Transcription start failed, retrying"
                );
                Next::Suspend(delay)
            }
        }
    }

    /// Poll the running transcription. The poll happens before any
    /// clock check: a result returned by this call is honored even if
    /// the deadline has already passed. Only a poll that comes back
    /// empty-handed can turn into a timeout.
    async fn step_poll_transcription(&self, job: &mut Job) -> StoreResult<Next> {
        let handle = job.transcription_handle.clone().ok_or_else(|| {
            StoreError::Corrupt(format!("job {} is polling without a transcription handle", job.id))
        })?;

        job.attempts += 1;

        match self.providers.transcription.poll(&handle).await {
            Ok(PollStatus::Succeeded(transcript)) => {
                info!(job_id = %job.id, chars = transcript.len(), "Transcript received");
                job.transcript = Some(transcript);
                job.advance(JobStage::TranscriptionDone);
                Ok(Next::Continue)
            }
            Ok(PollStatus::Failed(reason)) => {
                warn!(job_id = %job.id, reason = %reason, "Provider reported transcription failure");
                job.fail(FailureCode::TranscriptionError, reason);
                Ok(Next::Done)
            }
            Ok(PollStatus::Pending) => Ok(self.still_pending(job)),
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Transcription poll failed, treating as pending");
                Ok(self.still_pending(job))
            }
        }
    }

    /// A poll cycle came back without a result: time out at or past the
    /// deadline, otherwise schedule the next poll.
    fn still_pending(&self, job: &mut Job) -> Next {
        let now = Utc::now();
        if matches!(job.stage_deadline, Some(deadline) if now >= deadline) {
            warn!(job_id = %job.id, polls = job.attempts, "Transcription deadline passed");
            job.fail(
                FailureCode::TranscriptionTimeout,
                format!(
                    "transcription still pending after {} seconds",
                    self.config.max_transcription_wait_secs
                ),
            );
            Next::Done
        } else {
            Next::Suspend(self.config.poll_interval())
        }
    }

    /// Summarize the transcript. Invoke errors are retried with backoff
    /// up to the configured attempt budget.
    async fn step_summarize(&self, job: &mut Job) -> StoreResult<Next> {
        let transcript = job.transcript.clone().ok_or_else(|| {
            StoreError::Corrupt(format!("job {} is summarizing without a transcript", job.id))
        })?;

        job.attempts += 1;

        match self.providers.summarizer.invoke(&transcript).await {
            Ok(summary) => {
                info!(
                    job_id = %job.id,
                    action_items = summary.action_items.len(),
                    "Summary ready"
                );
                job.summary = Some(summary);
                job.advance(JobStage::Completed);
                Ok(Next::Done)
            }
            Err(e) if job.attempts >= self.config.max_summary_attempts as i32 => {
                warn!(
                    job_id = %job.id,
                    attempts = job.attempts,
                    error = %e,
                    "Summarization attempts exhausted"
                );
                job.fail(
                    FailureCode::SummaryUnavailable,
                    format!("summarization failed after {} attempts: {}", job.attempts, e),
                );
                Ok(Next::Done)
            }
            Err(e) => {
                let delay = self.config.retry_delay(job.attempts as u32);
                warn!(
                    job_id = %job.id,
                    attempt = job.attempts,
                    max_attempts = self.config.max_summary_attempts,
                    error = %e,
                    "Summarization failed, retrying"
                );
                Ok(Next::Suspend(delay))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Summary;
    use crate::providers::{
        MockMediaStore, MockSummarizer, MockTranscriptionClient, PollStatus, Providers,
    };
    use crate::store::MemoryStore;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            poll_interval_secs: 0,
            retry_base_delay_ms: 0,
            ..Default::default()
        }
    }

    fn make_providers(
        media: MockMediaStore,
        transcription: MockTranscriptionClient,
        summarizer: MockSummarizer,
    ) -> (
        Providers,
        Arc<MockMediaStore>,
        Arc<MockTranscriptionClient>,
        Arc<MockSummarizer>,
    ) {
        let media = Arc::new(media);
        let transcription = Arc::new(transcription);
        let summarizer = Arc::new(summarizer);
        let providers = Providers::new(media.clone(), transcription.clone(), summarizer.clone());
        (providers, media, transcription, summarizer)
    }

    /// Keep waking the job until it parks in a terminal stage.
    async fn drive_to_terminal(orchestrator: &Orchestrator, store: &Arc<MemoryStore>, id: Uuid) {
        for _ in 0..32 {
            if store.get_job(id).await.unwrap().is_terminal() {
                return;
            }
            orchestrator.run_job(id).await.unwrap();
        }
        panic!("job did not reach a terminal stage");
    }

    #[tokio::test]
    async fn test_happy_path_completes_with_summary() {
        let store = Arc::new(MemoryStore::new());
        let expected = Summary {
            summary: "short sync about launch".to_string(),
            action_items: vec!["book launch review".to_string()],
        };
        let (providers, media, transcription, summarizer) = make_providers(
            MockMediaStore::succeeding(),
            MockTranscriptionClient::scripted(
                vec![Ok("h1".to_string())],
                vec![
                    Ok(PollStatus::Pending),
                    Ok(PollStatus::Pending),
                    Ok(PollStatus::Succeeded("hello world".to_string())),
                ],
            ),
            MockSummarizer::succeeding_with(expected.clone()),
        );
        let orchestrator = Orchestrator::new(store.clone(), providers, test_config());

        let job = store.create_job("ref-1").await.unwrap();
        drive_to_terminal(&orchestrator, &store, job.id).await;

        let done = store.get_job(job.id).await.unwrap();
        assert_eq!(done.stage, JobStage::Completed);
        assert_eq!(done.input_ref, "staged://ref-1");
        assert_eq!(done.transcription_handle.as_deref(), Some("h1"));
        assert_eq!(done.transcript.as_deref(), Some("hello world"));
        assert_eq!(done.summary, Some(expected));
        assert!(done.started_at.is_some());
        assert!(done.stage_deadline.is_some());
        assert!(done.error.is_none());

        assert_eq!(media.calls(), 1);
        assert_eq!(transcription.start_calls(), 1);
        assert_eq!(transcription.poll_calls(), 3);
        assert_eq!(summarizer.calls(), 1);
    }

    #[tokio::test]
    async fn test_upload_failure_is_terminal_without_retry() {
        let store = Arc::new(MemoryStore::new());
        let (providers, media, _, summarizer) = make_providers(
            MockMediaStore::failing("bucket unreachable"),
            MockTranscriptionClient::succeeding("unused"),
            MockSummarizer::succeeding(),
        );
        let orchestrator = Orchestrator::new(store.clone(), providers, test_config());

        let job = store.create_job("ref-1").await.unwrap();
        drive_to_terminal(&orchestrator, &store, job.id).await;

        let failed = store.get_job(job.id).await.unwrap();
        assert_eq!(failed.stage, JobStage::Failed);
        let error = failed.error.unwrap();
        assert_eq!(error.code, FailureCode::UploadError);
        assert!(error.message.contains("bucket unreachable"));
        assert_eq!(media.calls(), 1);
        assert_eq!(summarizer.calls(), 0);
    }

    #[tokio::test]
    async fn test_start_failure_retries_exactly_to_budget() {
        let store = Arc::new(MemoryStore::new());
        let (providers, _, transcription, _) = make_providers(
            MockMediaStore::succeeding(),
            MockTranscriptionClient::failing_start("no capacity"),
            MockSummarizer::succeeding(),
        );
        let orchestrator = Orchestrator::new(store.clone(), providers, test_config());

        let job = store.create_job("ref-1").await.unwrap();
        drive_to_terminal(&orchestrator, &store, job.id).await;

        let failed = store.get_job(job.id).await.unwrap();
        assert_eq!(failed.stage, JobStage::Failed);
        assert_eq!(
            failed.error.as_ref().map(|e| e.code),
            Some(FailureCode::TranscriptionUnavailable)
        );
        assert_eq!(transcription.start_calls(), 3);

        // Further wakes must not call the provider again.
        orchestrator.run_job(job.id).await.unwrap();
        assert_eq!(transcription.start_calls(), 3);
    }

    #[tokio::test]
    async fn test_start_succeeds_after_transient_failures() {
        let store = Arc::new(MemoryStore::new());
        let (providers, _, transcription, _) = make_providers(
            MockMediaStore::succeeding(),
            MockTranscriptionClient::scripted(
                vec![
                    Err("busy".to_string()),
                    Err("busy".to_string()),
                    Ok("h1".to_string()),
                ],
                vec![Ok(PollStatus::Succeeded("hello world".to_string()))],
            ),
            MockSummarizer::succeeding(),
        );
        let orchestrator = Orchestrator::new(store.clone(), providers, test_config());

        let job = store.create_job("ref-1").await.unwrap();
        drive_to_terminal(&orchestrator, &store, job.id).await;

        let done = store.get_job(job.id).await.unwrap();
        assert_eq!(done.stage, JobStage::Completed);
        assert_eq!(transcription.start_calls(), 3);
    }

    #[tokio::test]
    async fn test_provider_reported_failure_is_terminal() {
        let store = Arc::new(MemoryStore::new());
        let (providers, _, transcription, summarizer) = make_providers(
            MockMediaStore::succeeding(),
            MockTranscriptionClient::scripted(
                vec![Ok("h1".to_string())],
                vec![Ok(PollStatus::Failed("audio track is empty".to_string()))],
            ),
            MockSummarizer::succeeding(),
        );
        let orchestrator = Orchestrator::new(store.clone(), providers, test_config());

        let job = store.create_job("ref-1").await.unwrap();
        drive_to_terminal(&orchestrator, &store, job.id).await;

        let failed = store.get_job(job.id).await.unwrap();
        assert_eq!(failed.stage, JobStage::Failed);
        let error = failed.error.unwrap();
        assert_eq!(error.code, FailureCode::TranscriptionError);
        assert!(error.message.contains("audio track is empty"));
        assert_eq!(transcription.poll_calls(), 1);
        assert_eq!(summarizer.calls(), 0);
    }

    #[tokio::test]
    async fn test_pending_past_deadline_times_out() {
        let store = Arc::new(MemoryStore::new());
        let (providers, _, transcription, _) = make_providers(
            MockMediaStore::succeeding(),
            MockTranscriptionClient::never_finishing(),
            MockSummarizer::succeeding(),
        );
        let config = PipelineConfig {
            max_transcription_wait_secs: 0,
            ..test_config()
        };
        let orchestrator = Orchestrator::new(store.clone(), providers, config);

        let job = store.create_job("ref-1").await.unwrap();
        drive_to_terminal(&orchestrator, &store, job.id).await;

        let failed = store.get_job(job.id).await.unwrap();
        assert_eq!(failed.stage, JobStage::Failed);
        assert_eq!(
            failed.error.as_ref().map(|e| e.code),
            Some(FailureCode::TranscriptionTimeout)
        );
        // The deadline check only runs after a poll came back pending.
        assert_eq!(transcription.poll_calls(), 1);
    }

    #[tokio::test]
    async fn test_result_on_poll_beats_expired_deadline() {
        let store = Arc::new(MemoryStore::new());
        let (providers, _, _, _) = make_providers(
            MockMediaStore::succeeding(),
            MockTranscriptionClient::scripted(
                vec![Ok("h1".to_string())],
                vec![Ok(PollStatus::Succeeded("made it just in time".to_string()))],
            ),
            MockSummarizer::succeeding(),
        );
        // Deadline expires immediately, but the first poll returns a
        // result, which always wins over the clock.
        let config = PipelineConfig {
            max_transcription_wait_secs: 0,
            ..test_config()
        };
        let orchestrator = Orchestrator::new(store.clone(), providers, config);

        let job = store.create_job("ref-1").await.unwrap();
        drive_to_terminal(&orchestrator, &store, job.id).await;

        let done = store.get_job(job.id).await.unwrap();
        assert_eq!(done.stage, JobStage::Completed);
        assert_eq!(done.transcript.as_deref(), Some("made it just in time"));
    }

    #[tokio::test]
    async fn test_poll_transport_error_treated_as_pending() {
        let store = Arc::new(MemoryStore::new());
        let (providers, _, transcription, _) = make_providers(
            MockMediaStore::succeeding(),
            MockTranscriptionClient::scripted(
                vec![Ok("h1".to_string())],
                vec![
                    Err("bad gateway".to_string()),
                    Ok(PollStatus::Succeeded("hello world".to_string())),
                ],
            ),
            MockSummarizer::succeeding(),
        );
        let orchestrator = Orchestrator::new(store.clone(), providers, test_config());

        let job = store.create_job("ref-1").await.unwrap();
        drive_to_terminal(&orchestrator, &store, job.id).await;

        let done = store.get_job(job.id).await.unwrap();
        assert_eq!(done.stage, JobStage::Completed);
        assert_eq!(transcription.poll_calls(), 2);
    }

    #[tokio::test]
    async fn test_summary_failure_retries_to_budget() {
        let store = Arc::new(MemoryStore::new());
        let (providers, _, _, summarizer) = make_providers(
            MockMediaStore::succeeding(),
            MockTranscriptionClient::succeeding("hello world"),
            MockSummarizer::failing("model overloaded"),
        );
        let orchestrator = Orchestrator::new(store.clone(), providers, test_config());

        let job = store.create_job("ref-1").await.unwrap();
        drive_to_terminal(&orchestrator, &store, job.id).await;

        let failed = store.get_job(job.id).await.unwrap();
        assert_eq!(failed.stage, JobStage::Failed);
        assert_eq!(
            failed.error.as_ref().map(|e| e.code),
            Some(FailureCode::SummaryUnavailable)
        );
        assert_eq!(summarizer.calls(), 3);
        // Transcript is kept even though summarization gave up.
        assert_eq!(failed.transcript.as_deref(), Some("hello world"));
    }

    #[tokio::test]
    async fn test_summary_retry_then_success() {
        let store = Arc::new(MemoryStore::new());
        let expected = Summary {
            summary: "recovered".to_string(),
            action_items: vec![],
        };
        let (providers, _, _, summarizer) = make_providers(
            MockMediaStore::succeeding(),
            MockTranscriptionClient::succeeding("hello world"),
            MockSummarizer::scripted(vec![
                Err("model overloaded".to_string()),
                Ok(expected.clone()),
            ]),
        );
        let orchestrator = Orchestrator::new(store.clone(), providers, test_config());

        let job = store.create_job("ref-1").await.unwrap();
        drive_to_terminal(&orchestrator, &store, job.id).await;

        let done = store.get_job(job.id).await.unwrap();
        assert_eq!(done.stage, JobStage::Completed);
        assert_eq!(done.summary, Some(expected));
        assert_eq!(summarizer.calls(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_wake_after_terminal_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let (providers, media, _, summarizer) = make_providers(
            MockMediaStore::succeeding(),
            MockTranscriptionClient::succeeding("hello world"),
            MockSummarizer::succeeding(),
        );
        let orchestrator = Orchestrator::new(store.clone(), providers, test_config());

        let job = store.create_job("ref-1").await.unwrap();
        drive_to_terminal(&orchestrator, &store, job.id).await;

        let done = store.get_job(job.id).await.unwrap();
        let version = done.version;
        let media_calls = media.calls();
        let summarizer_calls = summarizer.calls();

        // Redelivered wakes must not touch the job or the providers.
        orchestrator.run_job(job.id).await.unwrap();
        orchestrator.run_job(job.id).await.unwrap();

        let after = store.get_job(job.id).await.unwrap();
        assert_eq!(after.version, version);
        assert_eq!(after.stage, JobStage::Completed);
        assert_eq!(media.calls(), media_calls);
        assert_eq!(summarizer.calls(), summarizer_calls);
    }

    #[tokio::test]
    async fn test_stages_only_move_forward() {
        let store = Arc::new(MemoryStore::new());
        let (providers, _, _, _) = make_providers(
            MockMediaStore::succeeding(),
            MockTranscriptionClient::scripted(
                vec![Ok("h1".to_string())],
                vec![
                    Ok(PollStatus::Pending),
                    Ok(PollStatus::Succeeded("hello world".to_string())),
                ],
            ),
            MockSummarizer::succeeding(),
        );
        let orchestrator = Orchestrator::new(store.clone(), providers, test_config());

        let job = store.create_job("ref-1").await.unwrap();
        let mut last_order = store.get_job(job.id).await.unwrap().stage.order();

        for _ in 0..16 {
            if store.get_job(job.id).await.unwrap().is_terminal() {
                break;
            }
            orchestrator.run_job(job.id).await.unwrap();
            let order = store.get_job(job.id).await.unwrap().stage.order();
            assert!(order >= last_order, "stage moved backward");
            last_order = order;
        }

        assert_eq!(
            store.get_job(job.id).await.unwrap().stage,
            JobStage::Completed
        );
    }

    #[tokio::test]
    async fn test_restart_resumes_from_persisted_state() {
        let store = Arc::new(MemoryStore::new());
        let (providers, _, _, _) = make_providers(
            MockMediaStore::succeeding(),
            MockTranscriptionClient::scripted(
                vec![Ok("h1".to_string())],
                vec![Ok(PollStatus::Pending)],
            ),
            MockSummarizer::succeeding(),
        );
        let orchestrator = Orchestrator::new(store.clone(), providers, test_config());

        let job = store.create_job("ref-1").await.unwrap();
        // First process: gets the job parked in transcription_polling.
        orchestrator.run_job(job.id).await.unwrap();
        orchestrator.run_job(job.id).await.unwrap();
        let parked = store.get_job(job.id).await.unwrap();
        assert_eq!(parked.stage, JobStage::TranscriptionPolling);
        drop(orchestrator);

        // Second process over the same store: replaying the wake picks
        // the job up from persisted state and finishes it.
        let (providers, _, transcription, _) = make_providers(
            MockMediaStore::succeeding(),
            MockTranscriptionClient::scripted(
                vec![],
                vec![Ok(PollStatus::Succeeded("hello world".to_string()))],
            ),
            MockSummarizer::succeeding(),
        );
        let restarted = Orchestrator::new(store.clone(), providers, test_config());
        drive_to_terminal(&restarted, &store, job.id).await;

        let done = store.get_job(job.id).await.unwrap();
        assert_eq!(done.stage, JobStage::Completed);
        assert_eq!(done.transcript.as_deref(), Some("hello world"));
        // Resumed at polling: the restarted process never re-staged or
        // re-started the transcription.
        assert_eq!(transcription.start_calls(), 0);
    }

    #[tokio::test]
    async fn test_suspend_schedules_a_wake() {
        let store = Arc::new(MemoryStore::new());
        let (providers, _, _, _) = make_providers(
            MockMediaStore::succeeding(),
            MockTranscriptionClient::never_finishing(),
            MockSummarizer::succeeding(),
        );
        let orchestrator = Orchestrator::new(store.clone(), providers, test_config());

        let job = store.create_job("ref-1").await.unwrap();
        orchestrator.run_job(job.id).await.unwrap();

        let due = store
            .due_wakes(Utc::now() + chrono::Duration::seconds(1), 10)
            .await
            .unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].job_id, job.id);
    }

    #[tokio::test]
    async fn test_polling_without_handle_is_corrupt() {
        let store = Arc::new(MemoryStore::new());
        let (providers, _, _, _) = make_providers(
            MockMediaStore::succeeding(),
            MockTranscriptionClient::succeeding("unused"),
            MockSummarizer::succeeding(),
        );
        let orchestrator = Orchestrator::new(store.clone(), providers, test_config());

        let mut job = store.create_job("ref-1").await.unwrap();
        job.stage = JobStage::TranscriptionPolling;
        store.update_job(&job).await.unwrap();

        let err = orchestrator.run_job(job.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_missing_job_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let (providers, _, _, _) = make_providers(
            MockMediaStore::succeeding(),
            MockTranscriptionClient::succeeding("unused"),
            MockSummarizer::succeeding(),
        );
        let orchestrator = Orchestrator::new(store.clone(), providers, test_config());

        let err = orchestrator.run_job(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
