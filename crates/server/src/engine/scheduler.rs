//! Wake dispatch and recovery.
//!
//! The scheduler polls the wake table and hands due jobs to the
//! orchestrator. A wake is only completed after the job ran
//! successfully, so delivery is at-least-once: a crash between run and
//! completion redelivers the wake, and the orchestrator's terminal
//! check absorbs the duplicate.
//!
//! A periodic recovery sweep finds non-terminal jobs that lost their
//! wake (a crash between persisting the job and persisting its wake)
//! and schedules an immediate one.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::engine::Orchestrator;
use crate::result_ext::ResultExt;
use crate::store::{JobStore, StoreResult};

/// Background wake dispatcher.
pub struct Scheduler {
    /// Persistent store holding jobs and wakes.
    store: Arc<dyn JobStore>,

    /// Engine that advances a job when its wake fires.
    orchestrator: Orchestrator,

    /// Pipeline timing knobs.
    config: PipelineConfig,
}

impl Scheduler {
    /// Create a new scheduler.
    pub fn new(
        store: Arc<dyn JobStore>,
        orchestrator: Orchestrator,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            orchestrator,
            config,
        }
    }

    /// Run the dispatch and recovery loops until the process exits.
    pub async fn run(self) {
        let mut dispatch = tokio::time::interval(self.config.dispatch_interval());
        let mut recovery = tokio::time::interval(self.config.recovery_interval());
        // The first recovery tick fires immediately, which doubles as
        // the startup sweep for jobs stranded by a previous crash.

        loop {
            tokio::select! {
                _ = dispatch.tick() => {
                    let _ = self.dispatch_once().await.log("Wake dispatch failed");
                }
                _ = recovery.tick() => {
                    let _ = self.recover().await.log_warn("Recovery sweep failed");
                }
            }
        }
    }

    /// Dispatch one batch of due wakes. Returns how many were handled
    /// to completion.
    pub async fn dispatch_once(&self) -> StoreResult<usize> {
        let wakes = self
            .store
            .due_wakes(Utc::now(), self.config.wake_batch_size)
            .await?;

        if wakes.is_empty() {
            return Ok(0);
        }

        debug!(count = wakes.len(), "Dispatching due wakes");

        // A job can carry several due wakes, for example when the
        // recovery sweep raced a scheduled one. Run the job once per
        // pass on the earliest wake; leftovers redeliver next pass,
        // where they land on a parked or terminal job.
        let mut seen = HashSet::new();
        let mut handles = Vec::new();

        for wake in wakes {
            if !seen.insert(wake.job_id) {
                continue;
            }

            let store = self.store.clone();
            let orchestrator = self.orchestrator.clone();

            handles.push(tokio::spawn(async move {
                match orchestrator.run_job(wake.job_id).await {
                    Ok(()) => {
                        if let Err(e) = store.complete_wake(wake.id).await {
                            warn!(wake_id = %wake.id, error = %e, "Failed to complete wake");
                        }
                        true
                    }
                    Err(e) => {
                        warn!(
                            job_id = %wake.job_id,
                            error = %e,
                            "Job run failed, leaving wake for redelivery"
                        );
                        false
                    }
                }
            }));
        }

        let mut handled = 0;
        for handle in handles {
            match handle.await {
                Ok(true) => handled += 1,
                Ok(false) => {}
                Err(e) => error!(error = %e, "Wake task panicked"),
            }
        }

        Ok(handled)
    }

    /// Schedule immediate wakes for non-terminal jobs that have none
    /// pending. Returns how many jobs were recovered.
    pub async fn recover(&self) -> StoreResult<usize> {
        let stranded = self.store.jobs_without_wakes().await?;
        let count = stranded.len();

        for job_id in stranded {
            self.store.schedule_wake(job_id, Utc::now()).await?;
            debug!(job_id = %job_id, "Scheduled recovery wake");
        }

        if count > 0 {
            info!(count, "Recovered jobs without a pending wake");
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{FailureCode, JobStage};
    use crate::providers::{
        MockMediaStore, MockSummarizer, MockTranscriptionClient, Providers,
    };
    use crate::store::MemoryStore;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            poll_interval_secs: 0,
            retry_base_delay_ms: 0,
            ..Default::default()
        }
    }

    fn make_scheduler(
        store: Arc<MemoryStore>,
        providers: Providers,
        config: PipelineConfig,
    ) -> Scheduler {
        let orchestrator = Orchestrator::new(store.clone(), providers, config.clone());
        Scheduler::new(store, orchestrator, config)
    }

    fn succeeding_providers() -> (Providers, Arc<MockMediaStore>, Arc<MockTranscriptionClient>) {
        let media = Arc::new(MockMediaStore::succeeding());
        let transcription = Arc::new(MockTranscriptionClient::succeeding("hello world"));
        let summarizer = Arc::new(MockSummarizer::succeeding());
        let providers = Providers::new(media.clone(), transcription.clone(), summarizer);
        (providers, media, transcription)
    }

    /// Run dispatch passes until the job is terminal and the wake
    /// table drains.
    async fn drain(scheduler: &Scheduler, store: &Arc<MemoryStore>, id: uuid::Uuid) {
        for _ in 0..32 {
            scheduler.dispatch_once().await.unwrap();
            let job = store.get_job(id).await.unwrap();
            let due = store
                .due_wakes(Utc::now() + chrono::Duration::seconds(1), 100)
                .await
                .unwrap();
            if job.is_terminal() && due.is_empty() {
                return;
            }
        }
        panic!("dispatch did not settle");
    }

    #[tokio::test]
    async fn test_dispatch_runs_due_wake() {
        let store = Arc::new(MemoryStore::new());
        let (providers, media, _) = succeeding_providers();
        let scheduler = make_scheduler(store.clone(), providers, test_config());

        let job = store.create_job("ref-1").await.unwrap();
        store.schedule_wake(job.id, Utc::now()).await.unwrap();

        let handled = scheduler.dispatch_once().await.unwrap();
        assert_eq!(handled, 1);
        assert_eq!(media.calls(), 1);

        let advanced = store.get_job(job.id).await.unwrap();
        assert_ne!(advanced.stage, JobStage::Created);
    }

    #[tokio::test]
    async fn test_dispatch_ignores_future_wakes() {
        let store = Arc::new(MemoryStore::new());
        let (providers, media, _) = succeeding_providers();
        let scheduler = make_scheduler(store.clone(), providers, test_config());

        let job = store.create_job("ref-1").await.unwrap();
        store
            .schedule_wake(job.id, Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();

        let handled = scheduler.dispatch_once().await.unwrap();
        assert_eq!(handled, 0);
        assert_eq!(media.calls(), 0);
        assert_eq!(
            store.get_job(job.id).await.unwrap().stage,
            JobStage::Created
        );
    }

    #[tokio::test]
    async fn test_dispatch_runs_job_once_per_pass() {
        let store = Arc::new(MemoryStore::new());
        let (providers, media, _) = succeeding_providers();
        let scheduler = make_scheduler(store.clone(), providers, test_config());

        let job = store.create_job("ref-1").await.unwrap();
        store.schedule_wake(job.id, Utc::now()).await.unwrap();
        store.schedule_wake(job.id, Utc::now()).await.unwrap();

        let handled = scheduler.dispatch_once().await.unwrap();
        assert_eq!(handled, 1);
        assert_eq!(media.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_run_leaves_wake_for_redelivery() {
        let store = Arc::new(MemoryStore::new());
        let (providers, _, _) = succeeding_providers();
        let scheduler = make_scheduler(store.clone(), providers, test_config());

        // A polling job without a handle makes the run fail.
        let mut job = store.create_job("ref-1").await.unwrap();
        job.stage = JobStage::TranscriptionPolling;
        store.update_job(&job).await.unwrap();
        store.schedule_wake(job.id, Utc::now()).await.unwrap();

        let handled = scheduler.dispatch_once().await.unwrap();
        assert_eq!(handled, 0);

        let due = store.due_wakes(Utc::now(), 10).await.unwrap();
        assert_eq!(due.len(), 1);
    }

    #[tokio::test]
    async fn test_recover_schedules_stranded_job() {
        let store = Arc::new(MemoryStore::new());
        let (providers, _, _) = succeeding_providers();
        let scheduler = make_scheduler(store.clone(), providers, test_config());

        let job = store.create_job("ref-1").await.unwrap();

        let recovered = scheduler.recover().await.unwrap();
        assert_eq!(recovered, 1);

        let due = store.due_wakes(Utc::now(), 10).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].job_id, job.id);

        // With a wake pending the job is no longer stranded.
        assert_eq!(scheduler.recover().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_recover_skips_terminal_jobs() {
        let store = Arc::new(MemoryStore::new());
        let (providers, _, _) = succeeding_providers();
        let scheduler = make_scheduler(store.clone(), providers, test_config());

        let mut job = store.create_job("ref-1").await.unwrap();
        job.fail(FailureCode::UploadError, "gone".to_string());
        store.update_job(&job).await.unwrap();

        assert_eq!(scheduler.recover().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_loop_completes_job() {
        let store = Arc::new(MemoryStore::new());
        let (providers, _, _) = succeeding_providers();
        let scheduler = make_scheduler(store.clone(), providers, test_config());

        let job = store.create_job("ref-1").await.unwrap();
        store.schedule_wake(job.id, Utc::now()).await.unwrap();

        drain(&scheduler, &store, job.id).await;

        let done = store.get_job(job.id).await.unwrap();
        assert_eq!(done.stage, JobStage::Completed);
        assert!(done.summary.is_some());
    }

    #[tokio::test]
    async fn test_dispatch_loop_times_out_stuck_transcription() {
        let store = Arc::new(MemoryStore::new());
        let media = Arc::new(MockMediaStore::succeeding());
        let transcription = Arc::new(MockTranscriptionClient::never_finishing());
        let summarizer = Arc::new(MockSummarizer::succeeding());
        let providers = Providers::new(media, transcription.clone(), summarizer);
        let config = PipelineConfig {
            max_transcription_wait_secs: 0,
            ..test_config()
        };
        let scheduler = make_scheduler(store.clone(), providers, config);

        let job = store.create_job("ref-1").await.unwrap();
        store.schedule_wake(job.id, Utc::now()).await.unwrap();

        drain(&scheduler, &store, job.id).await;

        let failed = store.get_job(job.id).await.unwrap();
        assert_eq!(failed.stage, JobStage::Failed);
        assert_eq!(
            failed.error.as_ref().map(|e| e.code),
            Some(FailureCode::TranscriptionTimeout)
        );
        assert_eq!(transcription.poll_calls(), 1);
    }

    #[tokio::test]
    async fn test_recovered_job_runs_on_next_dispatch() {
        let store = Arc::new(MemoryStore::new());
        let (providers, media, _) = succeeding_providers();
        let scheduler = make_scheduler(store.clone(), providers, test_config());

        // Job persisted but its wake was lost.
        let job = store.create_job("ref-1").await.unwrap();

        scheduler.recover().await.unwrap();
        drain(&scheduler, &store, job.id).await;

        assert_eq!(
            store.get_job(job.id).await.unwrap().stage,
            JobStage::Completed
        );
        assert_eq!(media.calls(), 1);
    }
}
