//! Scripted in-process providers.
//!
//! Used two ways: wired in by `RECAP_PROVIDERS=mock` for local
//! development, and driven directly by the orchestrator tests. Each
//! mock plays back a fixed script of responses (repeating the final
//! entry once exhausted) and counts its calls.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::db::models::Summary;
use crate::providers::{MediaStore, PollStatus, StageError, Summarizer, TranscriptionClient};

/// Handle handed out by the mock transcription client.
pub const MOCK_HANDLE: &str = "mock_transcription_id";

fn next_entry<T: Clone>(script: &[T], idx: &AtomicUsize) -> Option<T> {
    let i = idx.fetch_add(1, Ordering::SeqCst);
    if script.is_empty() {
        None
    } else {
        Some(script[i.min(script.len() - 1)].clone())
    }
}

/// Media store that stages by prefixing the source reference.
pub struct MockMediaStore {
    fail_with: Option<String>,
    calls: AtomicUsize,
}

impl MockMediaStore {
    /// Staging always succeeds, returning `staged://<source>`.
    pub fn succeeding() -> Self {
        Self {
            fail_with: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Staging always fails with the given reason.
    pub fn failing(reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaStore for MockMediaStore {
    async fn stage(&self, source_ref: &str) -> Result<String, StageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(reason) => Err(StageError::Rejected(reason.clone())),
            None => Ok(format!("staged://{}", source_ref)),
        }
    }
}

/// Transcription client playing back scripted start and poll outcomes.
///
/// Script entries are `Ok` responses or `Err` rejection reasons. An
/// exhausted script repeats its last entry, so a single `Pending` plays
/// a transcription that never finishes.
pub struct MockTranscriptionClient {
    start_script: Vec<Result<String, String>>,
    poll_script: Vec<Result<PollStatus, String>>,
    start_idx: AtomicUsize,
    poll_idx: AtomicUsize,
}

impl MockTranscriptionClient {
    pub fn scripted(
        start_script: Vec<Result<String, String>>,
        poll_script: Vec<Result<PollStatus, String>>,
    ) -> Self {
        Self {
            start_script,
            poll_script,
            start_idx: AtomicUsize::new(0),
            poll_idx: AtomicUsize::new(0),
        }
    }

    /// Starts immediately and succeeds on the first poll.
    pub fn succeeding(transcript: &str) -> Self {
        Self::scripted(
            vec![Ok(MOCK_HANDLE.to_string())],
            vec![Ok(PollStatus::Succeeded(transcript.to_string()))],
        )
    }

    /// Starts immediately but never finishes.
    pub fn never_finishing() -> Self {
        Self::scripted(vec![Ok(MOCK_HANDLE.to_string())], vec![Ok(PollStatus::Pending)])
    }

    /// Every start attempt is rejected.
    pub fn failing_start(reason: &str) -> Self {
        Self::scripted(vec![Err(reason.to_string())], vec![Ok(PollStatus::Pending)])
    }

    pub fn start_calls(&self) -> usize {
        self.start_idx.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> usize {
        self.poll_idx.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionClient for MockTranscriptionClient {
    async fn start(&self, _input_ref: &str) -> Result<String, StageError> {
        match next_entry(&self.start_script, &self.start_idx) {
            Some(Ok(handle)) => Ok(handle),
            Some(Err(reason)) => Err(StageError::Rejected(reason)),
            None => Ok(MOCK_HANDLE.to_string()),
        }
    }

    async fn poll(&self, _handle: &str) -> Result<PollStatus, StageError> {
        match next_entry(&self.poll_script, &self.poll_idx) {
            Some(Ok(status)) => Ok(status),
            Some(Err(reason)) => Err(StageError::Rejected(reason)),
            None => Ok(PollStatus::Pending),
        }
    }
}

/// Summarizer playing back scripted outcomes.
pub struct MockSummarizer {
    script: Vec<Result<Summary, String>>,
    idx: AtomicUsize,
}

impl MockSummarizer {
    pub fn scripted(script: Vec<Result<Summary, String>>) -> Self {
        Self {
            script,
            idx: AtomicUsize::new(0),
        }
    }

    /// Always returns the stock mock summary.
    pub fn succeeding() -> Self {
        Self::scripted(vec![Ok(Self::stock_summary())])
    }

    /// Always returns the given summary.
    pub fn succeeding_with(summary: Summary) -> Self {
        Self::scripted(vec![Ok(summary)])
    }

    /// Every invocation is rejected.
    pub fn failing(reason: &str) -> Self {
        Self::scripted(vec![Err(reason.to_string())])
    }

    pub fn calls(&self) -> usize {
        self.idx.load(Ordering::SeqCst)
    }

    fn stock_summary() -> Summary {
        Summary {
            summary: "Mock summary of the recording.".to_string(),
            action_items: vec!["Review the mock transcript.".to_string()],
        }
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn invoke(&self, _transcript: &str) -> Result<Summary, StageError> {
        match next_entry(&self.script, &self.idx) {
            Some(Ok(summary)) => Ok(summary),
            Some(Err(reason)) => Err(StageError::Rejected(reason)),
            None => Ok(Self::stock_summary()),
        }
    }
}
