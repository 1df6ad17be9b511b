//! Stage providers: the external capabilities the pipeline drives.
//!
//! Each capability sits behind a narrow async trait so the orchestrator
//! never knows which vendor is on the other side. HTTP implementations
//! live in the sibling modules; scripted mocks in [`mock`] serve tests
//! and local development.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{AppConfig, ProviderMode};
use crate::db::models::Summary;

pub mod media;
pub mod mock;
pub mod summarizer;
pub mod transcription;

pub use media::HttpMediaStore;
pub use mock::{MockMediaStore, MockSummarizer, MockTranscriptionClient};
pub use summarizer::HttpSummarizer;
pub use transcription::HttpTranscriptionClient;

/// Errors reported by stage providers.
#[derive(Error, Debug)]
pub enum StageError {
    /// Network-level failure: timeout, connection refused, bad payload
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider rejected the request
    #[error("provider rejected request: {0}")]
    Rejected(String),

    /// The provider answered with something we cannot interpret
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Outcome of polling a long-running transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Still running, check again later
    Pending,
    /// Finished, full transcript attached
    Succeeded(String),
    /// The provider gave up, reason attached
    Failed(String),
}

/// Stages client-supplied audio into storage the transcription provider
/// can read.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Copy the audio behind `source_ref` into provider-readable storage
    /// and return the canonical staged reference.
    async fn stage(&self, source_ref: &str) -> Result<String, StageError>;
}

/// Client for a long-running transcription operation.
#[async_trait]
pub trait TranscriptionClient: Send + Sync {
    /// Begin transcribing the audio at `input_ref`. Returns the
    /// provider's opaque operation handle.
    async fn start(&self, input_ref: &str) -> Result<String, StageError>;

    /// Check on a running transcription.
    async fn poll(&self, handle: &str) -> Result<PollStatus, StageError>;
}

/// Single-shot summarization of a transcript.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn invoke(&self, transcript: &str) -> Result<Summary, StageError>;
}

/// The full provider set the orchestrator runs against.
#[derive(Clone)]
pub struct Providers {
    pub media: Arc<dyn MediaStore>,
    pub transcription: Arc<dyn TranscriptionClient>,
    pub summarizer: Arc<dyn Summarizer>,
}

impl Providers {
    pub fn new(
        media: Arc<dyn MediaStore>,
        transcription: Arc<dyn TranscriptionClient>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            media,
            transcription,
            summarizer,
        }
    }

    /// Build the provider set selected by configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        match config.providers {
            ProviderMode::Http => Self::new(
                Arc::new(HttpMediaStore::new(&config.media_url)),
                Arc::new(HttpTranscriptionClient::new(
                    &config.transcription_url,
                    &config.transcription_key,
                    &config.transcription_locale,
                )),
                Arc::new(HttpSummarizer::new(
                    &config.summarizer_url,
                    &config.summarizer_key,
                    &config.summarizer_model,
                )),
            ),
            ProviderMode::Mock => Self::new(
                Arc::new(MockMediaStore::succeeding()),
                Arc::new(MockTranscriptionClient::succeeding(
                    "This is a mock transcription for testing.",
                )),
                Arc::new(MockSummarizer::succeeding()),
            ),
        }
    }
}
