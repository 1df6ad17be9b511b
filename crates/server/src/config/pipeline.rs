//! Pipeline configuration: polling cadence, deadlines, and retry limits.

use std::time::Duration;

use serde::Deserialize;

/// Upper bound on the exponential retry backoff.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Pipeline configuration loaded from environment variables.
///
/// Environment variables are prefixed with `RECAP_`:
/// - `RECAP_POLL_INTERVAL_SECS`: Delay between transcription polls (default: 10)
/// - `RECAP_MAX_TRANSCRIPTION_WAIT_SECS`: Deadline for a pending transcription (default: 7200)
/// - `RECAP_MAX_START_ATTEMPTS`: Attempts to start a transcription before failing (default: 3)
/// - `RECAP_MAX_SUMMARY_ATTEMPTS`: Attempts to summarize before failing (default: 3)
/// - `RECAP_RETRY_BASE_DELAY_MS`: Base delay for exponential retry backoff (default: 500)
/// - `RECAP_DISPATCH_INTERVAL_MS`: Scheduler tick interval (default: 1000)
/// - `RECAP_RECOVERY_INTERVAL_SECS`: Interval between recovery sweeps (default: 60)
/// - `RECAP_WAKE_BATCH_SIZE`: Maximum due wakes fetched per tick (default: 100)
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Delay between transcription polls, in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// How long a transcription may stay pending before it times out, in seconds
    #[serde(default = "default_max_transcription_wait_secs")]
    pub max_transcription_wait_secs: u64,

    /// How many times to attempt starting a transcription
    #[serde(default = "default_max_start_attempts")]
    pub max_start_attempts: u32,

    /// How many times to attempt summarization
    #[serde(default = "default_max_summary_attempts")]
    pub max_summary_attempts: u32,

    /// Base delay for exponential retry backoff, in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Scheduler tick interval, in milliseconds
    #[serde(default = "default_dispatch_interval_ms")]
    pub dispatch_interval_ms: u64,

    /// Interval between recovery sweeps, in seconds
    #[serde(default = "default_recovery_interval_secs")]
    pub recovery_interval_secs: u64,

    /// Maximum number of due wakes fetched per scheduler tick
    #[serde(default = "default_wake_batch_size")]
    pub wake_batch_size: i64,
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_max_transcription_wait_secs() -> u64 {
    7200
}

fn default_max_start_attempts() -> u32 {
    3
}

fn default_max_summary_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_dispatch_interval_ms() -> u64 {
    1000
}

fn default_recovery_interval_secs() -> u64 {
    60
}

fn default_wake_batch_size() -> i64 {
    100
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are prefixed with `RECAP_`.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("RECAP_").from_env::<PipelineConfig>()
    }

    /// Delay between transcription polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Deadline budget for a pending transcription.
    pub fn max_transcription_wait(&self) -> Duration {
        Duration::from_secs(self.max_transcription_wait_secs)
    }

    /// Scheduler tick interval.
    pub fn dispatch_interval(&self) -> Duration {
        Duration::from_millis(self.dispatch_interval_ms)
    }

    /// Interval between recovery sweeps.
    pub fn recovery_interval(&self) -> Duration {
        Duration::from_secs(self.recovery_interval_secs)
    }

    /// Backoff delay before retrying after the given attempt (1-based).
    ///
    /// Doubles per attempt starting from `retry_base_delay_ms`, capped
    /// at ten seconds.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay_ms = self
            .retry_base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(MAX_RETRY_DELAY.as_millis() as u64);
        Duration::from_millis(delay_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_transcription_wait_secs: default_max_transcription_wait_secs(),
            max_start_attempts: default_max_start_attempts(),
            max_summary_attempts: default_max_summary_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            dispatch_interval_ms: default_dispatch_interval_ms(),
            recovery_interval_secs: default_recovery_interval_secs(),
            wake_batch_size: default_wake_batch_size(),
        }
    }
}
