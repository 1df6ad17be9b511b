//! Shared application state.

use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::store::JobStore;

/// State handed to every handler through axum.
///
/// Cloning is cheap: the store and config sit behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// Job and wake store
    pub store: Arc<dyn JobStore>,

    /// Application configuration
    pub config: Arc<AppConfig>,

    /// Process start time, for uptime reporting
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn JobStore>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Seconds since the server started.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
