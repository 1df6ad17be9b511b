//! Environment-driven configuration.
//!
//! Each config struct reads a prefixed slice of the environment through
//! `envy` and falls back to serde defaults for anything unset.

mod app;
mod database;
mod pipeline;

pub use app::{AppConfig, ProviderMode, StoreBackend};
pub use database::DatabaseConfig;
pub use pipeline::PipelineConfig;
