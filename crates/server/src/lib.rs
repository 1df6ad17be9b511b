//! Recap Server Library
//!
//! This crate provides the recap server, turning audio recordings into
//! summaries:
//!
//! - **Job Intake**: Accept recordings over HTTP and track them as jobs
//! - **Pipeline Orchestration**: Drive each job through upload,
//!   transcription, and summarization
//! - **Durable Scheduling**: Persist wake-ups so in-flight jobs survive
//!   restarts
//! - **Provider Integration**: Talk to the media store, the batch
//!   transcription service, and the summarization model
//!
//! ## Architecture
//!
//! Every job mutation goes through a versioned compare-and-set in the
//! job store, and every delay is a persisted wake row rather than an
//! in-process timer. A background scheduler redelivers due wakes
//! at-least-once; the orchestrator makes duplicate delivery harmless.
//!
//! ## Modules
//!
//! - [`config`]: Environment-driven configuration
//! - [`db`]: Postgres pool, row models, and queries
//! - [`engine`]: Orchestrator and wake scheduler
//! - [`error`]: HTTP-surface errors with axum integration
//! - [`handlers`]: HTTP route handlers
//! - [`providers`]: Clients for the external pipeline stages
//! - [`state`]: Shared application state
//! - [`store`]: Job and wake persistence
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use recap_server::{
//!     config::{AppConfig, DatabaseConfig},
//!     state::AppState,
//!     store::{JobStore, PostgresStore},
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app_config = AppConfig::from_env()?;
//!     let db_config = DatabaseConfig::from_env()?;
//!     let store: Arc<dyn JobStore> = Arc::new(PostgresStore::connect(&db_config).await?);
//!     let state = AppState::new(store, app_config);
//!     // ... build and run server
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod providers;
pub mod result_ext;
pub mod state;
pub mod store;

pub use error::{AppError, AppResult};
pub use result_ext::ResultExt;
