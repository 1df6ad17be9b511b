//! Pipeline execution engine.
//!
//! This module provides the core execution engine for Recap:
//!
//! - **Orchestrator**: Drives a single job through its pipeline stages
//! - **Scheduler**: Delivers persisted wakes to the orchestrator and
//!   sweeps for stranded jobs

pub mod orchestrator;
pub mod scheduler;

pub use orchestrator::Orchestrator;
pub use scheduler::Scheduler;
