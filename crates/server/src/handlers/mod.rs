//! HTTP route handlers.

pub mod health;
pub mod jobs;

pub use health::{api_health, health_check};
pub use jobs::{create_job, get_job, list_jobs};
