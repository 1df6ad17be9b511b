//! Row models for the `jobs` and `job_wakes` tables.

pub mod job;
pub mod wake;

pub use job::*;
pub use wake::*;
