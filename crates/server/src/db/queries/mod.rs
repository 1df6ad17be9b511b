//! SQL queries, one module per table.

pub mod job;
pub mod wake;
