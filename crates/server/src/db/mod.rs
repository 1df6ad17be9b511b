//! Persistence plumbing: the connection pool, row models, and the SQL
//! queries the Postgres job store is built from.

pub mod models;
pub mod pool;
pub mod queries;

pub use pool::{create_pool, DbPool};
