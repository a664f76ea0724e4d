//! # backuphub-database
//!
//! PostgreSQL connection management, migrations and concrete repositories
//! for the job queue and the advisory-lock cluster locks.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::lock::PgLockStore;
