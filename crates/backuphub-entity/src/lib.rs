//! # backuphub-entity
//!
//! Domain entity models for BackupHub. Every struct in this crate
//! represents a database table row. All entities derive `Debug`, `Clone`,
//! `Serialize`, `Deserialize` and `sqlx::FromRow`.

pub mod job;
pub mod lock;
