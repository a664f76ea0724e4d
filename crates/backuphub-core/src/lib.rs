//! # backuphub-core
//!
//! Core crate for BackupHub. Contains the collaborator traits (lock store,
//! cron registry, job queue, config provider), configuration schemas,
//! shared job and lock identifiers, configuration events, cron expression
//! validation, and the unified error system.
//!
//! This crate has **no** internal dependencies on other BackupHub crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;
pub mod validation;

pub use error::AppError;
pub use result::AppResult;
