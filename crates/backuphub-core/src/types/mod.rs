//! Core type definitions used across the BackupHub workspace.

pub mod job;
pub mod lock;

pub use job::{JobName, JobStatus};
pub use lock::{ADVISORY_LOCK_NAMESPACE, DatabaseLock};
