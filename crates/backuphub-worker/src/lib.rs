//! Background job processing and scheduled triggers for BackupHub.
//!
//! This crate provides:
//! - A persistent job queue and a worker runner that polls it
//! - A job executor that dispatches jobs to the correct handler
//! - A cron registry with named, runtime-updatable triggers
//! - The database backup job, which supervises the external dump utility

pub mod executor;
pub mod jobs;
pub mod queue;
pub mod runner;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use jobs::backup::{BackupJobHandler, DatabaseBackupRunner};
pub use queue::{JobOutcomeSink, JobQueue, QueueStats};
pub use runner::WorkerRunner;
pub use scheduler::CronScheduler;
