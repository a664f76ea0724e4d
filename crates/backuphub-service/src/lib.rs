//! # backuphub-service
//!
//! Service layer for BackupHub. The backup service decides, once per
//! process, whether this instance schedules database dumps; the config
//! service owns the dynamic system configuration and fans changes out to
//! registered listeners.
//!
//! Services follow constructor injection: every collaborator is handed in
//! as an `Arc` to a trait object from `backuphub-core`.

pub mod backup;
pub mod config;

pub use backup::{BACKUP_DATABASE_CRON, BackupRole, BackupService};
pub use config::{ConfigService, FileConfigProvider};
