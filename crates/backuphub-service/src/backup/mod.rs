//! Single-leader backup orchestration.

pub mod role;
pub mod service;

pub use role::BackupRole;
pub use service::{BACKUP_DATABASE_CRON, BackupService};
