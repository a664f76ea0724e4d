//! Collaborator contracts defined in `backuphub-core` and implemented by
//! other crates.

pub mod config;
pub mod cron;
pub mod lock;
pub mod queue;

pub use config::{ConfigListener, ConfigProvider};
pub use cron::{CronAction, CronJobSpec, CronRegistry};
pub use lock::{LockStore, MemoryLockStore};
pub use queue::JobEnqueuer;
