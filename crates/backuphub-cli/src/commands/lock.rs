//! Cluster lock inspection and manual recovery.
//!
//! A lock is freed when its holder's database session ends. `release` is
//! only needed for a holder that is still connected but no longer working.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use backuphub_core::error::AppError;
use backuphub_core::types::DatabaseLock;
use backuphub_database::repositories::lock::LockRepository;
use backuphub_entity::lock::LockRecord;

/// Arguments for lock commands
#[derive(Debug, Args)]
pub struct LockArgs {
    /// Lock subcommand
    #[command(subcommand)]
    pub command: LockCommand,
}

/// Lock subcommands
#[derive(Debug, Subcommand)]
pub enum LockCommand {
    /// List held locks
    List,
    /// Terminate the session holding a lock so the next instance to start can acquire it
    Release {
        /// Lock name (e.g. BackupDatabase)
        name: String,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct LockRow {
    #[tabled(rename = "Lock")]
    name: String,
    #[tabled(rename = "Holder")]
    holder: String,
    #[tabled(rename = "PID")]
    pid: i32,
    #[tabled(rename = "Session Started")]
    session_started: String,
}

impl From<LockRecord> for LockRow {
    fn from(record: LockRecord) -> Self {
        Self {
            name: DatabaseLock::from_advisory_key(record.lock_key)
                .map(|lock| lock.to_string())
                .unwrap_or_else(|| format!("unknown ({})", record.lock_key)),
            holder: record.holder,
            pid: record.pid,
            session_started: record
                .session_started
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Execute lock commands
pub async fn execute(
    args: &LockArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path).await?;
    let pool = super::create_db_pool(&config).await?;
    let repo = LockRepository::new(pool);

    match &args.command {
        LockCommand::List => {
            let rows: Vec<LockRow> = repo.find_all().await?.into_iter().map(LockRow::from).collect();
            output::print_list(&rows, format);
        }
        LockCommand::Release { name } => {
            let lock: DatabaseLock = name.parse()?;
            if repo.terminate_holder(lock).await? {
                output::print_success(&format!("Lock '{}' released", lock));
            } else {
                output::print_warning(&format!("Lock '{}' is not held", lock));
            }
        }
    }

    Ok(())
}
