//! Database backup CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use backuphub_core::error::AppError;
use backuphub_core::types::{JobName, JobStatus};
use backuphub_core::validation::normalize_cron_expression;
use backuphub_database::repositories::job::JobRepository;
use backuphub_entity::job::Job;
use backuphub_worker::DatabaseBackupRunner;

/// Arguments for backup commands
#[derive(Debug, Args)]
pub struct BackupArgs {
    /// Backup subcommand
    #[command(subcommand)]
    pub command: BackupCommand,
}

/// Backup subcommands
#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Run one database dump in the foreground
    Run,
    /// Check a cron expression
    Validate {
        /// Cron expression, e.g. "0 2 * * *"
        expression: String,
    },
    /// Show recent backup jobs
    History {
        /// Maximum number of jobs to show
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct BackupJobRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Attempts")]
    attempts: String,
    #[tabled(rename = "Worker")]
    worker_id: String,
    #[tabled(rename = "Created")]
    created_at: String,
    #[tabled(rename = "Completed")]
    completed_at: String,
    #[tabled(rename = "Error")]
    error_message: String,
}

impl From<Job> for BackupJobRow {
    fn from(job: Job) -> Self {
        Self {
            id: job.id.to_string(),
            state: job.state.to_string(),
            attempts: format!("{}/{}", job.attempts, job.max_attempts),
            worker_id: output::display_option(&job.worker_id),
            created_at: job.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            completed_at: output::display_option(
                &job.completed_at.map(|t| t.format("%Y-%m-%d %H:%M:%S")),
            ),
            error_message: output::display_option(&job.error_message),
        }
    }
}

/// Execute backup commands
pub async fn execute(
    args: &BackupArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        BackupCommand::Run => {
            let config = super::load_config(config_path).await?;
            println!(
                "Backing up {}@{}:{} with '{}'...",
                config.database.username, config.database.host, config.database.port, config.dump.binary
            );

            let runner = DatabaseBackupRunner::new(config.database, config.dump);
            match runner.run_database_backup().await {
                JobStatus::Success => output::print_success("Backup completed."),
                JobStatus::Failed => {
                    output::print_error("Backup failed; set RUST_LOG=info for the dump output.");
                    return Err(AppError::internal("Backup failed"));
                }
            }
        }
        BackupCommand::Validate { expression } => match normalize_cron_expression(expression) {
            Some(normalized) => {
                output::print_success(&format!("'{}' is a valid cron expression", expression));
                output::print_kv("Scheduled as", &normalized);
            }
            None => {
                output::print_error(&format!("Invalid cron expression {}", expression));
                return Err(AppError::validation(format!(
                    "Invalid cron expression {}",
                    expression
                )));
            }
        },
        BackupCommand::History { limit } => {
            let config = super::load_config(config_path).await?;
            let pool = super::create_db_pool(&config).await?;
            let repo = JobRepository::new(pool);

            let rows: Vec<BackupJobRow> = repo
                .find_recent(JobName::BackupDatabase.as_str(), (*limit).max(1))
                .await?
                .into_iter()
                .map(BackupJobRow::from)
                .collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}
