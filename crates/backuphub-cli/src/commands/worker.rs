//! Worker management CLI commands.

use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::output;
use backuphub_core::error::AppError;
use backuphub_core::types::JobName;
use backuphub_database::repositories::job::JobRepository;
use backuphub_entity::job::{CreateJob, JobState};
use backuphub_worker::JobQueue;

/// Arguments for worker commands
#[derive(Debug, Args)]
pub struct WorkerArgs {
    /// Worker subcommand
    #[command(subcommand)]
    pub command: WorkerCommand,
}

/// Worker subcommands
#[derive(Debug, Subcommand)]
pub enum WorkerCommand {
    /// Show worker/queue status
    Status,
    /// Enqueue a job of the given type
    Trigger {
        /// Job type to trigger (e.g. backup_database)
        job_type: String,
    },
    /// Cancel a job that has not started yet
    Cancel {
        /// Job ID
        id: Uuid,
    },
    /// Delete finished jobs older than the given age
    Cleanup {
        /// Age in days
        #[arg(short, long, default_value_t = 30)]
        days: i64,
    },
}

/// Execute worker commands
pub async fn execute(args: &WorkerArgs, config_path: &str) -> Result<(), AppError> {
    let config = super::load_config(config_path).await?;
    let pool = super::create_db_pool(&config).await?;
    let job_repo = Arc::new(JobRepository::new(pool));

    match &args.command {
        WorkerCommand::Status => {
            let queue = JobQueue::new(
                Arc::clone(&job_repo),
                "backuphub-cli".to_string(),
                config.dump.max_attempts,
            );
            let stats = queue.stats().await?;

            println!("Worker Queue Status:");
            for state in JobState::ALL {
                output::print_kv(state.as_str(), &stats.count(state).to_string());
            }
            output::print_kv("Worker Enabled", &config.worker.enabled.to_string());
            output::print_kv("Concurrency", &config.worker.concurrency.to_string());
            output::print_kv("Queues", &config.worker.queues.join(", "));
        }
        WorkerCommand::Trigger { job_type } => {
            let job_name: JobName = job_type.parse()?;
            let job = job_repo
                .create(&CreateJob::for_job(job_name, config.dump.max_attempts))
                .await?;

            output::print_success(&format!(
                "Job '{}' enqueued on '{}' (id: {})",
                job_name, job.queue, job.id
            ));
        }
        WorkerCommand::Cancel { id } => {
            let job = job_repo
                .find_by_id(*id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Job {} not found", id)))?;

            if job.state.is_terminal() {
                output::print_warning(&format!("Job {} already {}", id, job.state));
            } else if job_repo.cancel(*id).await? {
                output::print_success(&format!("Job {} cancelled", id));
            } else {
                output::print_warning(&format!("Job {} is {} and cannot be cancelled", id, job.state));
            }
        }
        WorkerCommand::Cleanup { days } => {
            let before = Utc::now() - Duration::days((*days).max(0));
            let removed = job_repo.cleanup_old(before).await?;
            output::print_success(&format!("Removed {} finished jobs", removed));
        }
    }

    Ok(())
}
