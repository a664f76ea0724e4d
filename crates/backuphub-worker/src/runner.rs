//! Worker runner: polls the queue and executes claimed jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tokio::time;

use backuphub_core::config::WorkerConfig;
use backuphub_core::types::JobStatus;
use backuphub_entity::job::Job;

use crate::executor::{JobExecutionError, JobExecutor};
use crate::queue::{JobOutcomeSink, JobQueue};

/// Main worker runner that polls queues and executes jobs
#[derive(Debug)]
pub struct WorkerRunner {
    /// Job queue for polling
    queue: Arc<JobQueue>,
    /// Job executor for dispatching
    executor: Arc<JobExecutor>,
    /// Worker configuration
    config: WorkerConfig,
}

impl WorkerRunner {
    /// Create a new worker runner
    pub fn new(queue: Arc<JobQueue>, executor: Arc<JobExecutor>, config: WorkerConfig) -> Self {
        Self {
            queue,
            executor,
            config,
        }
    }

    /// Run until the cancel signal is received
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        let worker_id = self.queue.worker_id().to_string();
        tracing::info!(
            "Worker '{}' started with concurrency={}, poll_interval={}s, queues={:?}",
            worker_id,
            self.config.concurrency,
            self.config.poll_interval_seconds,
            self.config.queues
        );

        let concurrency = self.config.concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds);

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!("Worker '{}' received shutdown signal", worker_id);
                        break;
                    }
                }
                _ = self.poll_and_execute(&semaphore) => {
                    tokio::select! {
                        _ = cancel.changed() => {
                            if *cancel.borrow() {
                                tracing::info!("Worker '{}' shutting down", worker_id);
                                break;
                            }
                        }
                        _ = time::sleep(poll_interval) => {}
                    }
                }
            }
        }

        // In-flight dumps have no timeout of their own; give them a bounded
        // window before the process exits.
        tracing::info!("Worker '{}' waiting for in-flight jobs to complete...", worker_id);
        if time::timeout(
            Duration::from_secs(30),
            semaphore.acquire_many(concurrency as u32),
        )
        .await
        .is_err()
        {
            tracing::warn!(
                "Worker '{}' stopped with jobs still running; their rows stay 'running'",
                worker_id
            );
        }

        tracing::info!("Worker '{}' shut down complete", worker_id);
    }

    /// Poll for a job and execute it if available
    async fn poll_and_execute(&self, semaphore: &Arc<Semaphore>) {
        let permit = match Arc::clone(semaphore).try_acquire_owned() {
            Ok(p) => p,
            Err(_) => {
                tracing::trace!("All worker slots occupied, waiting...");
                return;
            }
        };

        let queue_refs: Vec<&str> = self.config.queues.iter().map(|s| s.as_str()).collect();

        match self.queue.dequeue(&queue_refs).await {
            Ok(Some(job)) => {
                let queue = Arc::clone(&self.queue);
                let executor = Arc::clone(&self.executor);

                tokio::spawn(async move {
                    let _permit = permit;
                    tracing::info!(
                        "Processing job: id={}, type='{}', attempt={}/{}",
                        job.id,
                        job.job_type,
                        job.attempts,
                        job.max_attempts
                    );

                    let outcome = executor.execute(&job).await;
                    record_outcome(queue.as_ref(), &job, outcome).await;
                });
            }
            Ok(None) => {
                drop(permit);
                tracing::trace!("No jobs available in queues");
            }
            Err(e) => {
                drop(permit);
                tracing::error!("Failed to dequeue job: {}", e);
            }
        }
    }
}

/// Persist the outcome of one attempt. Retry policy lives here, not in the
/// handlers.
async fn record_outcome(
    queue: &dyn JobOutcomeSink,
    job: &Job,
    outcome: Result<JobStatus, JobExecutionError>,
) {
    let result = match outcome {
        Ok(JobStatus::Success) => {
            tracing::info!("Job {} completed successfully", job.id);
            queue.complete(job.id).await
        }
        Ok(JobStatus::Failed) if job.has_attempts_left() => {
            tracing::warn!(
                "Job {} failed, retrying (attempt {}/{})",
                job.id,
                job.attempts,
                job.max_attempts
            );
            queue.retry(job.id, "job reported failure").await
        }
        Ok(JobStatus::Failed) => {
            tracing::error!("Job {} failed", job.id);
            queue.fail(job.id, "job reported failure").await
        }
        Err(e) => {
            let msg = e.to_string();
            tracing::error!("Job {} failed permanently: {}", job.id, msg);
            queue.fail(job.id, &msg).await
        }
    };

    if let Err(e) = result {
        tracing::error!("Failed to record outcome of job {}: {}", job.id, e);
    }
}
