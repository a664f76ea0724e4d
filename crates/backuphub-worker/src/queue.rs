//! Job queue abstraction for enqueuing and claiming background jobs.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use backuphub_core::error::AppError;
use backuphub_core::result::AppResult;
use backuphub_core::traits::JobEnqueuer;
use backuphub_core::types::JobName;
use backuphub_database::repositories::job::JobRepository;
use backuphub_entity::job::{CreateJob, Job, JobState};

/// Job queue for enqueuing and claiming work
#[derive(Debug, Clone)]
pub struct JobQueue {
    /// Job repository for database persistence
    repo: Arc<JobRepository>,
    /// Worker identifier for claiming jobs
    worker_id: String,
    /// Attempts granted to jobs enqueued through [`JobEnqueuer`]
    default_max_attempts: i32,
}

impl JobQueue {
    /// Create a new job queue
    pub fn new(repo: Arc<JobRepository>, worker_id: String, default_max_attempts: i32) -> Self {
        Self {
            repo,
            worker_id,
            default_max_attempts,
        }
    }

    /// Identifier this queue claims jobs under
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Enqueue a new job
    pub async fn enqueue(&self, params: CreateJob) -> Result<Job, AppError> {
        let job = self
            .repo
            .create(&params)
            .await
            .map_err(|e| AppError::internal(format!("Failed to enqueue job: {}", e)))?;

        tracing::debug!(
            "Enqueued job: id={}, type='{}', queue='{}'",
            job.id,
            job.job_type,
            job.queue
        );

        Ok(job)
    }

    /// Claim the next available job from the given queues, in order
    pub async fn dequeue(&self, queues: &[&str]) -> Result<Option<Job>, AppError> {
        for queue in queues {
            let job = self
                .repo
                .claim_next(queue, &self.worker_id)
                .await
                .map_err(|e| AppError::internal(format!("Failed to dequeue job: {}", e)))?;

            if let Some(job) = job {
                tracing::debug!(
                    "Dequeued job: id={}, type='{}', queue='{}'",
                    job.id,
                    job.job_type,
                    job.queue
                );
                return Ok(Some(job));
            }
        }

        Ok(None)
    }

    /// Mark a job as completed successfully
    pub async fn complete(&self, job_id: Uuid) -> Result<(), AppError> {
        self.repo
            .mark_completed(job_id)
            .await
            .map_err(|e| AppError::internal(format!("Failed to complete job: {}", e)))?;

        tracing::debug!("Job completed: id={}", job_id);
        Ok(())
    }

    /// Mark a job as failed
    pub async fn fail(&self, job_id: Uuid, error: &str) -> Result<(), AppError> {
        self.repo
            .mark_failed(job_id, error)
            .await
            .map_err(|e| AppError::internal(format!("Failed to mark job as failed: {}", e)))?;

        tracing::debug!("Job failed: id={}, error='{}'", job_id, error);
        Ok(())
    }

    /// Return a running job to the queue for another attempt
    pub async fn retry(&self, job_id: Uuid, error: &str) -> Result<(), AppError> {
        self.repo
            .retry(job_id, error)
            .await
            .map_err(|e| AppError::internal(format!("Failed to retry job: {}", e)))?;

        tracing::debug!("Job retried: id={}", job_id);
        Ok(())
    }

    /// Count jobs in every state
    pub async fn stats(&self) -> Result<QueueStats, AppError> {
        let mut counts = Vec::with_capacity(JobState::ALL.len());
        for state in JobState::ALL {
            let count = self.repo.count_by_state(state).await.map_err(|e| {
                AppError::internal(format!("Failed to count {} jobs: {}", state, e))
            })?;
            counts.push((state, count));
        }

        Ok(QueueStats::from_counts(self.worker_id.clone(), counts))
    }
}

/// Where the worker records how an attempt ended.
#[async_trait]
pub trait JobOutcomeSink: Send + Sync {
    /// The job succeeded.
    async fn complete(&self, job_id: Uuid) -> AppResult<()>;
    /// The attempt failed; put the job back for another one.
    async fn retry(&self, job_id: Uuid, error: &str) -> AppResult<()>;
    /// The job failed for good.
    async fn fail(&self, job_id: Uuid, error: &str) -> AppResult<()>;
}

#[async_trait]
impl JobOutcomeSink for JobQueue {
    async fn complete(&self, job_id: Uuid) -> AppResult<()> {
        JobQueue::complete(self, job_id).await
    }

    async fn retry(&self, job_id: Uuid, error: &str) -> AppResult<()> {
        JobQueue::retry(self, job_id, error).await
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> AppResult<()> {
        JobQueue::fail(self, job_id, error).await
    }
}

/// Queue statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Number of pending jobs
    pub pending: i64,
    /// Number of running jobs
    pub running: i64,
    /// Number of completed jobs
    pub completed: i64,
    /// Number of failed jobs
    pub failed: i64,
    /// Number of cancelled jobs
    pub cancelled: i64,
    /// Worker identifier the stats were taken by
    pub worker_id: String,
}

impl QueueStats {
    /// Build stats from per-state counts. States not listed count as zero.
    pub fn from_counts(
        worker_id: String,
        counts: impl IntoIterator<Item = (JobState, i64)>,
    ) -> Self {
        let mut stats = Self {
            worker_id,
            ..Self::default()
        };
        for (state, count) in counts {
            *stats.count_mut(state) = count;
        }
        stats
    }

    /// Count for one state.
    pub fn count(&self, state: JobState) -> i64 {
        match state {
            JobState::Pending => self.pending,
            JobState::Running => self.running,
            JobState::Completed => self.completed,
            JobState::Failed => self.failed,
            JobState::Cancelled => self.cancelled,
        }
    }

    fn count_mut(&mut self, state: JobState) -> &mut i64 {
        match state {
            JobState::Pending => &mut self.pending,
            JobState::Running => &mut self.running,
            JobState::Completed => &mut self.completed,
            JobState::Failed => &mut self.failed,
            JobState::Cancelled => &mut self.cancelled,
        }
    }
}

#[async_trait]
impl JobEnqueuer for JobQueue {
    async fn queue(&self, job: JobName) -> AppResult<()> {
        self.enqueue(CreateJob::for_job(job, self.default_max_attempts))
            .await
            .map(|_| ())
    }
}
