//! Cron registry backed by `tokio-cron-scheduler`.
//!
//! Triggers are registered by name and can be rescheduled or switched off
//! while the process runs. A disabled trigger keeps its definition but has
//! no entry in the underlying scheduler.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use uuid::Uuid;

use backuphub_core::error::AppError;
use backuphub_core::result::AppResult;
use backuphub_core::traits::{CronAction, CronJobSpec, CronRegistry};
use backuphub_core::validation::normalize_cron_expression;

/// A registered trigger.
struct CronEntry {
    schedule: String,
    enabled: bool,
    action: CronAction,
    /// Scheduler entry while enabled.
    scheduled_id: Option<Uuid>,
}

/// Read-only view of a registered trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CronJobInfo {
    /// Trigger name.
    pub name: String,
    /// Cron expression as registered.
    pub schedule: String,
    /// Whether the trigger fires.
    pub enabled: bool,
}

/// Named, dynamically updatable cron triggers.
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Registered triggers by name
    jobs: Mutex<HashMap<String, CronEntry>>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish_non_exhaustive()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::scheduler(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            jobs: Mutex::new(HashMap::new()),
        })
    }

    /// Start firing triggers
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::scheduler(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::scheduler(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Snapshot of every registered trigger, sorted by name
    pub async fn jobs(&self) -> Vec<CronJobInfo> {
        let jobs = self.jobs.lock().await;
        let mut infos: Vec<CronJobInfo> = jobs
            .iter()
            .map(|(name, entry)| CronJobInfo {
                name: name.clone(),
                schedule: entry.schedule.clone(),
                enabled: entry.enabled,
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Hand a trigger to the underlying scheduler
    async fn schedule(&self, name: &str, schedule: &str, action: &CronAction) -> AppResult<Uuid> {
        let normalized = normalize_cron_expression(schedule).ok_or_else(|| {
            AppError::validation(format!("Invalid cron expression {}", schedule))
        })?;

        let action = action.clone();
        let job = CronJob::new_async(normalized.as_str(), move |_uuid, _lock| {
            tracing::debug!("Cron trigger fired");
            (action)()
        })
        .map_err(|e| {
            AppError::scheduler(format!("Failed to create '{}' schedule: {}", name, e))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::scheduler(format!("Failed to add '{}' schedule: {}", name, e)))
    }

    /// Put back the trigger of an entry whose scheduler job was removed.
    ///
    /// If even that fails the entry is marked disabled so it still matches
    /// the scheduler.
    async fn restore(&self, name: &str, entry: &mut CronEntry) {
        if !entry.enabled {
            return;
        }
        match self.schedule(name, &entry.schedule, &entry.action).await {
            Ok(id) => entry.scheduled_id = Some(id),
            Err(e) => {
                tracing::error!(
                    "Cron job '{}' could not be restored and is now disabled: {}",
                    name,
                    e
                );
                entry.enabled = false;
            }
        }
    }

    /// Remove a trigger from the underlying scheduler
    async fn unschedule(&self, name: &str, id: Uuid) -> AppResult<()> {
        self.scheduler.remove(&id).await.map_err(|e| {
            AppError::scheduler(format!("Failed to remove '{}' schedule: {}", name, e))
        })
    }
}

#[async_trait]
impl CronRegistry for CronScheduler {
    async fn add_cron_job(&self, spec: CronJobSpec) -> AppResult<()> {
        let mut jobs = self.jobs.lock().await;
        if jobs.contains_key(&spec.name) {
            return Err(AppError::conflict(format!(
                "Cron job '{}' is already registered",
                spec.name
            )));
        }

        let scheduled_id = if spec.enabled {
            Some(self.schedule(&spec.name, &spec.schedule, &spec.action).await?)
        } else {
            None
        };

        tracing::info!(
            "Registered cron job '{}' ({}, enabled={})",
            spec.name,
            spec.schedule,
            spec.enabled
        );

        jobs.insert(
            spec.name,
            CronEntry {
                schedule: spec.schedule,
                enabled: spec.enabled,
                action: spec.action,
                scheduled_id,
            },
        );
        Ok(())
    }

    async fn update_cron_job(&self, name: &str, schedule: &str, enabled: bool) -> AppResult<()> {
        let mut jobs = self.jobs.lock().await;
        let entry = jobs
            .get_mut(name)
            .ok_or_else(|| AppError::not_found(format!("Cron job '{}' is not registered", name)))?;

        // Validate before tearing down the current schedule.
        if enabled && normalize_cron_expression(schedule).is_none() {
            return Err(AppError::validation(format!(
                "Invalid cron expression {}",
                schedule
            )));
        }

        // `scheduled_id` follows the scheduler after every await, so an
        // error below never leaves a live job untracked.
        if let Some(id) = entry.scheduled_id {
            self.unschedule(name, id).await?;
            entry.scheduled_id = None;
        }

        if enabled {
            match self.schedule(name, schedule, &entry.action).await {
                Ok(id) => entry.scheduled_id = Some(id),
                Err(e) => {
                    self.restore(name, entry).await;
                    return Err(e);
                }
            }
        }
        entry.schedule = schedule.to_string();
        entry.enabled = enabled;

        tracing::info!(
            "Updated cron job '{}' ({}, enabled={})",
            name,
            schedule,
            enabled
        );
        Ok(())
    }
}
