//! Backup orchestration: lock election, trigger registration and
//! reconfiguration.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;

use backuphub_core::AppError;
use backuphub_core::events::{ConfigUpdateEvent, ConfigValidateEvent};
use backuphub_core::result::AppResult;
use backuphub_core::traits::{
    ConfigListener, ConfigProvider, CronAction, CronJobSpec, CronRegistry, JobEnqueuer, LockStore,
};
use backuphub_core::types::{DatabaseLock, JobName};
use backuphub_core::validation::validate_cron_expression;

use super::role::BackupRole;

/// Name of the cron trigger that enqueues database backups.
pub const BACKUP_DATABASE_CRON: &str = "backupDatabase";

/// Ensures at most one instance schedules database backups.
///
/// At bootstrap every instance races for [`DatabaseLock::BackupDatabase`].
/// The winner becomes [`BackupRole::Leader`] and registers the backup
/// trigger; everyone else is a [`BackupRole::Follower`] for the rest of the
/// process. Only the leader reacts to configuration updates.
pub struct BackupService {
    /// Dynamic configuration source, read fresh at bootstrap
    config: Arc<dyn ConfigProvider>,
    /// Cross-instance lock store
    locks: Arc<dyn LockStore>,
    /// Trigger registry
    cron: Arc<dyn CronRegistry>,
    /// Where fired triggers enqueue backup jobs
    queue: Arc<dyn JobEnqueuer>,
    /// Set exactly once by [`on_bootstrap`](Self::on_bootstrap)
    role: OnceLock<BackupRole>,
}

impl std::fmt::Debug for BackupService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupService")
            .field("role", &self.role.get())
            .finish_non_exhaustive()
    }
}

impl BackupService {
    /// Creates a new backup service.
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        locks: Arc<dyn LockStore>,
        cron: Arc<dyn CronRegistry>,
        queue: Arc<dyn JobEnqueuer>,
    ) -> Self {
        Self {
            config,
            locks,
            cron,
            queue,
            role: OnceLock::new(),
        }
    }

    /// Role decided at bootstrap, or `None` before it ran.
    pub fn role(&self) -> Option<BackupRole> {
        self.role.get().copied()
    }

    /// Elect this instance's role and, if leader, register the backup
    /// trigger.
    ///
    /// Must be called once per process; a second call fails with a conflict
    /// error and changes nothing.
    pub async fn on_bootstrap(&self) -> AppResult<BackupRole> {
        if let Some(role) = self.role.get() {
            return Err(AppError::conflict(format!(
                "Backup service already bootstrapped as {role}"
            )));
        }

        // Rejecting before the race keeps a bad config from costing the
        // cluster its leader.
        let config = self.config.load_system_config().await?;
        validate_backup_schedule(&config.backups.database.cron_expression)?;

        let acquired = self.locks.try_acquire(DatabaseLock::BackupDatabase).await;
        let role = BackupRole::from_lock_acquired(acquired);

        self.role
            .set(role)
            .map_err(|_| AppError::conflict("Backup service already bootstrapped"))?;

        if !role.is_leader() {
            tracing::info!("Another instance holds the backup lock, not scheduling database backups");
            return Ok(role);
        }

        let backup = &config.backups.database;
        tracing::info!(
            cron_expression = %backup.cron_expression,
            enabled = backup.enabled,
            "Acquired backup lock, scheduling database backups"
        );

        self.cron
            .add_cron_job(CronJobSpec::new(
                BACKUP_DATABASE_CRON,
                backup.cron_expression.clone(),
                backup.enabled,
                self.enqueue_action(),
            ))
            .await?;

        Ok(role)
    }

    /// Trigger callback: put one backup job on the queue.
    fn enqueue_action(&self) -> CronAction {
        let queue = Arc::clone(&self.queue);
        Arc::new(move || {
            let queue = Arc::clone(&queue);
            Box::pin(async move {
                tracing::debug!("Queueing database backup");
                if let Err(e) = queue.queue(JobName::BackupDatabase).await {
                    tracing::error!(error = %e, "Failed to queue database backup");
                }
            })
        })
    }
}

fn validate_backup_schedule(expression: &str) -> AppResult<()> {
    if !validate_cron_expression(expression) {
        return Err(AppError::validation(format!(
            "Invalid cron expression {expression}"
        )));
    }
    Ok(())
}

#[async_trait]
impl ConfigListener for BackupService {
    fn on_config_validate(&self, event: &ConfigValidateEvent) -> AppResult<()> {
        validate_backup_schedule(&event.new_config.backups.database.cron_expression)
    }

    async fn on_config_update(&self, event: &ConfigUpdateEvent) -> AppResult<()> {
        // Bootstrap already registered the trigger from this configuration.
        if event.is_first_load() {
            return Ok(());
        }
        if self.role() != Some(BackupRole::Leader) {
            return Ok(());
        }

        let backup = &event.new_config.backups.database;
        self.cron
            .update_cron_job(BACKUP_DATABASE_CRON, &backup.cron_expression, backup.enabled)
            .await?;

        tracing::info!(
            cron_expression = %backup.cron_expression,
            enabled = backup.enabled,
            "Rescheduled database backups"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use backuphub_core::config::SystemConfig;
    use backuphub_core::error::ErrorKind;
    use backuphub_core::traits::MemoryLockStore;

    use super::*;

    #[derive(Debug)]
    struct StaticProvider(SystemConfig);

    #[async_trait]
    impl ConfigProvider for StaticProvider {
        async fn load_system_config(&self) -> AppResult<SystemConfig> {
            Ok(self.0.clone())
        }
    }

    #[derive(Debug)]
    struct FixedLock(bool);

    #[async_trait]
    impl LockStore for FixedLock {
        async fn try_acquire(&self, _lock: DatabaseLock) -> bool {
            self.0
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum CronCall {
        Add { name: String, schedule: String, enabled: bool },
        Update { name: String, schedule: String, enabled: bool },
    }

    #[derive(Default)]
    struct RecordingCron {
        calls: Mutex<Vec<CronCall>>,
        actions: Mutex<Vec<CronAction>>,
    }

    impl std::fmt::Debug for RecordingCron {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("RecordingCron").finish_non_exhaustive()
        }
    }

    impl RecordingCron {
        fn calls(&self) -> Vec<CronCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CronRegistry for RecordingCron {
        async fn add_cron_job(&self, spec: CronJobSpec) -> AppResult<()> {
            self.calls.lock().unwrap().push(CronCall::Add {
                name: spec.name,
                schedule: spec.schedule,
                enabled: spec.enabled,
            });
            self.actions.lock().unwrap().push(spec.action);
            Ok(())
        }

        async fn update_cron_job(&self, name: &str, schedule: &str, enabled: bool) -> AppResult<()> {
            self.calls.lock().unwrap().push(CronCall::Update {
                name: name.to_string(),
                schedule: schedule.to_string(),
                enabled,
            });
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct RecordingQueue {
        jobs: Mutex<Vec<JobName>>,
        fail: bool,
    }

    #[async_trait]
    impl JobEnqueuer for RecordingQueue {
        async fn queue(&self, job: JobName) -> AppResult<()> {
            if self.fail {
                return Err(AppError::database("queue unavailable"));
            }
            self.jobs.lock().unwrap().push(job);
            Ok(())
        }
    }

    fn system_config(expr: &str, enabled: bool) -> SystemConfig {
        let mut config = SystemConfig::default();
        config.backups.database.cron_expression = expr.to_string();
        config.backups.database.enabled = enabled;
        config
    }

    struct Harness {
        service: BackupService,
        cron: Arc<RecordingCron>,
        queue: Arc<RecordingQueue>,
    }

    fn harness(locks: Arc<dyn LockStore>, queue: RecordingQueue) -> Harness {
        harness_with(system_config("0 2 * * *", true), locks, queue)
    }

    fn harness_with(
        config: SystemConfig,
        locks: Arc<dyn LockStore>,
        queue: RecordingQueue,
    ) -> Harness {
        let cron = Arc::new(RecordingCron::default());
        let queue = Arc::new(queue);
        let service = BackupService::new(
            Arc::new(StaticProvider(config)),
            locks,
            cron.clone(),
            queue.clone(),
        );
        Harness {
            service,
            cron,
            queue,
        }
    }

    fn update(new: SystemConfig, old: Option<SystemConfig>) -> ConfigUpdateEvent {
        ConfigUpdateEvent {
            new_config: new,
            old_config: old,
        }
    }

    #[tokio::test]
    async fn test_leader_registers_trigger_from_fresh_config() {
        let h = harness(Arc::new(FixedLock(true)), RecordingQueue::default());

        let role = h.service.on_bootstrap().await.unwrap();

        assert_eq!(role, BackupRole::Leader);
        assert_eq!(h.service.role(), Some(BackupRole::Leader));
        assert_eq!(
            h.cron.calls(),
            vec![CronCall::Add {
                name: "backupDatabase".to_string(),
                schedule: "0 2 * * *".to_string(),
                enabled: true,
            }]
        );
    }

    #[tokio::test]
    async fn test_follower_never_touches_registry() {
        let h = harness(Arc::new(FixedLock(false)), RecordingQueue::default());

        assert_eq!(h.service.on_bootstrap().await.unwrap(), BackupRole::Follower);
        h.service
            .on_config_update(&update(
                system_config("0 3 * * *", false),
                Some(system_config("0 2 * * *", true)),
            ))
            .await
            .unwrap();

        assert!(h.cron.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_before_bootstrap_is_ignored() {
        let h = harness(Arc::new(FixedLock(true)), RecordingQueue::default());

        h.service
            .on_config_update(&update(
                system_config("0 3 * * *", false),
                Some(system_config("0 2 * * *", true)),
            ))
            .await
            .unwrap();

        assert!(h.cron.calls().is_empty());
    }

    #[tokio::test]
    async fn test_leader_applies_later_updates_once() {
        let h = harness(Arc::new(FixedLock(true)), RecordingQueue::default());
        h.service.on_bootstrap().await.unwrap();

        h.service
            .on_config_update(&update(
                system_config("0 3 * * *", false),
                Some(system_config("0 2 * * *", true)),
            ))
            .await
            .unwrap();

        let updates: Vec<CronCall> = h
            .cron
            .calls()
            .into_iter()
            .filter(|c| matches!(c, CronCall::Update { .. }))
            .collect();
        assert_eq!(
            updates,
            vec![CronCall::Update {
                name: "backupDatabase".to_string(),
                schedule: "0 3 * * *".to_string(),
                enabled: false,
            }]
        );
    }

    #[tokio::test]
    async fn test_first_load_update_is_suppressed() {
        let h = harness(Arc::new(FixedLock(true)), RecordingQueue::default());
        h.service.on_bootstrap().await.unwrap();

        h.service
            .on_config_update(&update(system_config("0 4 * * *", true), None))
            .await
            .unwrap();

        assert_eq!(h.cron.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_second_bootstrap_is_rejected() {
        let locks = Arc::new(MemoryLockStore::new());
        let h = harness(locks, RecordingQueue::default());
        h.service.on_bootstrap().await.unwrap();

        let err = h.service.on_bootstrap().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(h.service.role(), Some(BackupRole::Leader));
        assert_eq!(h.cron.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_bootstrap_config_leaves_lock_free() {
        let locks = Arc::new(MemoryLockStore::new());
        let h = harness_with(
            system_config("* * *", true),
            locks.clone(),
            RecordingQueue::default(),
        );

        let err = h.service.on_bootstrap().await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "Invalid cron expression * * *");
        assert!(!locks.is_held(DatabaseLock::BackupDatabase).await);
        assert!(h.service.role().is_none());
        assert!(h.cron.calls().is_empty());

        // A correctly configured instance can still become leader.
        let next = harness(locks.clone(), RecordingQueue::default());
        assert_eq!(next.service.on_bootstrap().await.unwrap(), BackupRole::Leader);
    }

    #[tokio::test]
    async fn test_sunday_schedule_is_accepted() {
        let h = harness_with(
            system_config("0 2 * * 0", true),
            Arc::new(FixedLock(true)),
            RecordingQueue::default(),
        );

        assert_eq!(h.service.on_bootstrap().await.unwrap(), BackupRole::Leader);
        h.service
            .on_config_validate(&ConfigValidateEvent {
                new_config: system_config("0 2 * * 0-6", true),
            })
            .unwrap();
    }

    #[tokio::test]
    async fn test_validate_rejects_malformed_cron() {
        let h = harness(Arc::new(FixedLock(true)), RecordingQueue::default());

        for expr in ["* * *", "not-a-cron"] {
            let err = h
                .service
                .on_config_validate(&ConfigValidateEvent {
                    new_config: system_config(expr, true),
                })
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
            assert_eq!(err.message, format!("Invalid cron expression {expr}"));
        }

        h.service
            .on_config_validate(&ConfigValidateEvent {
                new_config: system_config("0 2 * * *", true),
            })
            .unwrap();
        assert!(h.service.role().is_none());
    }

    #[tokio::test]
    async fn test_trigger_action_enqueues_backup() {
        let h = harness(Arc::new(FixedLock(true)), RecordingQueue::default());
        h.service.on_bootstrap().await.unwrap();

        let action = h.cron.actions.lock().unwrap()[0].clone();
        (action)().await;
        (action)().await;

        assert_eq!(
            *h.queue.jobs.lock().unwrap(),
            vec![JobName::BackupDatabase, JobName::BackupDatabase]
        );
    }

    #[tokio::test]
    async fn test_trigger_action_swallows_queue_errors() {
        let h = harness(
            Arc::new(FixedLock(true)),
            RecordingQueue {
                fail: true,
                ..RecordingQueue::default()
            },
        );
        h.service.on_bootstrap().await.unwrap();

        let action = h.cron.actions.lock().unwrap()[0].clone();
        (action)().await;

        assert!(h.queue.jobs.lock().unwrap().is_empty());
    }
}
