//! Shared test helpers for integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use backuphub_core::config::SystemConfig;
use backuphub_core::result::AppResult;
use backuphub_core::traits::{
    ConfigProvider, CronJobSpec, CronRegistry, JobEnqueuer, LockStore, MemoryLockStore,
};
use backuphub_core::types::{DatabaseLock, JobName};
use backuphub_service::{BackupService, ConfigService};

/// System configuration with the given backup schedule.
pub fn system_config(cron_expression: &str, enabled: bool) -> SystemConfig {
    let mut config = SystemConfig::default();
    config.backups.database.cron_expression = cron_expression.to_string();
    config.backups.database.enabled = enabled;
    config
}

/// Config source whose content tests can swap between reloads.
#[derive(Debug)]
pub struct SwappableProvider(Mutex<SystemConfig>);

impl SwappableProvider {
    pub fn new(config: SystemConfig) -> Arc<Self> {
        Arc::new(Self(Mutex::new(config)))
    }

    pub fn set(&self, config: SystemConfig) {
        *self.0.lock().unwrap() = config;
    }
}

#[async_trait]
impl ConfigProvider for SwappableProvider {
    async fn load_system_config(&self) -> AppResult<SystemConfig> {
        Ok(self.0.lock().unwrap().clone())
    }
}

/// Lock store whose backend is unreachable.
#[derive(Debug)]
pub struct UnavailableLockStore;

#[async_trait]
impl LockStore for UnavailableLockStore {
    async fn try_acquire(&self, _lock: DatabaseLock) -> bool {
        false
    }
}

/// A call observed by [`RecordingCron`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CronCall {
    Add { name: String, schedule: String, enabled: bool },
    Update { name: String, schedule: String, enabled: bool },
}

/// Cron registry that only records calls.
#[derive(Debug, Default)]
pub struct RecordingCron {
    calls: Mutex<Vec<CronCall>>,
}

impl RecordingCron {
    pub fn calls(&self) -> Vec<CronCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<CronCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, CronCall::Update { .. }))
            .collect()
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

/// Job queue that counts enqueued jobs.
#[derive(Debug, Default)]
pub struct CountingQueue {
    jobs: Mutex<Vec<JobName>>,
}

impl CountingQueue {
    pub fn count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

#[async_trait]
impl JobEnqueuer for CountingQueue {
    async fn queue(&self, job: JobName) -> AppResult<()> {
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

/// One simulated process: its services plus the fakes behind them.
pub struct TestInstance<C: CronRegistry> {
    pub backup: Arc<BackupService>,
    pub config: Arc<ConfigService>,
    pub provider: Arc<SwappableProvider>,
    pub cron: Arc<C>,
    pub queue: Arc<CountingQueue>,
}

impl<C: CronRegistry> TestInstance<C> {
    /// Wire an instance the way the server binary does.
    pub async fn new(locks: Arc<dyn LockStore>, cron: Arc<C>, initial: SystemConfig) -> Self {
        let provider = SwappableProvider::new(initial);
        let queue = Arc::new(CountingQueue::default());
        let backup = Arc::new(BackupService::new(
            provider.clone(),
            locks,
            cron.clone(),
            queue.clone(),
        ));
        let config = Arc::new(ConfigService::new(provider.clone()));
        config.subscribe(backup.clone()).await;

        Self {
            backup,
            config,
            provider,
            cron,
            queue,
        }
    }
}

impl TestInstance<RecordingCron> {
    /// Instance with a recording registry.
    pub async fn recording(locks: Arc<dyn LockStore>, initial: SystemConfig) -> Self {
        Self::new(locks, Arc::new(RecordingCron::default()), initial).await
    }
}

/// A lock store shared by every instance of a simulated cluster.
pub fn shared_locks() -> Arc<MemoryLockStore> {
    Arc::new(MemoryLockStore::new())
}
