//! Named, dynamically reconfigurable cron triggers.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::result::AppResult;

/// Zero-argument side-effecting callback run on every firing.
///
/// The registry spawns it and never waits for it, so it must handle its own
/// errors.
pub type CronAction = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// A trigger definition handed to [`CronRegistry::add_cron_job`].
#[derive(Clone)]
pub struct CronJobSpec {
    /// Unique trigger name.
    pub name: String,
    /// Cron expression.
    pub schedule: String,
    /// Whether the trigger fires.
    pub enabled: bool,
    /// Fixed at creation.
    pub action: CronAction,
}

impl CronJobSpec {
    /// Create a new trigger definition.
    pub fn new(
        name: impl Into<String>,
        schedule: impl Into<String>,
        enabled: bool,
        action: CronAction,
    ) -> Self {
        Self {
            name: name.into(),
            schedule: schedule.into(),
            enabled,
            action,
        }
    }
}

impl std::fmt::Debug for CronJobSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronJobSpec")
            .field("name", &self.name)
            .field("schedule", &self.schedule)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Registry of named cron triggers.
#[async_trait]
pub trait CronRegistry: Send + Sync + std::fmt::Debug + 'static {
    /// Register a new trigger.
    ///
    /// Fails with a conflict error if the name is already registered.
    async fn add_cron_job(&self, spec: CronJobSpec) -> AppResult<()>;

    /// Change the schedule and enabled flag of an existing trigger.
    ///
    /// Fails with a not-found error if the name is not registered. Takes
    /// effect before the next firing; actions already running are left
    /// alone.
    async fn update_cron_job(&self, name: &str, schedule: &str, enabled: bool) -> AppResult<()>;
}
