//! Validate-then-commit pipeline for the dynamic system configuration.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use backuphub_core::config::SystemConfig;
use backuphub_core::events::{ConfigUpdateEvent, ConfigValidateEvent};
use backuphub_core::result::AppResult;
use backuphub_core::traits::{ConfigListener, ConfigProvider};

/// Owns the committed system configuration and notifies listeners of
/// changes.
///
/// A proposed configuration is first offered to every listener's validate
/// hook; any rejection vetoes it and nothing is committed. After a commit
/// every listener's update hook runs with the new and the previous value.
pub struct ConfigService {
    /// Where configurations are read from
    provider: Arc<dyn ConfigProvider>,
    /// Last committed configuration
    current: RwLock<Option<SystemConfig>>,
    /// Registered listeners, in subscription order
    listeners: RwLock<Vec<Arc<dyn ConfigListener>>>,
    /// Serializes commits so update events are delivered in commit order
    apply_lock: Mutex<()>,
}

impl std::fmt::Debug for ConfigService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigService")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl ConfigService {
    /// Create a config service with nothing committed yet.
    pub fn new(provider: Arc<dyn ConfigProvider>) -> Self {
        Self {
            provider,
            current: RwLock::new(None),
            listeners: RwLock::new(Vec::new()),
            apply_lock: Mutex::new(()),
        }
    }

    /// Register a listener for validate and update events.
    pub async fn subscribe(&self, listener: Arc<dyn ConfigListener>) {
        self.listeners.write().await.push(listener);
    }

    /// The committed configuration.
    ///
    /// If nothing has been committed yet this performs the initial
    /// [`reload`](Self::reload), so listeners still see a first-load event.
    pub async fn get_config(&self) -> AppResult<SystemConfig> {
        if let Some(config) = self.current.read().await.as_ref() {
            return Ok(config.clone());
        }

        self.reload().await?;
        match self.current.read().await.as_ref() {
            Some(config) => Ok(config.clone()),
            None => self.provider.load_system_config().await,
        }
    }

    /// Read the configuration source directly, ignoring the committed value.
    pub async fn load_fresh(&self) -> AppResult<SystemConfig> {
        self.provider.load_system_config().await
    }

    /// Validate, commit and announce a new configuration.
    ///
    /// Returns the first validation error without committing anything.
    /// After a commit every listener is notified even if an earlier one
    /// failed; the first update error is returned.
    pub async fn apply(&self, new_config: SystemConfig) -> AppResult<()> {
        let _guard = self.apply_lock.lock().await;
        let listeners: Vec<Arc<dyn ConfigListener>> = self.listeners.read().await.clone();

        let validate = ConfigValidateEvent {
            new_config: new_config.clone(),
        };
        for listener in &listeners {
            if let Err(e) = listener.on_config_validate(&validate) {
                tracing::warn!(error = %e, "System config change rejected");
                return Err(e);
            }
        }

        let old_config = self.current.write().await.replace(new_config.clone());
        tracing::info!(
            cron_expression = %new_config.backups.database.cron_expression,
            enabled = new_config.backups.database.enabled,
            first_load = old_config.is_none(),
            "System config committed"
        );

        let update = ConfigUpdateEvent {
            new_config,
            old_config,
        };
        let mut first_error = None;
        for listener in &listeners {
            if let Err(e) = listener.on_config_update(&update).await {
                tracing::error!(error = %e, "Config listener failed to apply update");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Read the configuration source and [`apply`](Self::apply) it.
    pub async fn reload(&self) -> AppResult<()> {
        let config = self.provider.load_system_config().await?;
        self.apply(config).await
    }
}
