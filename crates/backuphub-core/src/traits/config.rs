//! Configuration source and listener contracts.

use async_trait::async_trait;

use crate::config::SystemConfig;
use crate::events::{ConfigUpdateEvent, ConfigValidateEvent};
use crate::result::AppResult;

/// Source of the dynamic system configuration.
#[async_trait]
pub trait ConfigProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Read the current configuration, bypassing any cache.
    async fn load_system_config(&self) -> AppResult<SystemConfig>;
}

/// Receives configuration events.
///
/// Both hooks default to no-ops so listeners only implement what they need.
#[async_trait]
pub trait ConfigListener: Send + Sync + std::fmt::Debug + 'static {
    /// Inspect a proposed configuration. Returning an error vetoes it.
    fn on_config_validate(&self, _event: &ConfigValidateEvent) -> AppResult<()> {
        Ok(())
    }

    /// React to a committed configuration.
    async fn on_config_update(&self, _event: &ConfigUpdateEvent) -> AppResult<()> {
        Ok(())
    }
}
