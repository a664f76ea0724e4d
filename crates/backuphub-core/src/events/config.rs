//! Configuration change events.

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;

/// Fired on every instance after a configuration change is committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigUpdateEvent {
    /// The newly committed configuration.
    pub new_config: SystemConfig,
    /// The configuration it replaced. `None` on the very first load.
    pub old_config: Option<SystemConfig>,
}

/// Fired before a proposed configuration is committed.
///
/// Any listener rejecting the event vetoes the whole change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValidateEvent {
    /// The proposed configuration.
    pub new_config: SystemConfig,
}

impl ConfigUpdateEvent {
    /// Whether this event carries the first configuration ever loaded.
    pub fn is_first_load(&self) -> bool {
        self.old_config.is_none()
    }
}
