//! Dynamic system configuration.
//!
//! Unlike [`super::AppConfig`], this configuration may change while the
//! process runs. Changes flow through a validate-then-commit pipeline and
//! are announced to listeners with both the new and the previous value.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Root of the runtime-reconfigurable settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SystemConfig {
    /// Backup scheduling settings.
    #[serde(default)]
    pub backups: BackupsConfig,
}

/// Backup scheduling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BackupsConfig {
    /// Scheduled database dumps.
    #[serde(default)]
    pub database: DatabaseBackupConfig,
}

/// When the database dump runs. How to connect lives in
/// [`super::DatabaseConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseBackupConfig {
    /// Cron expression (five fields, or six with leading seconds).
    #[serde(default = "default_cron_expression")]
    pub cron_expression: String,
    /// Whether scheduled dumps are enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for DatabaseBackupConfig {
    fn default() -> Self {
        Self {
            cron_expression: default_cron_expression(),
            enabled: default_enabled(),
        }
    }
}

impl SystemConfig {
    /// Read the system configuration file from disk.
    ///
    /// Always reads the file; there is no caching at this level.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .build()
            .map_err(|e| {
                AppError::configuration(format!("Failed to read system config '{path}': {e}"))
            })?;

        config.try_deserialize().map_err(|e| {
            AppError::configuration(format!("Failed to deserialize system config: {e}"))
        })
    }
}

fn default_cron_expression() -> String {
    "0 2 * * *".to_string()
}

fn default_enabled() -> bool {
    true
}
