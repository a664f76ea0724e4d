//! Application configuration schemas.
//!
//! The environment-level configuration ([`AppConfig`]) is deserialized from
//! layered TOML files via the `config` crate and holds everything that is
//! fixed for the lifetime of the process: database connection parameters,
//! the dump utility invocation, worker and logging settings.
//!
//! The dynamic configuration ([`SystemConfig`]) holds what operators may
//! change at runtime, currently the backup schedule.

pub mod backup;
pub mod database;
pub mod logging;
pub mod system;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::backup::DumpConfig;
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::system::{BackupsConfig, DatabaseBackupConfig, SystemConfig};
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Dump utility settings.
    #[serde(default)]
    pub dump: DumpConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Path to the dynamic system configuration file.
    #[serde(default = "default_system_config_path")]
    pub system_config_path: String,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables prefixed with `BACKUPHUB__` override file
    /// values, e.g. `BACKUPHUB__DATABASE__PASSWORD`.
    pub fn load(path: &str) -> Result<Self, AppError> {
        Self::load_files(&[path])
    }

    /// Load the base file, then an optional environment overlay on top of it.
    pub fn load_layered(path: &str, overlay: &str) -> Result<Self, AppError> {
        Self::load_files(&[path, overlay])
    }

    fn load_files(paths: &[&str]) -> Result<Self, AppError> {
        let mut builder = config::Config::builder();
        for path in paths {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("BACKUPHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

fn default_system_config_path() -> String {
    "config/system.toml".to_string()
}
