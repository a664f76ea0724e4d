//! File-backed system configuration source.

use async_trait::async_trait;

use backuphub_core::config::SystemConfig;
use backuphub_core::result::AppResult;
use backuphub_core::traits::ConfigProvider;

/// Reads the system configuration file on every call.
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    path: String,
}

impl FileConfigProvider {
    /// Create a provider for the given file. The extension may be omitted.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Path this provider reads.
    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl ConfigProvider for FileConfigProvider {
    async fn load_system_config(&self) -> AppResult<SystemConfig> {
        let path = self.path.clone();
        let config = tokio::task::spawn_blocking(move || SystemConfig::load(&path))
            .await
            .map_err(|e| {
                backuphub_core::AppError::internal(format!("System config loader panicked: {e}"))
            })??;

        tracing::debug!(
            path = %self.path,
            cron_expression = %config.backups.database.cron_expression,
            enabled = config.backups.database.enabled,
            "Loaded system config"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_file_on_every_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system.toml");
        std::fs::write(
            &path,
            "[backups.database]\ncron_expression = \"0 2 * * *\"\nenabled = true\n",
        )
        .unwrap();

        let provider = FileConfigProvider::new(path.to_string_lossy());
        let first = provider.load_system_config().await.unwrap();
        assert_eq!(first.backups.database.cron_expression, "0 2 * * *");

        std::fs::write(
            &path,
            "[backups.database]\ncron_expression = \"0 3 * * *\"\nenabled = false\n",
        )
        .unwrap();

        let second = provider.load_system_config().await.unwrap();
        assert_eq!(second.backups.database.cron_expression, "0 3 * * *");
        assert!(!second.backups.database.enabled);
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("absent.toml").to_string_lossy());
        let config = provider.load_system_config().await.unwrap();
        assert_eq!(config, SystemConfig::default());
    }

    #[tokio::test]
    async fn test_malformed_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system.toml");
        std::fs::write(&path, "[backups.database]\nenabled = \"sometimes\"\n").unwrap();

        let err = FileConfigProvider::new(path.to_string_lossy())
            .load_system_config()
            .await
            .unwrap_err();
        assert_eq!(err.kind, backuphub_core::error::ErrorKind::Configuration);
    }
}
