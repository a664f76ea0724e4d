//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use backuphub_core::config::SystemConfig;
use backuphub_core::error::AppError;
use backuphub_core::validation::validate_cron_expression;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Validate the environment and system configuration files
    Validate,
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut config = super::load_config(config_path).await?;
            if !config.database.password.is_empty() {
                config.database.password = "****".to_string();
            }
            output::print_item(&config, format);

            let system = SystemConfig::load(&config.system_config_path)?;
            output::print_item(&system, format);
        }
        ConfigCommand::Validate => {
            let config = match super::load_config(config_path).await {
                Ok(config) => config,
                Err(e) => {
                    output::print_error(&format!("Configuration invalid: {}", e));
                    return Err(e);
                }
            };
            output::print_success(&format!("Configuration '{}' is valid", config_path));
            output::print_kv(
                "Database",
                &format!(
                    "{}@{}:{}/{}",
                    config.database.username,
                    config.database.host,
                    config.database.port,
                    config.database.name
                ),
            );
            output::print_kv("Dump utility", &config.dump.binary);
            output::print_kv("System config", &config.system_config_path);

            let system = SystemConfig::load(&config.system_config_path)?;
            let backup = &system.backups.database;
            if !validate_cron_expression(&backup.cron_expression) {
                let msg = format!("Invalid cron expression {}", backup.cron_expression);
                output::print_error(&msg);
                return Err(AppError::validation(msg));
            }
            output::print_kv("Backup schedule", &backup.cron_expression);
            output::print_kv("Backups enabled", &backup.enabled.to_string());
        }
    }

    Ok(())
}
