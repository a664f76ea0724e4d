//! CLI command definitions and dispatch.

pub mod backup;
pub mod config;
pub mod lock;
pub mod migrate;
pub mod worker;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use backuphub_core::config::AppConfig;
use backuphub_core::error::AppError;

/// BackupHub, single-leader database backup scheduling
#[derive(Debug, Parser)]
#[command(name = "backuphub", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Database backups
    Backup(backup::BackupArgs),
    /// Shared lock inspection and recovery
    Lock(lock::LockArgs),
    /// Configuration management
    Config(config::ConfigArgs),
    /// Worker management
    Worker(worker::WorkerArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &self.config).await,
            Commands::Backup(args) => backup::execute(args, &self.config, self.format).await,
            Commands::Lock(args) => lock::execute(args, &self.config, self.format).await,
            Commands::Config(args) => config::execute(args, &self.config, self.format).await,
            Commands::Worker(args) => worker::execute(args, &self.config).await,
        }
    }
}

/// Helper: load configuration from file
pub async fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

/// Helper: create database pool from config
pub async fn create_db_pool(config: &AppConfig) -> Result<sqlx::PgPool, AppError> {
    let pool = backuphub_database::connection::DatabasePool::connect(&config.database).await?;
    Ok(pool.into_pool())
}
