//! BackupHub Server, single-leader database backup scheduling.
//!
//! Main entry point that wires all crates together, elects the backup
//! leader and runs the worker until shutdown.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use backuphub_core::config::AppConfig;
use backuphub_core::error::AppError;
use backuphub_database::connection::DatabasePool;
use backuphub_database::repositories::{JobRepository, PgLockStore};
use backuphub_service::{BackupService, ConfigService, FileConfigProvider};
use backuphub_worker::{
    BackupJobHandler, CronScheduler, DatabaseBackupRunner, JobExecutor, JobQueue, WorkerRunner,
};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file, environment overlay and environment variables
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("BACKUPHUB_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    let env = std::env::var("BACKUPHUB_ENV").unwrap_or_else(|_| "development".to_string());

    AppConfig::load_layered(&config_path, &format!("config/{}", env))
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting BackupHub v{}", env!("CARGO_PKG_VERSION"));
    let instance_id = format!("backuphub-{}", &uuid::Uuid::new_v4().to_string()[..8]);

    // ── Step 1: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database).await?;
    if !db.health_check().await? {
        return Err(AppError::database("Database health check failed"));
    }
    backuphub_database::migration::run_migrations(db.pool()).await?;
    tracing::info!("Database migrations complete");

    // ── Step 2: Queue and worker ─────────────────────────────────
    let job_queue = Arc::new(JobQueue::new(
        Arc::new(JobRepository::new(db.pool().clone())),
        instance_id.clone(),
        config.dump.max_attempts,
    ));

    let mut job_executor = JobExecutor::new();
    let backup_runner = Arc::new(DatabaseBackupRunner::new(
        config.database.clone(),
        config.dump.clone(),
    ));
    job_executor.register(Arc::new(BackupJobHandler::new(backup_runner)));
    tracing::info!("Job handlers: {:?}", job_executor.registered_types());
    let job_executor = Arc::new(job_executor);

    // ── Step 3: Leader election and backup schedule ──────────────
    let scheduler = Arc::new(CronScheduler::new().await?);
    let provider = Arc::new(FileConfigProvider::new(config.system_config_path.clone()));
    let config_service = Arc::new(ConfigService::new(provider.clone()));

    let lock_store = Arc::new(PgLockStore::new(db.pool().clone(), instance_id.clone()));
    let backup_service = Arc::new(BackupService::new(
        provider,
        lock_store.clone(),
        scheduler.clone(),
        job_queue.clone(),
    ));
    config_service.subscribe(backup_service.clone()).await;

    let role = backup_service.on_bootstrap().await?;
    tracing::info!(instance = %instance_id, role = %role, "Backup role decided");

    // Registers the current config as the first load. Bootstrap already
    // scheduled from it, so listeners see no change.
    config_service.reload().await?;
    for job in scheduler.jobs().await {
        tracing::info!(
            name = %job.name,
            schedule = %job.schedule,
            enabled = job.enabled,
            "Cron job registered"
        );
    }
    scheduler.start().await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker_handle = if config.worker.enabled {
        tracing::info!("Starting background worker...");
        let runner = WorkerRunner::new(job_queue, job_executor, config.worker.clone());
        let cancel = shutdown_rx.clone();
        Some(tokio::spawn(async move { runner.run(cancel).await }))
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    let reload_handle = spawn_reload_on_hangup(config_service, shutdown_rx);

    // ── Step 4: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
    let _ = shutdown_tx.send(true);

    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!("Scheduler shutdown error: {}", e);
    }
    if let Some(handle) = worker_handle {
        if let Err(e) = handle.await {
            tracing::warn!("Worker task ended abnormally: {}", e);
        }
    }
    if let Some(handle) = reload_handle {
        handle.abort();
    }

    lock_store.close().await;
    db.close().await;
    tracing::info!("BackupHub stopped");
    Ok(())
}

/// Reload the system configuration on every SIGHUP
#[cfg(unix)]
fn spawn_reload_on_hangup(
    config_service: Arc<ConfigService>,
    mut shutdown: watch::Receiver<bool>,
) -> Option<tokio::task::JoinHandle<()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Failed to install SIGHUP handler, config reload disabled: {}", e);
            return None;
        }
    };

    Some(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    tracing::info!("SIGHUP received, reloading system config");
                    if let Err(e) = config_service.reload().await {
                        tracing::error!("System config reload failed: {}", e);
                    }
                }
            }
        }
    }))
}

#[cfg(not(unix))]
fn spawn_reload_on_hangup(
    _config_service: Arc<ConfigService>,
    _shutdown: watch::Receiver<bool>,
) -> Option<tokio::task::JoinHandle<()>> {
    None
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
