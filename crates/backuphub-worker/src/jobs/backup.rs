//! Database backup job.
//!
//! Runs the external dump utility once, captures everything it writes to
//! stdout and stderr into a single buffer, and collapses every failure mode
//! (spawn failure, missing pipes, read errors, non-zero exit) into
//! [`JobStatus::Failed`].

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use backuphub_core::config::{DatabaseConfig, DumpConfig};
use backuphub_core::types::{JobName, JobStatus};
use backuphub_entity::job::Job;

use crate::executor::JobHandler;

const READ_CHUNK: usize = 8 * 1024;

/// A fully resolved dump utility invocation.
///
/// The password is only ever placed in the child's environment.
#[derive(Clone)]
pub struct DumpInvocation {
    /// Executable to run.
    pub program: String,
    /// Command-line arguments.
    pub args: Vec<String>,
    /// Complete child environment; nothing else is inherited.
    pub env: Vec<(String, String)>,
}

impl DumpInvocation {
    /// Build the invocation from the environment-level configuration.
    pub fn from_config(database: &DatabaseConfig, dump: &DumpConfig) -> Self {
        let mut args = vec![
            "--clean".to_string(),
            "--if-exists".to_string(),
            "-U".to_string(),
            database.username.clone(),
            "-h".to_string(),
            database.host.clone(),
            "-p".to_string(),
            database.port.to_string(),
        ];
        args.extend(dump.extra_args.iter().cloned());

        let mut env = Vec::with_capacity(2);
        if let Ok(path) = std::env::var("PATH") {
            env.push(("PATH".to_string(), path));
        }
        env.push((dump.password_env.clone(), database.password.clone()));

        Self {
            program: dump.binary.clone(),
            args,
            env,
        }
    }

    /// Build the child process command.
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env_clear()
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl std::fmt::Debug for DumpInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env_keys: Vec<&str> = self.env.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("DumpInvocation")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("env", &env_keys)
            .finish()
    }
}

/// Runs one database dump and reports its outcome.
#[derive(Debug, Clone)]
pub struct DatabaseBackupRunner {
    database: DatabaseConfig,
    dump: DumpConfig,
}

impl DatabaseBackupRunner {
    /// Create a runner from a snapshot of the environment configuration.
    pub fn new(database: DatabaseConfig, dump: DumpConfig) -> Self {
        Self { database, dump }
    }

    /// The invocation the next run will use.
    pub fn invocation(&self) -> DumpInvocation {
        DumpInvocation::from_config(&self.database, &self.dump)
    }

    /// Run the dump once. Never returns an error; every failure is
    /// reported as [`JobStatus::Failed`].
    pub async fn run_database_backup(&self) -> JobStatus {
        tracing::debug!("Backing up database");
        let invocation = self.invocation();

        let mut child = match invocation.command().spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(
                    program = %invocation.program,
                    error = %e,
                    "Backup failed, could not spawn backup process"
                );
                return JobStatus::Failed;
            }
        };

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                tracing::error!("Backup failed, backup process has no output streams");
                if let Err(e) = child.start_kill() {
                    tracing::warn!(error = %e, "Failed to kill backup process");
                }
                return JobStatus::Failed;
            }
        };

        let drained = drain_combined(stdout, stderr).await;

        let status = match child.wait().await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(error = %e, "Backup failed, could not wait for backup process");
                return JobStatus::Failed;
            }
        };

        let logs = match drained {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::error!(error = %e, "Backup failed, could not read backup output");
                return JobStatus::Failed;
            }
        };

        match status.code() {
            Some(0) => {
                tracing::info!("{}", logs);
                JobStatus::Success
            }
            code => {
                let code = code.map_or_else(|| "none (terminated by signal)".to_string(), |c| c.to_string());
                tracing::error!("Backup failed with code {}, command output follows", code);
                tracing::error!("{}", logs);
                JobStatus::Failed
            }
        }
    }
}

/// Read both streams to EOF, appending chunks in the order they arrive.
async fn drain_combined<O, E>(mut stdout: O, mut stderr: E) -> std::io::Result<Vec<u8>>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut logs = Vec::new();
    let mut out_buf = vec![0u8; READ_CHUNK];
    let mut err_buf = vec![0u8; READ_CHUNK];
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
        tokio::select! {
            read = stdout.read(&mut out_buf), if out_open => {
                match read? {
                    0 => out_open = false,
                    n => logs.extend_from_slice(&out_buf[..n]),
                }
            }
            read = stderr.read(&mut err_buf), if err_open => {
                match read? {
                    0 => err_open = false,
                    n => logs.extend_from_slice(&err_buf[..n]),
                }
            }
        }
    }

    Ok(logs)
}

/// Queue handler for `backup_database` jobs.
#[derive(Debug, Clone)]
pub struct BackupJobHandler {
    runner: Arc<DatabaseBackupRunner>,
}

impl BackupJobHandler {
    /// Create a new backup job handler
    pub fn new(runner: Arc<DatabaseBackupRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl JobHandler for BackupJobHandler {
    fn job_type(&self) -> &str {
        JobName::BackupDatabase.as_str()
    }

    async fn execute(&self, _job: &Job) -> JobStatus {
        self.runner.run_database_backup().await
    }
}
