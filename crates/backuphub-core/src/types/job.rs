//! Job identifiers and outcomes shared by the scheduler, queue and worker.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Known background job types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobName {
    /// Dump the whole database cluster.
    BackupDatabase,
}

impl JobName {
    /// The job type string persisted in the queue.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BackupDatabase => "backup_database",
        }
    }

    /// The queue jobs of this type are placed on.
    pub fn queue(&self) -> &'static str {
        match self {
            Self::BackupDatabase => "backup",
        }
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backup_database" => Ok(Self::BackupDatabase),
            other => Err(AppError::not_found(format!("Unknown job type '{other}'"))),
        }
    }
}

/// Terminal outcome of one job attempt.
///
/// There are no intermediate states: a handler either completes cleanly
/// or reports failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// The attempt completed cleanly.
    Success,
    /// The attempt failed.
    Failed,
}

impl JobStatus {
    /// Whether the attempt succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failed => f.write_str("failed"),
        }
    }
}
