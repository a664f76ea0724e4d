//! Names of cluster-wide exclusive locks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// PostgreSQL advisory-lock namespace (the first key) shared by every
/// BackupHub lock.
pub const ADVISORY_LOCK_NAMESPACE: i32 = 0x4248_5542;

/// A named, cluster-wide exclusive resource.
///
/// Each variant maps to one advisory-lock key in the shared store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseLock {
    /// Held by the single instance responsible for scheduling backups.
    BackupDatabase,
}

impl DatabaseLock {
    /// All known locks.
    pub const ALL: [DatabaseLock; 1] = [DatabaseLock::BackupDatabase];

    /// Display name, accepted case-insensitively by `FromStr`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BackupDatabase => "BackupDatabase",
        }
    }

    /// Second advisory-lock key, under [`ADVISORY_LOCK_NAMESPACE`].
    pub fn advisory_key(&self) -> i32 {
        match self {
            Self::BackupDatabase => 1,
        }
    }

    /// Reverse of [`advisory_key`](Self::advisory_key).
    pub fn from_advisory_key(key: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|lock| lock.advisory_key() == key)
    }
}

impl fmt::Display for DatabaseLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseLock {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|lock| lock.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::not_found(format!("Unknown lock '{s}'")))
    }
}
