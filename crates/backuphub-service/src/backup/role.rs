//! Backup role of a process.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether this process schedules database backups.
///
/// Decided once at bootstrap and never changes for the lifetime of the
/// process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupRole {
    /// Holds the backup lock and owns the cron trigger.
    Leader,
    /// Lost the lock race; never touches the cron registry.
    Follower,
}

impl BackupRole {
    /// Role for the outcome of a lock acquisition attempt.
    pub fn from_lock_acquired(acquired: bool) -> Self {
        if acquired { Self::Leader } else { Self::Follower }
    }

    /// Whether this is the leader role.
    pub fn is_leader(self) -> bool {
        matches!(self, Self::Leader)
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Leader => "leader",
            Self::Follower => "follower",
        }
    }
}

impl fmt::Display for BackupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
