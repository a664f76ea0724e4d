//! Lock holder model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A granted advisory lock and the database session holding it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LockRecord {
    /// Advisory key (see `backuphub_core::types::DatabaseLock::advisory_key`).
    pub lock_key: i32,
    /// `application_name` of the holding session, i.e. the instance id.
    pub holder: String,
    /// Backend process id of the holding session.
    pub pid: i32,
    /// When the holding session connected.
    pub session_started: Option<DateTime<Utc>>,
}
