//! Cluster locks on PostgreSQL session advisory locks.
//!
//! A lock lives exactly as long as the database session that took it, so a
//! stopped or crashed holder frees it without any cleanup.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Connection, PgConnection, PgPool};
use tokio::sync::Mutex;

use backuphub_core::error::{AppError, ErrorKind};
use backuphub_core::result::AppResult;
use backuphub_core::traits::LockStore;
use backuphub_core::types::{ADVISORY_LOCK_NAMESPACE, DatabaseLock};
use backuphub_entity::lock::LockRecord;

/// Read-only view of granted locks plus the manual recovery path.
#[derive(Debug, Clone)]
pub struct LockRepository {
    pool: PgPool,
}

impl LockRepository {
    /// Create a new lock repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List every granted BackupHub lock with its holding session.
    pub async fn find_all(&self) -> AppResult<Vec<LockRecord>> {
        sqlx::query_as::<_, LockRecord>(
            "SELECT l.objid::int4 AS lock_key, a.application_name AS holder, \
                    l.pid AS pid, a.backend_start AS session_started \
             FROM pg_locks l JOIN pg_stat_activity a ON a.pid = l.pid \
             WHERE l.locktype = 'advisory' AND l.granted AND l.objsubid = 2 \
               AND l.classid::int4 = $1 \
             ORDER BY lock_key",
        )
        .bind(ADVISORY_LOCK_NAMESPACE)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list locks", e))
    }

    /// Terminate the session holding `lock`, which frees it.
    ///
    /// Only needed when the holder is alive but wedged. Returns `false` if
    /// the lock was not held.
    pub async fn terminate_holder(&self, lock: DatabaseLock) -> AppResult<bool> {
        let terminated: Option<bool> = sqlx::query_scalar(
            "SELECT pg_terminate_backend(l.pid) FROM pg_locks l \
             WHERE l.locktype = 'advisory' AND l.granted AND l.objsubid = 2 \
               AND l.classid::int4 = $1 AND l.objid::int4 = $2",
        )
        .bind(ADVISORY_LOCK_NAMESPACE)
        .bind(lock.advisory_key())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to release lock", e))?;

        Ok(terminated.unwrap_or(false))
    }
}

/// [`LockStore`] backed by PostgreSQL advisory locks.
///
/// Each acquired lock pins one connection, detached from the pool, for the
/// rest of the process. The lock is freed when that connection ends, either
/// through [`close`](Self::close) or because the process died.
#[derive(Debug)]
pub struct PgLockStore {
    pool: PgPool,
    /// Reported as the session's `application_name`.
    holder: String,
    sessions: Mutex<HashMap<DatabaseLock, PgConnection>>,
}

impl PgLockStore {
    /// Create a lock store acquiring locks on behalf of `holder`.
    pub fn new(pool: PgPool, holder: impl Into<String>) -> Self {
        Self {
            pool,
            holder: holder.into(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, lock: DatabaseLock) -> AppResult<bool> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&lock) {
            return Ok(false);
        }

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to open lock session", e))?
            .detach();

        sqlx::query("SELECT set_config('application_name', $1, false)")
            .bind(&self.holder)
            .execute(&mut conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to label lock session", e))?;

        let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1, $2)")
            .bind(ADVISORY_LOCK_NAMESPACE)
            .bind(lock.advisory_key())
            .fetch_one(&mut conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to acquire lock", e))?;

        if acquired {
            sessions.insert(lock, conn);
        } else if let Err(e) = conn.close().await {
            tracing::debug!(lock = %lock, error = %e, "Failed to close unused lock session");
        }
        Ok(acquired)
    }

    /// End every lock session, freeing the locks this store holds.
    pub async fn close(&self) {
        let sessions: Vec<(DatabaseLock, PgConnection)> =
            self.sessions.lock().await.drain().collect();
        for (lock, conn) in sessions {
            match conn.close().await {
                Ok(()) => tracing::info!(lock = %lock, "Released lock"),
                Err(e) => tracing::warn!(lock = %lock, error = %e, "Lock session did not close cleanly"),
            }
        }
    }
}

#[async_trait]
impl LockStore for PgLockStore {
    async fn try_acquire(&self, lock: DatabaseLock) -> bool {
        match self.acquire(lock).await {
            Ok(acquired) => acquired,
            Err(e) => {
                tracing::warn!(lock = %lock, error = %e, "Lock store unavailable, treating as not acquired");
                false
            }
        }
    }
}
