//! Cluster-scoped exclusive lock contract.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::types::DatabaseLock;

/// A shared store granting named exclusive locks to cooperating instances.
///
/// Acquisition is a single atomic compare-and-set. It never blocks and
/// never retries. There is no release or lease renewal: a lock stays held
/// for the holder's lifetime, or until it is cleared out of band.
#[async_trait]
pub trait LockStore: Send + Sync + std::fmt::Debug + 'static {
    /// Try to become the holder of `lock`.
    ///
    /// Returns `true` iff this call made the caller the holder. Returns
    /// `false` both when another holder exists and when the store cannot
    /// be reached; callers cannot tell the two apart.
    async fn try_acquire(&self, lock: DatabaseLock) -> bool;
}

/// Process-local lock store.
///
/// Only provides exclusion between holders sharing the same instance of
/// the store, so it suits single-process deployments and tests.
#[derive(Debug, Default)]
pub struct MemoryLockStore {
    held: Mutex<HashSet<DatabaseLock>>,
}

impl MemoryLockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `lock` currently has a holder.
    pub async fn is_held(&self, lock: DatabaseLock) -> bool {
        self.held.lock().await.contains(&lock)
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn try_acquire(&self, lock: DatabaseLock) -> bool {
        self.held.lock().await.insert(lock)
    }
}
