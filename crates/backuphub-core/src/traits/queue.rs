//! Job queue enqueue contract.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::JobName;

/// Anything that can accept a job for later dispatch.
#[async_trait]
pub trait JobEnqueuer: Send + Sync + std::fmt::Debug + 'static {
    /// Enqueue one job of the given type.
    async fn queue(&self, job: JobName) -> AppResult<()>;
}
