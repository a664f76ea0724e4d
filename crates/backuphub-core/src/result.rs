//! Convenience result type alias for BackupHub.

use crate::error::AppError;

/// A specialized `Result` type for BackupHub operations.
pub type AppResult<T> = Result<T, AppError>;
