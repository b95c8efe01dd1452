//! Top-level error type for the Tempwatch application.

use thiserror::Error;

use tempwatch_storage::StorageError;
use tempwatch_weather::types::BatchError;

/// Errors surfaced by the application layer.
///
/// The aggregation engine's terminal outcomes ([`BatchError`]) convert into
/// this type unchanged, so the scheduler loop can still tell a timeout from
/// a failed location when deciding what to log.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("weather batch failed: {0}")]
    Batch(#[from] BatchError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
