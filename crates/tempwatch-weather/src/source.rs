use async_trait::async_trait;
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use crate::types::{Coordinate, SourceError};

/// One network round trip returning the average temperature at a coordinate
/// for a calendar day.
///
/// Implementations must be safe to invoke concurrently with distinct
/// coordinates and must not share mutable state across calls. Once `cancel`
/// fires the call must return promptly with
/// [`SourceError::Cancelled`] instead of completing the exchange; the engine
/// performs exactly one attempt per coordinate and never retries internally.
#[async_trait]
pub trait Source: Send + Sync {
    async fn fetch(
        &self,
        coordinate: Coordinate,
        date: NaiveDate,
        cancel: CancellationToken,
    ) -> Result<f64, SourceError>;
}
