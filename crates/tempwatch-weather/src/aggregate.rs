//! Per-location fan-out: one probe per coordinate, one sample out.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::average::average;
use crate::source::Source;
use crate::types::{AggregationError, Location, TemperatureSample};

/// Resolves one location to one temperature sample by probing every
/// coordinate concurrently against the shared weather source.
#[derive(Clone)]
pub struct Aggregator {
    source: Arc<dyn Source>,
}

impl Aggregator {
    pub fn new(source: Arc<dyn Source>) -> Self {
        Self { source }
    }

    /// Fan out one fetch per coordinate and wait for either all of them or
    /// the first failure.
    ///
    /// The first failure wins: it cancels the sibling fetches for this
    /// location and becomes the error. Cancelling the siblings is a
    /// best-effort shortcut, not a correctness requirement; a fetch that
    /// completes just before the token fires is silently discarded because
    /// the receiver is already gone.
    ///
    /// # Errors
    ///
    /// [`AggregationError::NoCoordinates`] for a location without sampling
    /// coordinates, otherwise [`AggregationError::Fetch`] wrapping the first
    /// observed source failure.
    pub async fn resolve(
        &self,
        location: Arc<Location>,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<TemperatureSample, AggregationError> {
        if location.coordinates.is_empty() {
            return Err(AggregationError::NoCoordinates {
                location: location.description.clone(),
            });
        }

        let scope = cancel.child_token();
        let (tx, mut rx) = mpsc::channel(location.coordinates.len());

        for &coordinate in &location.coordinates {
            let source = Arc::clone(&self.source);
            let scope = scope.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = source.fetch(coordinate, date, scope).await;
                // A send fails only when a sibling already failed and the
                // aggregator returned; the late result is discarded.
                let _ = tx.send(result).await;
            });
        }
        drop(tx);

        let mut values = Vec::with_capacity(location.coordinates.len());
        while values.len() < location.coordinates.len() {
            match rx.recv().await {
                Some(Ok(value)) => values.push(value),
                Some(Err(source)) => {
                    scope.cancel();
                    return Err(AggregationError::Fetch {
                        location: location.description.clone(),
                        source,
                    });
                }
                None => {
                    scope.cancel();
                    return Err(AggregationError::TaskLost {
                        location: location.description.clone(),
                    });
                }
            }
        }

        // Non-empty by the check above, so averaging cannot fail.
        let value = average(&values).map_err(|_| AggregationError::NoCoordinates {
            location: location.description.clone(),
        })?;

        tracing::debug!(
            location = %location.description,
            probes = values.len(),
            value,
            "location resolved"
        );

        Ok(TemperatureSample { location, value })
    }
}
