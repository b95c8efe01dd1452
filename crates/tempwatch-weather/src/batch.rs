//! Batch fan-out: every configured location resolved concurrently, joined
//! through one completion channel, with all-or-nothing semantics.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::aggregate::Aggregator;
use crate::source::Source;
use crate::types::{AggregationError, BatchError, BatchResult, Location};

/// Runs one aggregation batch over the full set of configured locations.
///
/// A batch run moves from running to exactly one of succeeded, failed or
/// timed out; there are no retries and no partial commits.
pub struct BatchCoordinator {
    aggregator: Aggregator,
}

impl BatchCoordinator {
    pub fn new(source: Arc<dyn Source>) -> Self {
        Self {
            aggregator: Aggregator::new(source),
        }
    }

    /// Resolve every location concurrently against one shared cancellation
    /// scope bounded by `timeout`.
    ///
    /// Completions are multiplexed through a single channel; the first
    /// aggregation error or the deadline, whichever is observed first,
    /// cancels the scope and becomes the single outcome. Samples already
    /// collected for other locations are discarded, never returned next to
    /// an error. Cancelling the scope is idempotent, so two
    /// near-simultaneous failures cannot double-report.
    pub async fn run(
        &self,
        locations: &[Location],
        date: NaiveDate,
        timeout: Duration,
    ) -> BatchResult {
        let scope = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel(locations.len().max(1));

        for location in locations {
            let aggregator = self.aggregator.clone();
            let location = Arc::new(location.clone());
            let scope = scope.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = aggregator.resolve(location, date, &scope).await;
                // Discarded if the batch has already resolved.
                let _ = tx.send(outcome).await;
            });
        }
        drop(tx);

        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        let mut samples = Vec::with_capacity(locations.len());
        while samples.len() < locations.len() {
            tokio::select! {
                _ = &mut deadline => {
                    scope.cancel();
                    tracing::warn!(?timeout, collected = samples.len(), "batch timed out");
                    return Err(BatchError::Timeout { timeout });
                }
                completion = rx.recv() => match completion {
                    Some(Ok(sample)) => samples.push(sample),
                    Some(Err(error)) => {
                        scope.cancel();
                        tracing::warn!(location = error.location(), %error, "batch failed");
                        return Err(BatchError::Aggregation(error));
                    }
                    // Every sender went away without reporting, which only
                    // happens if a location task died.
                    None => {
                        scope.cancel();
                        return Err(BatchError::Aggregation(AggregationError::TaskLost {
                            location: "unknown".into(),
                        }));
                    }
                },
            }
        }

        tracing::info!(locations = samples.len(), "batch resolved");
        Ok(samples)
    }
}
