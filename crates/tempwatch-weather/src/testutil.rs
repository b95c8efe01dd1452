//! Stub sources shared by the aggregation tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::source::Source;
use crate::types::{Coordinate, SourceError};

/// Source driven by a plain closure over the coordinate.
pub(crate) struct FnSource<F>(pub F);

#[async_trait]
impl<F> Source for FnSource<F>
where
    F: Fn(Coordinate) -> Result<f64, SourceError> + Send + Sync,
{
    async fn fetch(
        &self,
        coordinate: Coordinate,
        _date: NaiveDate,
        _cancel: CancellationToken,
    ) -> Result<f64, SourceError> {
        (self.0)(coordinate)
    }
}

/// Source that never resolves on its own: it parks until the token fires,
/// then records that cancellation was observed.
pub(crate) struct BlockingSource {
    pub observed_cancel: Arc<Notify>,
}

impl BlockingSource {
    pub fn new() -> Self {
        Self {
            observed_cancel: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl Source for BlockingSource {
    async fn fetch(
        &self,
        coordinate: Coordinate,
        _date: NaiveDate,
        cancel: CancellationToken,
    ) -> Result<f64, SourceError> {
        cancel.cancelled().await;
        self.observed_cancel.notify_one();
        Err(SourceError::Cancelled { coordinate })
    }
}

/// Source that fails fast for southern-hemisphere probes and parks until
/// cancellation for everything else. Lets one location fail while a sibling
/// is still in flight.
pub(crate) struct FailOrBlockSource {
    pub observed_cancel: Arc<Notify>,
}

impl FailOrBlockSource {
    pub fn new() -> Self {
        Self {
            observed_cancel: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl Source for FailOrBlockSource {
    async fn fetch(
        &self,
        coordinate: Coordinate,
        _date: NaiveDate,
        cancel: CancellationToken,
    ) -> Result<f64, SourceError> {
        if coordinate.latitude < 0.0 {
            return Err(SourceError::Status {
                coordinate,
                status: 500,
                message: "upstream exploded".into(),
            });
        }
        cancel.cancelled().await;
        self.observed_cancel.notify_one();
        Err(SourceError::Cancelled { coordinate })
    }
}

pub(crate) fn coordinate(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate {
        latitude,
        longitude,
    }
}

pub(crate) fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 14).unwrap_or_default()
}
