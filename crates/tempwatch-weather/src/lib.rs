//! Concurrent temperature aggregation for Tempwatch
//!
//! Resolves a configured set of locations against a weather source: every
//! sampling coordinate of every location is fetched in parallel, per-location
//! results are averaged, and the whole batch resolves into a single
//! all-or-nothing outcome with eager cancellation on the first failure.

pub mod aggregate;
pub mod average;
pub mod batch;
pub mod openweather;
pub mod source;
pub mod types;

pub use aggregate::Aggregator;
pub use batch::BatchCoordinator;
pub use openweather::OpenWeatherSource;
pub use source::Source;
pub use types::*;

#[cfg(test)]
pub(crate) mod testutil;
