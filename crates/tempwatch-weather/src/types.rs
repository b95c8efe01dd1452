use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair, the unit of a single weather-source query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// A named place with one or more sampling coordinates.
///
/// Loaded once at configuration time; the aggregation engine only reads it.
/// The description is the identity used for downstream reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub description: String,
    pub coordinates: Vec<Coordinate>,
}

/// One resolved temperature for a location.
///
/// Produced only by the aggregation engine, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct TemperatureSample {
    pub location: Arc<Location>,
    pub value: f64,
}

impl TemperatureSample {
    pub fn description(&self) -> &str {
        &self.location.description
    }
}

/// Outcome of one batch run: one sample per configured location (in no
/// particular order) or the single error that terminated the run.
pub type BatchResult = Result<Vec<TemperatureSample>, BatchError>;

/// Averaging an empty sequence of values.
///
/// Never expected in normal operation: a location with zero coordinates is
/// rejected at configuration time, not at aggregation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot average an empty sequence of values")]
pub struct EmptyInput;

/// A single coordinate fetch failed.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request for {coordinate} failed: {source}")]
    Network {
        coordinate: Coordinate,
        #[source]
        source: reqwest::Error,
    },

    #[error("upstream returned {status} for {coordinate}: {message}")]
    Status {
        coordinate: Coordinate,
        status: u16,
        message: String,
    },

    #[error("malformed payload for {coordinate}: {message}")]
    Payload {
        coordinate: Coordinate,
        message: String,
    },

    #[error("{date} is outside the provider history window")]
    HistoryWindow { date: NaiveDate },

    #[error("fetch for {coordinate} was cancelled")]
    Cancelled { coordinate: Coordinate },
}

/// A location failed to resolve.
///
/// Wraps the first coordinate failure observed; ties between
/// near-simultaneous failures are broken by whichever reports first.
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    #[error("location {location:?} has no sampling coordinates")]
    NoCoordinates { location: String },

    #[error("location {location:?} failed to resolve: {source}")]
    Fetch {
        location: String,
        #[source]
        source: SourceError,
    },

    /// A worker stopped without reporting a result. Only reachable if a
    /// spawned task died, which the engine itself never does.
    #[error("worker for location {location:?} stopped without reporting")]
    TaskLost { location: String },
}

impl AggregationError {
    /// The description of the location that failed to resolve.
    pub fn location(&self) -> &str {
        match self {
            AggregationError::NoCoordinates { location }
            | AggregationError::Fetch { location, .. }
            | AggregationError::TaskLost { location } => location,
        }
    }
}

/// Terminal outcome of a failed batch run. Timeout is kept distinct from an
/// aggregation failure, but both discard every partially collected sample.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error("batch did not complete within {timeout:?}")]
    Timeout { timeout: Duration },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_display_is_compact() {
        let c = Coordinate {
            latitude: 55.7558,
            longitude: 37.6173,
        };
        assert_eq!(c.to_string(), "(55.7558, 37.6173)");
    }

    #[test]
    fn location_deserializes_from_config_shape() {
        let location: Location = serde_json::from_value(serde_json::json!({
            "description": "North branch",
            "coordinates": [
                {"latitude": 55.75, "longitude": 37.61},
                {"latitude": 55.80, "longitude": 37.50}
            ]
        }))
        .unwrap();

        assert_eq!(location.description, "North branch");
        assert_eq!(location.coordinates.len(), 2);
        assert_eq!(location.coordinates[0].latitude, 55.75);
    }

    #[test]
    fn aggregation_error_exposes_location() {
        let err = AggregationError::NoCoordinates {
            location: "East".into(),
        };
        assert_eq!(err.location(), "East");
    }
}
