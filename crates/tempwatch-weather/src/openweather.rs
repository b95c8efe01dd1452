//! OpenWeather "timemachine" source adapter.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::average::average;
use crate::source::Source;
use crate::types::{Coordinate, SourceError};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/onecall/timemachine";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// The provider only serves hourly history for the last few days.
const MAX_HISTORY_DAYS: i64 = 4;

/// Hourly entries folded into the daily figure (core working hours, UTC).
const HOURLY_WINDOW: std::ops::Range<usize> = 3..12;

#[derive(Debug, Deserialize)]
struct TimemachineResponse {
    hourly: Vec<HourlyEntry>,
}

#[derive(Debug, Deserialize)]
struct HourlyEntry {
    temp: f64,
}

/// Weather source backed by the OpenWeather history API.
#[derive(Debug, Clone)]
pub struct OpenWeatherSource {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenWeatherSource {
    /// Build a source against the production OpenWeather endpoint.
    ///
    /// # Errors
    ///
    /// Returns the underlying error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Build a source against a custom endpoint (used by tests).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        })
    }

    async fn request(
        &self,
        coordinate: Coordinate,
        date: NaiveDate,
    ) -> Result<f64, SourceError> {
        let age = Utc::now().date_naive().signed_duration_since(date);
        if age.num_days() > MAX_HISTORY_DAYS {
            return Err(SourceError::HistoryWindow { date });
        }

        let timestamp = date.and_time(NaiveTime::MIN).and_utc().timestamp();
        let url = format!(
            "{}?lat={}&lon={}&dt={}&appid={}&units=metric",
            self.base_url, coordinate.latitude, coordinate.longitude, timestamp, self.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| SourceError::Network { coordinate, source })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                coordinate,
                status: status.as_u16(),
                message,
            });
        }

        let payload: TimemachineResponse =
            response.json().await.map_err(|e| SourceError::Payload {
                coordinate,
                message: e.to_string(),
            })?;

        daily_figure(coordinate, &payload)
    }
}

#[async_trait]
impl Source for OpenWeatherSource {
    async fn fetch(
        &self,
        coordinate: Coordinate,
        date: NaiveDate,
        cancel: CancellationToken,
    ) -> Result<f64, SourceError> {
        // Biased so an already-cancelled token short-circuits without
        // touching the network.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SourceError::Cancelled { coordinate }),
            result = self.request(coordinate, date) => result,
        }
    }
}

/// Reduce the hourly history to one figure for the day.
fn daily_figure(
    coordinate: Coordinate,
    payload: &TimemachineResponse,
) -> Result<f64, SourceError> {
    let window = payload
        .hourly
        .get(HOURLY_WINDOW)
        .filter(|w| !w.is_empty())
        .ok_or_else(|| SourceError::Payload {
            coordinate,
            message: format!(
                "expected at least {} hourly entries, got {}",
                HOURLY_WINDOW.end,
                payload.hourly.len()
            ),
        })?;

    let temps: Vec<f64> = window.iter().map(|entry| entry.temp).collect();
    average(&temps).map_err(|_| SourceError::Payload {
        coordinate,
        message: "empty hourly window".into(),
    })
}
