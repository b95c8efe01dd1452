use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};

use tempwatch_storage::{SqliteStorage, Storage};
use tempwatch_weather::types::TemperatureSample;
use tempwatch_weather::{BatchCoordinator, OpenWeatherSource, Source};

use crate::config::Config;
use crate::error::AppError;

/// Application wiring: configuration, the batch coordinator and the
/// persistence collaborator, plus the periodic trigger loop.
pub struct App {
    config: Config,
    coordinator: BatchCoordinator,
    storage: Box<dyn Storage>,
}

impl App {
    /// Build the application from a validated configuration.
    ///
    /// # Errors
    ///
    /// Fails if the weather client or the database cannot be set up.
    pub fn new(config: Config) -> Result<Self> {
        let source: Arc<dyn Source> = Arc::new(
            OpenWeatherSource::new(config.weather.api_key.clone())
                .context("failed to build the weather client")?,
        );
        let storage = SqliteStorage::open(&config.storage.db_path).with_context(|| {
            format!(
                "failed to open database {}",
                config.storage.db_path.display()
            )
        })?;

        Ok(Self::with_parts(config, source, Box::new(storage)))
    }

    /// Assemble an application from explicit collaborators (used by tests).
    pub fn with_parts(config: Config, source: Arc<dyn Source>, storage: Box<dyn Storage>) -> Self {
        Self {
            config,
            coordinator: BatchCoordinator::new(source),
            storage,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// One scheduled update: resolve yesterday's average for every
    /// configured location and persist the batch.
    ///
    /// All-or-nothing: a failed or timed-out batch persists nothing.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Batch`] when the batch fails or times out and
    /// [`AppError::Storage`] when persisting the samples fails.
    pub async fn run_once(&self) -> Result<Vec<TemperatureSample>, AppError> {
        let date = yesterday()?;
        tracing::info!(%date, locations = self.config.locations.len(), "starting update");

        let samples = self
            .coordinator
            .run(&self.config.locations, date, self.config.batch_timeout())
            .await?;

        for sample in &samples {
            tracing::info!(
                location = sample.description(),
                value = sample.value,
                "temperature resolved"
            );
        }

        self.storage.save_daily(date, &samples)?;
        Ok(samples)
    }

    /// Periodic trigger loop. Runs one update per interval tick until the
    /// process is stopped; a failed update is logged, never retried early.
    ///
    /// # Errors
    ///
    /// Currently loops forever; the `Result` covers future shutdown paths.
    pub async fn run(&self) -> Result<()> {
        let mut interval = tokio::time::interval(self.config.refresh_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            // The first tick fires immediately, so startup produces a batch
            // right away instead of waiting a full interval.
            interval.tick().await;
            match self.run_once().await {
                Ok(samples) => {
                    tracing::info!(locations = samples.len(), "update finished");
                }
                Err(error) => {
                    tracing::error!(%error, "update failed");
                }
            }
        }
    }
}

fn yesterday() -> Result<NaiveDate, AppError> {
    Utc::now()
        .date_naive()
        .pred_opt()
        .context("calendar underflow computing yesterday")
        .map_err(AppError::Other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use tempwatch_weather::types::{BatchError, Coordinate, SourceError};
    use tokio_util::sync::CancellationToken;

    struct FixedSource {
        value: f64,
        fail: bool,
    }

    #[async_trait]
    impl Source for FixedSource {
        async fn fetch(
            &self,
            coordinate: Coordinate,
            _date: NaiveDate,
            _cancel: CancellationToken,
        ) -> Result<f64, SourceError> {
            if self.fail {
                Err(SourceError::Status {
                    coordinate,
                    status: 500,
                    message: "down".into(),
                })
            } else {
                Ok(self.value)
            }
        }
    }

    fn test_config() -> Config {
        toml::from_str(
            r#"
            [[locations]]
            description = "North branch"
            coordinates = [{ latitude = 55.75, longitude = 37.61 }]

            [weather]
            api_key = "secret"
        "#,
        )
        .unwrap()
    }

    fn test_app(fail: bool) -> App {
        let storage = tempwatch_storage::SqliteStorage::open_in_memory().unwrap();
        App::with_parts(
            test_config(),
            Arc::new(FixedSource { value: 13.0, fail }),
            Box::new(storage),
        )
    }

    #[tokio::test]
    async fn successful_update_persists_the_batch() {
        let app = test_app(false);

        let samples = app.run_once().await.unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 13.0);

        let records = app.storage.all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "North branch");
    }

    #[tokio::test]
    async fn failed_update_persists_nothing() {
        let app = test_app(true);

        let err = app.run_once().await.unwrap_err();
        assert!(matches!(err, AppError::Batch(BatchError::Aggregation(_))));
        assert!(app.storage.all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn batch_timeout_surfaces_as_a_timeout() {
        struct StuckSource;

        #[async_trait]
        impl Source for StuckSource {
            async fn fetch(
                &self,
                coordinate: Coordinate,
                _date: NaiveDate,
                cancel: CancellationToken,
            ) -> Result<f64, SourceError> {
                cancel.cancelled().await;
                Err(SourceError::Cancelled { coordinate })
            }
        }

        let mut config = test_config();
        config.schedule.batch_timeout_secs = 1;
        let storage = tempwatch_storage::SqliteStorage::open_in_memory().unwrap();
        let app = App::with_parts(config, Arc::new(StuckSource), Box::new(storage));

        let start = tokio::time::Instant::now();
        let err = app.run_once().await.unwrap_err();
        assert!(matches!(err, AppError::Batch(BatchError::Timeout { .. })));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
