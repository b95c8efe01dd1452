use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use tempwatch_weather::types::Location;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Places to probe, each with one or more sampling coordinates
    pub locations: Vec<Location>,

    /// Scheduling settings
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Weather provider settings
    pub weather: WeatherConfig,

    /// Storage settings
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Minutes between scheduled batch runs (default: once a day)
    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: u32,

    /// Deadline for one whole batch, in seconds
    #[serde(default = "default_batch_timeout_secs")]
    pub batch_timeout_secs: u64,
}

fn default_refresh_minutes() -> u32 {
    1440
}

fn default_batch_timeout_secs() -> u64 {
    60
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            refresh_minutes: default_refresh_minutes(),
            batch_timeout_secs: default_batch_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeather API key
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database path
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("tempwatch.db")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration and validate it.
    ///
    /// Returns the config along with any validation warnings.
    ///
    /// # Errors
    ///
    /// Fails on read/parse errors or when validation produces errors.
    pub fn load_validated_from(path: &Path) -> Result<(Self, ValidationResult)> {
        let config = Self::load_from(path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration.
    ///
    /// A location without sampling coordinates is rejected here, at
    /// configuration time, so the aggregation engine never sees one.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.locations.is_empty() {
            result.add_error("locations", "at least one location must be configured");
        }

        for (i, location) in self.locations.iter().enumerate() {
            let field = format!("locations[{i}]");

            if location.description.trim().is_empty() {
                result.add_error(field.clone(), "description must not be empty");
            }
            if location.coordinates.is_empty() {
                result.add_error(field.clone(), "location has no sampling coordinates");
            }
            for (j, coordinate) in location.coordinates.iter().enumerate() {
                if !(-90.0..=90.0).contains(&coordinate.latitude) {
                    result.add_error(
                        format!("{field}.coordinates[{j}]"),
                        format!("latitude {} out of range", coordinate.latitude),
                    );
                }
                if !(-180.0..=180.0).contains(&coordinate.longitude) {
                    result.add_error(
                        format!("{field}.coordinates[{j}]"),
                        format!("longitude {} out of range", coordinate.longitude),
                    );
                }
            }
        }

        let mut descriptions: Vec<&str> = self
            .locations
            .iter()
            .map(|l| l.description.as_str())
            .collect();
        descriptions.sort_unstable();
        descriptions.dedup();
        if descriptions.len() != self.locations.len() {
            result.add_warning(
                "locations",
                "duplicate descriptions; later readings overwrite earlier ones",
            );
        }

        if self.schedule.refresh_minutes == 0 {
            result.add_warning("schedule.refresh_minutes", "scheduler disabled (0 minutes)");
        }
        if self.schedule.batch_timeout_secs == 0 {
            result.add_error(
                "schedule.batch_timeout_secs",
                "batch timeout must be greater than 0",
            );
        }

        if self.weather.api_key.trim().is_empty() {
            result.add_error("weather.api_key", "OpenWeather API key must be set");
        }

        result
    }

    /// Time between two scheduled batch runs.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.schedule.refresh_minutes) * 60)
    }

    /// Deadline for one whole batch run.
    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.schedule.batch_timeout_secs)
    }
}
