pub mod app;
pub mod config;
pub mod error;

pub use app::App;
pub use config::{Config, ScheduleConfig, StorageConfig, ValidationResult, WeatherConfig};
pub use error::AppError;

use anyhow::Result;

/// Initialize logging for the application.
///
/// # Errors
///
/// Currently infallible; kept fallible for future setup steps.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("tempwatch core initialized");
    Ok(())
}
