use std::path::PathBuf;

use anyhow::Result;

use tempwatch_core::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tempwatch_core::init()?;

    let config_path = parse_config_path();
    let (config, _validation) = Config::load_validated_from(&config_path)?;

    tracing::info!(
        path = %config_path.display(),
        locations = config.locations.len(),
        "configuration loaded"
    );

    let app = App::new(config)?;
    app.run().await
}

/// Accepts `-f <path>` or `--config <path>`, defaulting to the bundled
/// sample config.
fn parse_config_path() -> PathBuf {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "-f" || arg == "--config" {
            if let Some(path) = args.next() {
                return PathBuf::from(path);
            }
        }
    }
    PathBuf::from("configs/default.toml")
}
