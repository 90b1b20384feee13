//! dockerutil - label-driven cron jobs and autoheal for Docker containers.

use std::path::Path;

use clap::Parser;
use tracing::{error, info, warn};

use dockerutil_config::{Config, ConfigLoader, ConfigValidator};
use dockerutil_core::Service;

mod cli;
mod logging;
mod signal;

use cli::{Cli, Commands, DEFAULT_CONFIG_PATH};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load(path)?,
        None => ConfigLoader::load_or_default(Path::new(DEFAULT_CONFIG_PATH))?,
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            logging::init_tracing(&config.logging)?;
            run(config).await
        }
        Commands::CheckConfig => check_config(&config),
    }
}

/// Run the daemon until SIGINT/SIGTERM.
async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting dockerutil v{}", env!("CARGO_PKG_VERSION"));

    for warning in ConfigValidator::validate(&config).into_result()? {
        warn!("Config {}: {}", warning.path, warning.message);
    }

    let mut service = Service::connect(&config).await?;
    if let Err(e) = service.start().await {
        error!("Failed to start: {}", e);
        service.shutdown().await?;
        return Err(e.into());
    }

    let cancel = service.cancel_token();
    let signal_result = tokio::select! {
        result = signal::shutdown_signal() => result,
        _ = cancel.cancelled() => Ok(()),
    };

    service.shutdown().await?;
    signal_result?;
    Ok(())
}

/// Print validation results for the loaded config.
fn check_config(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let result = ConfigValidator::validate(config);

    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for err in &result.errors {
        println!("error: {}: {}", err.path, err.message);
    }

    if result.is_valid() {
        println!("Configuration OK");
    }
    result.into_result()?;
    Ok(())
}
