/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use gitops_backend::cli::commands;
use gitops_backend::cli::{parse_cli, Commands};
use gitops_utils::logging::prelude::*;
use gitops_utils::ReloadableConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = parse_cli();

    let config = ReloadableConfig::new(cli.config.clone())?;
    let settings = config.static_config();
    gitops_utils::logging::init_with_format(&settings.log.level, &settings.log.format)?;

    match gitops_utils::telemetry::init(&settings.telemetry, &settings.log.level) {
        Ok(true) => info!("OpenTelemetry export enabled to {}", settings.telemetry.otlp_endpoint),
        Ok(false) => {}
        Err(e) => warn!("Failed to initialize telemetry, continuing without it: {}", e),
    }

    match cli.command {
        Commands::Serve => commands::serve(&config).await?,
        Commands::Sweep => commands::sweep(&config).await?,
        Commands::Migrate => commands::migrate(&config)?,
    }

    Ok(())
}
