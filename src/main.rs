use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use foodgrid_demo::cli::{commands, Cli};
use foodgrid_demo::config::DemoConfig;
use foodgrid_demo::telemetry::init_telemetry;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let demo_config = match &cli.config {
        Some(path) => {
            let _ = DemoConfig::load_env_file();
            DemoConfig::load_from(path)?
        }
        None => foodgrid_demo::config()?.clone(),
    };

    init_telemetry(&demo_config.observability)?;
    tracing::debug!(api = %demo_config.api.base_url, "Configuration loaded");

    commands::run(cli, &demo_config)
}
