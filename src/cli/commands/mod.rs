use anyhow::{Context, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::config::DemoConfig;
use crate::flows::FlowCatalog;
use crate::session::{DemoSession, FileTokenStore};

use super::{Cli, Commands};

pub mod check;
pub mod flows;
pub mod reset;
pub mod show;
pub mod token;
pub mod walkthrough;

pub use check::{CheckActionCommand, CheckCommand, GuardVerdict};
pub use flows::FlowsCommand;
pub use reset::ResetCommand;
pub use show::ShowCommand;
pub use token::TokenCommand;
pub use walkthrough::{WalkthroughCommand, WalkthroughSummary};

/// Exit status for a guard refusal
pub const EXIT_BLOCKED: u8 = 2;

/// Builtin flows, then the configured flows file, then `file`
pub fn load_catalog(config: &DemoConfig, file: Option<&Path>) -> Result<FlowCatalog> {
    let mut catalog = FlowCatalog::builtin();
    let configured = config.demo.flows_file.as_deref().map(PathBuf::from);
    for path in configured.iter().map(PathBuf::as_path).chain(file) {
        let extra = FlowCatalog::from_path(path)
            .with_context(|| format!("Failed to load flows from {}", path.display()))?;
        catalog.merge(extra);
    }
    Ok(catalog)
}

/// Session persisted to `demo.session_file`
pub fn file_session(config: &DemoConfig) -> DemoSession {
    DemoSession::new(Arc::new(FileTokenStore::new(&config.demo.session_file)))
}

/// Drive an async command to completion on a current-thread runtime
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

pub fn run(cli: Cli, config: &DemoConfig) -> Result<ExitCode> {
    let Some(command) = cli.command else {
        show_getting_started();
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Flows { file } => {
            FlowsCommand::new(file).execute(config)?;
        }
        Commands::Show { flow, file, json } => {
            ShowCommand::new(flow).with_file(file).with_json(json).execute(config)?;
        }
        Commands::Check { method, path } => {
            let verdict = CheckCommand::new(method, path).execute(config)?;
            return Ok(verdict.exit_code());
        }
        Commands::CheckAction { action } => {
            let verdict = CheckActionCommand::new(action).execute(config)?;
            return Ok(verdict.exit_code());
        }
        Commands::Token { role, legacy } => {
            let command = TokenCommand::new(role).with_legacy_route(legacy);
            block_on(command.execute(config))??;
        }
        Commands::Reset { clear_session } => {
            let command = ResetCommand::new().with_clear_session(clear_session);
            block_on(command.execute(config))??;
        }
        Commands::Walkthrough {
            flow,
            events,
            file,
            json,
        } => {
            let flow = flow.unwrap_or_else(|| config.demo.default_flow.clone());
            let summary = WalkthroughCommand::new(flow)
                .with_events(events)
                .with_file(file)
                .with_json(json)
                .execute(config)?;
            if !summary.completed {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn show_getting_started() {
    println!("🍔 FoodGrid demo - guided tour tools");
    println!();
    println!("To get started:");
    println!("  📋 foodgrid-demo flows              # List available flows");
    println!("  🔍 foodgrid-demo show default       # Inspect a flow's steps");
    println!("  ▶️  foodgrid-demo walkthrough        # Replay the default tour");
    println!();
    println!("Demo backend:");
    println!("  🔑 foodgrid-demo token staff        # Fetch a role token");
    println!("  🧹 foodgrid-demo reset              # Reset demo data");
    println!();
    println!("Guard:");
    println!("  🛡️  foodgrid-demo check DELETE /api/v1/orders/1");
}
