use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::role::Role;

pub mod commands;

#[derive(Parser)]
#[command(name = "foodgrid-demo")]
#[command(about = "Operator tools for the FoodGrid guided demo")]
#[command(long_about = "Inspect guided-tour flows, query the demo-mode guard, fetch demo role tokens \
                       and replay a tour end to end without a browser. Start with 'foodgrid-demo flows' \
                       to see what is available.")]
pub struct Cli {
    /// Configuration file to use instead of foodgrid-demo.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available flows
    Flows {
        /// Extra flow definitions to merge over the builtins
        #[arg(long, value_name = "FILE", help = "TOML or JSON file with additional flows")]
        file: Option<PathBuf>,
    },
    /// Print the steps and hints of a flow
    Show {
        /// Flow name
        flow: String,
        /// Extra flow definitions to merge over the builtins
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
        /// Print the flow as JSON
        #[arg(long, help = "Emit machine-readable JSON instead of a listing")]
        json: bool,
    },
    /// Ask the guard whether a request is allowed (exit code 2 when blocked)
    Check {
        /// HTTP method
        method: String,
        /// Request path, e.g. /api/v1/orders/42
        path: String,
    },
    /// Ask the guard whether a UI action is allowed (exit code 2 when disabled)
    CheckAction {
        /// Action name, e.g. export-data
        action: String,
    },
    /// Fetch a demo token for a role and store it in the session file
    Token {
        /// customer, kitchen, staff, cashier or admin
        role: Role,
        /// Use the older GET /api/v1/demo/auth/token/{role} route
        #[arg(long, help = "Request the token through the legacy route")]
        legacy: bool,
    },
    /// Reset the backend demo data
    Reset {
        /// Also forget stored role tokens
        #[arg(long, help = "Clear the session file after resetting")]
        clear_session: bool,
    },
    /// Replay a flow through the event bus and controller
    Walkthrough {
        /// Flow name (defaults to demo.default_flow)
        flow: Option<String>,
        /// JSON-lines file of events to replay instead of the flow's own completion events
        #[arg(long, value_name = "FILE")]
        events: Option<PathBuf>,
        /// Extra flow definitions to merge over the builtins
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
        /// Print the final overlay snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}
