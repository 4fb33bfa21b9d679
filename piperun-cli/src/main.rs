//! Piperun CLI
//!
//! Command-line interface for triggering batches of remote pipeline runs.

mod commands;
mod config;
mod display;
mod store;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "piperun")]
#[command(about = "Trigger, approve and monitor batches of pipeline runs", long_about = None)]
struct Cli {
    /// Organization on the remote build service
    #[arg(long, global = true, env = "AZURE_DEVOPS_ORGANIZATION_NAME")]
    organization: Option<String>,

    /// Personal access token for the remote build service
    #[arg(
        long,
        global = true,
        env = "AZURE_DEVOPS_PERSONAL_ACCESS_TOKEN",
        hide_env_values = true
    )]
    token: Option<String>,

    /// Directory holding saved definitions (defaults to ~/.piperun)
    #[arg(long, global = true, env = "PIPERUN_HOME")]
    home: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "piperun=debug"
    } else {
        "piperun=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config {
        organization: cli.organization,
        token: cli.token,
        home: cli.home,
    };

    handle_command(cli.command, &config).await
}
