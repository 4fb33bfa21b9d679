//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod export;
mod list;
mod run;
mod show;
mod validate;

pub use run::RunArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Trigger the runs of one or more definitions
    Run(RunArgs),
    /// Check a definition file without running it
    Validate {
        /// Path to a definition file
        path: String,
    },
    /// List saved definitions
    List,
    /// Print a saved definition as JSON
    Show {
        /// Name of the saved definition
        name: String,
    },
    /// Write a saved definition to a JSON file
    Export {
        /// Name of the saved definition
        name: String,
        /// Output file (default: <name>.json)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Run(args) => run::handle_run_command(args, config).await,
        Commands::Validate { path } => validate::handle_validate_command(&path),
        Commands::List => list::handle_list_command(config),
        Commands::Show { name } => show::handle_show_command(&name, config),
        Commands::Export { name, output } => {
            export::handle_export_command(&name, output.as_deref(), config)
        }
    }
}
