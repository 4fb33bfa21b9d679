//! Run command handler
//!
//! Loads the definitions to run, executes them as one batch and prints what
//! happened. Ctrl-C stops waiting locally; runs already triggered keep going
//! on the remote service.

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::*;
use piperun_core::domain::definition::RunDefinition;
use piperun_core::domain::options::{ExecutionMode, ExecutionOptions};
use piperun_core::dto::definition::DefinitionDocument;
use piperun_engine::{BatchOrchestrator, BatchReport, EngineConfig, StandardGatewayFactory};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::Config;
use crate::display::{format_elapsed, print_batch_summary, print_definitions};

/// Arguments of `piperun run`
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Name of a saved definition
    #[arg(required_unless_present = "from_file", conflicts_with = "from_file")]
    name: Option<String>,

    /// Read the definitions from a file instead of the store
    #[arg(short, long)]
    from_file: Option<String>,

    /// How the runs of each definition are scheduled
    #[arg(short, long, default_value = "parallel")]
    mode: ExecutionMode,

    /// Return once every run is triggered
    #[arg(long)]
    no_wait: bool,

    /// Leave pending approvals to a human
    #[arg(long)]
    no_auto_approve: bool,

    /// Simulate the remote service locally
    #[arg(long)]
    dry_run: bool,

    /// Print the batch report as JSON
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn options(&self) -> ExecutionOptions {
        ExecutionOptions::default()
            .with_wait(!self.no_wait)
            .with_auto_approve(!self.no_auto_approve)
            .with_dry_run(self.dry_run)
    }
}

/// Handle `piperun run`
pub async fn handle_run_command(args: RunArgs, config: &Config) -> Result<()> {
    let definitions = load_definitions(&args, config)?;
    let options = args.options();

    let engine_config = EngineConfig::from_env();
    engine_config.validate()?;

    let client = config.client();
    if !options.dry_run && client.is_none() {
        bail!(
            "Missing credentials: set AZURE_DEVOPS_ORGANIZATION_NAME and \
             AZURE_DEVOPS_PERSONAL_ACCESS_TOKEN (or pass --organization/--token), \
             or use --dry-run"
        );
    }

    println!(
        "{}",
        format!(
            "Running {} definition(s) in {} mode{}",
            definitions.len(),
            args.mode,
            if options.dry_run { " (dry run)" } else { "" }
        )
        .bold()
    );
    print_definitions(&definitions);

    let orchestrator = BatchOrchestrator::new(
        args.mode,
        options,
        engine_config,
        Arc::new(StandardGatewayFactory::new(client)),
    );

    let started = Instant::now();
    let result = tokio::select! {
        result = orchestrator.run_all(&definitions) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, runs already triggered keep going on the remote service");
            info!("Total time elapsed: {}", format_elapsed(started.elapsed()));
            bail!("Interrupted by user");
        }
    };
    info!("Total time elapsed: {}", format_elapsed(started.elapsed()));

    match result {
        Ok(report) => print_report(&report, args.json),
        Err(aborted) => {
            print_report(&aborted.report, args.json)?;
            Err(anyhow::Error::new(aborted.error).context("Batch execution failed"))
        }
    }
}

fn print_report(report: &BatchReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_batch_summary(report);
    }
    Ok(())
}

/// Definitions named on the command line, from the store or a file
fn load_definitions(args: &RunArgs, config: &Config) -> Result<Vec<RunDefinition>> {
    if let Some(path) = &args.from_file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read definition file: {}", path))?;
        let definitions = DefinitionDocument::parse(&content)
            .with_context(|| format!("Invalid definition file: {}", path))?;
        if definitions.is_empty() {
            bail!("No definitions found in {}", path);
        }
        return Ok(definitions);
    }

    let Some(name) = &args.name else {
        bail!("Either a definition name or --from-file is required");
    };

    Ok(vec![config.store()?.require(name)?])
}
