//! Validate command handler

use anyhow::{Context, Result};
use colored::*;
use piperun_core::dto::definition::DefinitionDocument;

use crate::display::print_definitions;

/// Parse and validate a definition file, then summarize it
pub fn handle_validate_command(path: &str) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read definition file: {}", path))?;

    let definitions = DefinitionDocument::parse(&content)
        .with_context(|| format!("Invalid definition file: {}", path))?;

    println!(
        "{}",
        format!("✓ {} definition(s) are valid", definitions.len())
            .green()
            .bold()
    );
    println!();
    print_definitions(&definitions);

    for definition in definitions.iter().filter(|d| d.runs.is_empty()) {
        println!(
            "  {} '{}' has no runs and will not trigger anything",
            "!".yellow().bold(),
            definition.name
        );
    }

    Ok(())
}
