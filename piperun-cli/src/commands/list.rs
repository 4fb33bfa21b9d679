//! List command handler

use anyhow::Result;
use colored::*;

use crate::config::Config;
use crate::display::print_definitions;

/// List the saved definitions
pub fn handle_list_command(config: &Config) -> Result<()> {
    let store = config.store()?;
    let definitions = store.list()?;

    if definitions.is_empty() {
        println!(
            "{} {}",
            "No saved definitions in".yellow(),
            store.dir().display()
        );
        return Ok(());
    }

    println!(
        "{}",
        format!("Saved definitions ({}):", definitions.len()).bold()
    );
    print_definitions(&definitions);

    Ok(())
}
