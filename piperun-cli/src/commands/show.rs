//! Show command handler

use anyhow::Result;
use colored::*;

use crate::config::Config;

/// Print one saved definition as JSON
pub fn handle_show_command(name: &str, config: &Config) -> Result<()> {
    let definition = config.store()?.require(name)?;

    println!("{}", format!("Definition '{}':", definition.name).bold());
    println!("{}", serde_json::to_string_pretty(&definition)?);

    Ok(())
}
