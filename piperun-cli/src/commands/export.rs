//! Export command handler
//!
//! Writes a saved definition to a standalone JSON file that `validate` and
//! `run --from-file` accept.

use anyhow::{Context, Result};
use colored::*;
use piperun_core::domain::definition::RunDefinition;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::store;

/// Export one saved definition
pub fn handle_export_command(name: &str, output: Option<&str>, config: &Config) -> Result<()> {
    let definition = config.store()?.require(name)?;
    let path = export_path(&definition.name, output);

    write_definition(&definition, &path)?;

    println!(
        "{}",
        format!("✓ Definition '{}' exported", definition.name)
            .green()
            .bold()
    );
    println!("  File: {}", path.display());
    println!("  Runs: {}", definition.runs.len());

    Ok(())
}

/// `output` with a `.json` extension, or `<name>.json` in the working directory
fn export_path(name: &str, output: Option<&str>) -> PathBuf {
    match output {
        Some(output) if output.ends_with(".json") => PathBuf::from(output),
        Some(output) => PathBuf::from(format!("{}.json", output)),
        None => PathBuf::from(store::file_name(name)),
    }
}

fn write_definition(definition: &RunDefinition, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let content = serde_json::to_string_pretty(definition)?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use piperun_core::domain::definition::ParameterSet;
    use piperun_core::dto::definition::DefinitionDocument;
    use tempfile::tempdir;

    #[test]
    fn test_export_path() {
        assert_eq!(export_path("team/nightly", None), PathBuf::from("team_nightly.json"));
        assert_eq!(
            export_path("nightly", Some("out/nightly")),
            PathBuf::from("out/nightly.json")
        );
        assert_eq!(
            export_path("nightly", Some("backup.json")),
            PathBuf::from("backup.json")
        );
    }

    #[test]
    fn test_exported_file_is_a_valid_definition_file() {
        let dir = tempdir().unwrap();
        let definition = RunDefinition::new("nightly", "platform", "42", "deploy")
            .with_branch("release")
            .with_run(ParameterSet::from_pairs([("region", "eu")]));
        let path = dir.path().join("nested").join("nightly.json");

        write_definition(&definition, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed = DefinitionDocument::parse(&content).unwrap();
        assert_eq!(parsed, vec![definition]);
    }

    #[test]
    fn test_export_saved_definition() {
        let home = tempdir().unwrap();
        let runners = home.path().join("runners");
        fs::create_dir_all(&runners).unwrap();
        fs::write(
            runners.join("nightly.json"),
            r#"{"name": "nightly", "project_name": "p", "definition_id": 7, "pipeline_name": "x"}"#,
        )
        .unwrap();
        let config = Config {
            organization: None,
            token: None,
            home: Some(home.path().to_path_buf()),
        };
        let output = home.path().join("exported.json");

        handle_export_command("nightly", output.to_str(), &config).unwrap();

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.contains("\"definition_id\": \"7\""));
        assert!(content.contains("\"branch_name\": \"main\""));
    }

    #[test]
    fn test_export_unknown_definition() {
        let home = tempdir().unwrap();
        let config = Config {
            organization: None,
            token: None,
            home: Some(home.path().to_path_buf()),
        };

        assert!(handle_export_command("missing", None, &config).is_err());
    }
}
