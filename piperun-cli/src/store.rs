//! Saved definitions
//!
//! Read-only lookup of run definitions saved as `<name>.json` files in one
//! directory. Path separators in a name are stored as `_`.

use anyhow::{Context, Result, bail};
use piperun_core::domain::definition::RunDefinition;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory of saved run definitions
#[derive(Debug, Clone)]
pub struct DefinitionStore {
    dir: PathBuf,
}

impl DefinitionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a definition named `name` is saved in
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(file_name(name))
    }

    /// Loads one saved definition
    ///
    /// Returns `None` when nothing is saved under that name.
    pub fn get(&self, name: &str) -> Result<Option<RunDefinition>> {
        let path = self.path_for(name);
        if !path.is_file() {
            debug!("No saved definition at {}", path.display());
            return Ok(None);
        }

        load(&path).map(Some)
    }

    /// Loads one saved definition, failing when it does not exist
    pub fn require(&self, name: &str) -> Result<RunDefinition> {
        match self.get(name)? {
            Some(definition) => Ok(definition),
            None => bail!(
                "No saved definition named '{}' in {}",
                name,
                self.dir.display()
            ),
        }
    }

    /// Loads every saved definition, sorted by name
    ///
    /// Unreadable or invalid files are skipped with a warning.
    pub fn list(&self) -> Result<Vec<RunDefinition>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read directory {}", self.dir.display()))?;

        let mut definitions = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match load(&path) {
                Ok(definition) => definitions.push(definition),
                Err(e) => warn!("Skipping {}: {:#}", path.display(), e),
            }
        }

        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(definitions)
    }
}

/// `<name>.json`, with path separators in the name replaced by `_`
pub fn file_name(name: &str) -> String {
    format!("{}.json", name.replace(['/', '\\'], "_"))
}

fn load(path: &Path) -> Result<RunDefinition> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read definition file {}", path.display()))?;
    let definition: RunDefinition = serde_json::from_str(&content)
        .with_context(|| format!("Invalid definition file {}", path.display()))?;
    definition.validate()?;
    Ok(definition)
}
