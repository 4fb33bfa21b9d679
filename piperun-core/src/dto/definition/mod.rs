//! Run definition document
//!
//! A definition file holds either one definition object or a list of them:
//! `{name, project_name, definition_id, pipeline_name, branch_name?, runs: [{parameters: {...}}]}`.

use serde::{Deserialize, Serialize};

use crate::domain::definition::RunDefinition;
use crate::error::DefinitionError;

/// A definition document as found on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefinitionDocument {
    Many(Vec<RunDefinition>),
    One(RunDefinition),
}

impl DefinitionDocument {
    /// Parses a document without validating its contents
    pub fn from_json(content: &str) -> Result<Self, DefinitionError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parses and validates a document, returning its definitions in order
    pub fn parse(content: &str) -> Result<Vec<RunDefinition>, DefinitionError> {
        let definitions = Self::from_json(content)?.into_definitions();
        for definition in &definitions {
            definition.validate()?;
        }
        Ok(definitions)
    }

    pub fn into_definitions(self) -> Vec<RunDefinition> {
        match self {
            DefinitionDocument::Many(definitions) => definitions,
            DefinitionDocument::One(definition) => vec![definition],
        }
    }
}
