//! Run definition domain types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::error::DefinitionError;

/// Branch used when a definition does not name one
pub const DEFAULT_BRANCH: &str = "main";

/// Named bundle identifying one remote pipeline plus the runs to execute against it
///
/// The `name` is the definition's identity and never changes during a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDefinition {
    pub name: String,
    #[serde(rename = "project_name")]
    pub project: String,
    #[serde(deserialize_with = "string_or_number")]
    pub definition_id: String,
    pub pipeline_name: String,
    #[serde(rename = "branch_name", default = "default_branch")]
    pub branch: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub runs: Vec<ParameterSet>,
}

/// One concrete set of inputs for a single triggered run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    #[serde(default)]
    pub parameters: BTreeMap<String, JsonValue>,
}

impl RunDefinition {
    /// Creates a definition on the default branch with no runs
    pub fn new(
        name: impl Into<String>,
        project: impl Into<String>,
        definition_id: impl Into<String>,
        pipeline_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            project: project.into(),
            definition_id: definition_id.into(),
            pipeline_name: pipeline_name.into(),
            branch: DEFAULT_BRANCH.to_string(),
            runs: Vec::new(),
        }
    }

    /// Sets the branch to run against
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Appends a parameter set
    pub fn with_run(mut self, run: ParameterSet) -> Self {
        self.runs.push(run);
        self
    }

    /// Checks that every identifying field is non-empty
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let fields = [
            ("name", &self.name),
            ("project_name", &self.project),
            ("definition_id", &self.definition_id),
            ("pipeline_name", &self.pipeline_name),
        ];

        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(DefinitionError::EmptyField {
                    definition: self.name.clone(),
                    field,
                });
            }
        }

        Ok(())
    }
}

impl ParameterSet {
    /// Builds a parameter set from key/value pairs
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<JsonValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            parameters: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

/// Accepts `"42"` and `42` alike
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ParameterSet>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ParameterSet>>::deserialize(deserializer)?.unwrap_or_default())
}
