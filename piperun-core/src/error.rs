//! Error types for definition documents

use thiserror::Error;

/// Errors raised while reading or validating run definitions
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// The document is not valid JSON or does not match the definition shape
    #[error("Invalid definition document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required field is present but empty
    #[error("Run definition '{definition}' has an empty '{field}' field")]
    EmptyField {
        /// Name of the offending definition (may itself be empty)
        definition: String,
        /// JSON field name
        field: &'static str,
    },

    /// An execution mode string did not match any known mode
    #[error("Invalid execution mode '{value}'. Valid values are: {valid}")]
    InvalidMode { value: String, valid: String },
}
