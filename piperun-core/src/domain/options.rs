//! Batch execution options

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DefinitionError;

/// Flags shared by every definition in a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOptions {
    /// Block until every run reaches a terminal state
    pub wait: bool,
    /// Approve pending manual gates automatically
    pub auto_approve: bool,
    /// Use the local simulated gateway instead of the remote service
    pub dry_run: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            wait: true,
            auto_approve: true,
            dry_run: false,
        }
    }
}

impl ExecutionOptions {
    pub fn with_wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// How the runs of one definition are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One run after another
    Sequential,
    /// All runs at once
    Parallel,
}

impl ExecutionMode {
    pub const ALL: [ExecutionMode; 2] = [ExecutionMode::Sequential, ExecutionMode::Parallel];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Sequential => "sequential",
            ExecutionMode::Parallel => "parallel",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExecutionMode::Sequential => "It runs one pipeline after another",
            ExecutionMode::Parallel => "It runs all pipelines at once",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = DefinitionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| DefinitionError::InvalidMode {
                value: value.to_string(),
                valid: Self::ALL
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ExecutionOptions::default();
        assert!(options.wait);
        assert!(options.auto_approve);
        assert!(!options.dry_run);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(
            "sequential".parse::<ExecutionMode>().unwrap(),
            ExecutionMode::Sequential
        );
        assert_eq!(
            " Parallel ".parse::<ExecutionMode>().unwrap(),
            ExecutionMode::Parallel
        );

        let err = "fanout".parse::<ExecutionMode>().unwrap_err();
        assert!(err.to_string().contains("sequential, parallel"));
        assert!("".parse::<ExecutionMode>().is_err());
    }
}
