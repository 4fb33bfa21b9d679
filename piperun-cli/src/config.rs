//! Configuration module
//!
//! Credentials for the remote build service and the location of saved
//! definitions.

use anyhow::{Context, Result};
use piperun_client::DevOpsClient;
use std::env;
use std::path::PathBuf;

use crate::store::DefinitionStore;

/// CLI configuration
#[derive(Clone)]
pub struct Config {
    /// Organization on the remote build service
    pub organization: Option<String>,
    /// Personal access token
    pub token: Option<String>,
    /// Override of the piperun home directory
    pub home: Option<PathBuf>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("organization", &self.organization)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("home", &self.home)
            .finish()
    }
}

impl Config {
    /// Client for live runs, when both credentials are present
    pub fn client(&self) -> Option<DevOpsClient> {
        match (&self.organization, &self.token) {
            (Some(organization), Some(token))
                if !organization.trim().is_empty() && !token.trim().is_empty() =>
            {
                Some(DevOpsClient::new(organization.trim(), token.trim()))
            }
            _ => None,
        }
    }

    /// Piperun home directory (`--home`, `$PIPERUN_HOME` or `~/.piperun`)
    pub fn home_dir(&self) -> Result<PathBuf> {
        if let Some(home) = &self.home {
            return Ok(home.clone());
        }

        let home = env::var("HOME").context("HOME environment variable is not set")?;
        Ok(PathBuf::from(home).join(".piperun"))
    }

    /// Store of saved definitions under the home directory
    pub fn store(&self) -> Result<DefinitionStore> {
        Ok(DefinitionStore::new(self.home_dir()?.join("runners")))
    }
}
