//! Piperun HTTP Client
//!
//! A small, type-safe HTTP client for the Azure DevOps pipelines API.
//!
//! Only the operations the batch runner needs are covered: triggering a run,
//! reading a run, listing approvals and updating approvals.
//!
//! # Example
//!
//! ```no_run
//! use piperun_client::{DevOpsClient, RunPipelineRequest};
//! use std::collections::BTreeMap;
//!
//! #[tokio::main]
//! async fn main() -> piperun_client::Result<()> {
//!     let client = DevOpsClient::new("my-org", "personal-access-token");
//!
//!     let request = RunPipelineRequest::new("main", BTreeMap::new());
//!     let run = client.run_pipeline("my-project", "42", &request).await?;
//!
//!     println!("Started run: {}", run.id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod approvals;
mod models;
mod runs;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use models::{
    ApprovalList, ApprovalUpdate, PipelineApproval, PipelineOwner, PipelineReference, PipelineRun,
    RunPipelineRequest,
};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Base URL of the hosted service
pub const DEFAULT_BASE_URL: &str = "https://dev.azure.com";

/// REST API version sent with every request
pub const API_VERSION: &str = "7.1";

/// HTTP client for the Azure DevOps pipelines API
///
/// Requests are authenticated with HTTP basic auth using an empty user name
/// and a personal access token as the password.
#[derive(Clone)]
pub struct DevOpsClient {
    /// Organization URL (e.g., "https://dev.azure.com/my-org")
    base_url: String,
    /// Personal access token
    token: String,
    /// HTTP client instance
    client: Client,
}

impl std::fmt::Debug for DevOpsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevOpsClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl DevOpsClient {
    /// Create a client for an organization on the hosted service
    ///
    /// # Example
    /// ```
    /// use piperun_client::DevOpsClient;
    ///
    /// let client = DevOpsClient::new("my-org", "token");
    /// assert_eq!(client.base_url(), "https://dev.azure.com/my-org");
    /// ```
    pub fn new(organization: &str, token: impl Into<String>) -> Self {
        Self::with_base_url(format!("{}/{}", DEFAULT_BASE_URL, organization), token)
    }

    /// Create a client against an explicit organization URL
    ///
    /// Useful for on-premises servers and for tests.
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(base_url, token, Client::new())
    }

    /// Create a client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        token: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        }
    }

    /// Get the organization URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a project-scoped API URL
    fn project_url(&self, project: &str, path: &str) -> String {
        format!("{}/{}/_apis/{}", self.base_url, project, path)
    }

    /// Attach auth and api-version to a request
    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .basic_auth("", Some(&self.token))
            .query(&[("api-version", API_VERSION)])
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        debug!("{} {}", status, response.url().path());

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is not needed
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();
        debug!("{} {}", status, response.url().path());

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = DevOpsClient::new("contoso", "secret");
        assert_eq!(client.base_url(), "https://dev.azure.com/contoso");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = DevOpsClient::with_base_url("http://localhost:8080/tfs/", "secret");
        assert_eq!(client.base_url(), "http://localhost:8080/tfs");
    }

    #[test]
    fn test_project_url() {
        let client = DevOpsClient::new("contoso", "secret");
        assert_eq!(
            client.project_url("web", "pipelines/3/runs"),
            "https://dev.azure.com/contoso/web/_apis/pipelines/3/runs"
        );
    }

    #[test]
    fn test_debug_hides_token() {
        let client = DevOpsClient::new("contoso", "very-secret");
        let debug = format!("{:?}", client);
        assert!(!debug.contains("very-secret"));
    }
}
