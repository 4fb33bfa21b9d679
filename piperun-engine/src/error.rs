//! Error types for the execution engine

use piperun_client::ClientError;
use thiserror::Error;

use crate::report::{BatchReport, DefinitionReport};

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised by pipeline executions and gateways
#[derive(Debug, Error)]
pub enum PipelineError {
    /// `start()` called on an execution that already has a remote run
    #[error("The run {run_id} is already running")]
    AlreadyRunning { run_id: String },

    /// A status, approval or wait operation before `start()`
    #[error("The pipeline run must be started before {action}")]
    NotStarted { action: &'static str },

    /// The remote service answered with a non-success status
    #[error("Remote API error (status {status}): {body}")]
    RemoteApi { status: u16, body: String },

    /// The remote service could not be reached or answered garbage
    #[error("Remote service request failed: {0}")]
    Transport(String),

    /// A request could not be built from the given input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A live gateway was requested without credentials
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

impl PipelineError {
    /// Errors that come from talking to the remote service
    ///
    /// These are recoverable per run; the structural ones are not.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteApi { .. } | Self::Transport(_))
    }

    /// Remote errors worth retrying: unreachable service, throttling, 5xx
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::RemoteApi { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// A definition stopped before all of its runs were handled
///
/// Carries what was done up to the failure.
#[derive(Debug, Error)]
#[error("Execution of '{}' aborted: {error}", .report.name)]
pub struct DefinitionAborted {
    pub report: DefinitionReport,
    #[source]
    pub error: PipelineError,
}

impl DefinitionAborted {
    pub fn new(report: DefinitionReport, error: PipelineError) -> Self {
        Self { report, error }
    }
}

/// A batch stopped before all of its definitions were executed
///
/// The report holds every definition handled so far, the aborted one last.
#[derive(Debug, Error)]
#[error("Batch aborted: {error}")]
pub struct BatchAborted {
    pub report: BatchReport,
    #[source]
    pub error: PipelineError,
}

impl From<ClientError> for PipelineError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::ApiError { status, message } => PipelineError::RemoteApi {
                status,
                body: message,
            },
            other => PipelineError::Transport(other.to_string()),
        }
    }
}
