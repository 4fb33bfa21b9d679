//! Engine configuration
//!
//! Defines the polling intervals, approval-check window and worker pool size
//! used while supervising remote runs.

use std::time::Duration;

/// Engine configuration
///
/// All intervals are configurable so that tests can run with near-zero sleeps
/// and slow remote services can be polled less aggressively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// How often a waiting execution polls its run status
    pub status_interval: Duration,

    /// How often the approval check polls the remote service
    pub approval_interval: Duration,

    /// Upper bound of a single approval check
    pub approval_timeout: Duration,

    /// After this long with the run in progress and no pending approval,
    /// the run is assumed not to need one
    pub approval_grace: Duration,

    /// How often the parallel monitor polls the active runs
    pub monitor_interval: Duration,

    /// Max concurrent approval probes
    pub max_approval_probes: usize,

    /// Consecutive transient status errors tolerated before a run is given up
    pub max_status_errors: u32,
}

impl EngineConfig {
    /// Creates a configuration with the default intervals
    pub fn new() -> Self {
        Self {
            status_interval: Duration::from_secs(10),
            approval_interval: Duration::from_secs(2),
            approval_timeout: Duration::from_secs(30),
            approval_grace: Duration::from_secs(10),
            monitor_interval: Duration::from_secs(10),
            max_approval_probes: 10,
            max_status_errors: 5,
        }
    }

    /// Uses the same interval for every poll loop
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.status_interval = interval;
        self.approval_interval = interval;
        self.monitor_interval = interval;
        self
    }

    /// Sets the approval-check window and its grace period
    pub fn with_approval_window(mut self, timeout: Duration, grace: Duration) -> Self {
        self.approval_timeout = timeout;
        self.approval_grace = grace;
        self
    }

    /// Creates configuration from environment variables
    ///
    /// Every variable is optional and falls back to the default:
    /// - PIPERUN_STATUS_INTERVAL (seconds, default: 10)
    /// - PIPERUN_APPROVAL_INTERVAL (seconds, default: 2)
    /// - PIPERUN_APPROVAL_TIMEOUT (seconds, default: 30)
    /// - PIPERUN_APPROVAL_GRACE (seconds, default: 10)
    /// - PIPERUN_MONITOR_INTERVAL (seconds, default: 10)
    /// - PIPERUN_MAX_APPROVAL_PROBES (default: 10)
    /// - PIPERUN_MAX_STATUS_ERRORS (default: 5)
    pub fn from_env() -> Self {
        let defaults = Self::new();

        Self {
            status_interval: env_secs("PIPERUN_STATUS_INTERVAL").unwrap_or(defaults.status_interval),
            approval_interval: env_secs("PIPERUN_APPROVAL_INTERVAL")
                .unwrap_or(defaults.approval_interval),
            approval_timeout: env_secs("PIPERUN_APPROVAL_TIMEOUT")
                .unwrap_or(defaults.approval_timeout),
            approval_grace: env_secs("PIPERUN_APPROVAL_GRACE").unwrap_or(defaults.approval_grace),
            monitor_interval: env_secs("PIPERUN_MONITOR_INTERVAL")
                .unwrap_or(defaults.monitor_interval),
            max_approval_probes: std::env::var("PIPERUN_MAX_APPROVAL_PROBES")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(defaults.max_approval_probes),
            max_status_errors: std::env::var("PIPERUN_MAX_STATUS_ERRORS")
                .ok()
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(defaults.max_status_errors),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_approval_probes == 0 {
            anyhow::bail!("max_approval_probes must be greater than 0");
        }

        if self.approval_timeout.is_zero() {
            anyhow::bail!("approval_timeout must be greater than 0");
        }

        if self.max_status_errors == 0 {
            anyhow::bail!("max_status_errors must be greater than 0");
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}
