//! Configuration for a scan orchestration run.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use scanward_core::config::duration;
use scanward_core::{ApiKey, ScanError, ScanTarget, Severity};
use scanward_zap::ZapConfig;

/// Settings for one orchestration run.
///
/// Loaded from the `[scan]` section of `scanward.toml` or
/// `SCANWARD__SCAN__` environment variables, then overridden by CLI flags.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Base URL of the engine control API.
    #[serde(default = "default_local_url")]
    pub engine_url: String,

    /// URL of the system under test.
    #[serde(default = "default_local_url")]
    pub target_url: String,

    /// Engine API key; may be empty.
    #[serde(default)]
    pub api_key: ApiKey,

    /// Grace period for passive analysis before the active scan starts.
    #[serde(default = "default_passive_wait", with = "duration")]
    pub passive_wait: Duration,

    /// Delay between status checks.
    #[serde(default = "default_poll_interval", with = "duration")]
    pub poll_interval: Duration,

    /// Upper bound on the whole polling loop.
    #[serde(default = "default_poll_timeout", with = "duration")]
    pub poll_timeout: Duration,

    /// Optional cap on the number of status checks.
    #[serde(default)]
    pub max_polls: Option<u32>,

    /// Timeout for each individual engine request.
    #[serde(default = "default_request_timeout", with = "duration")]
    pub request_timeout: Duration,

    /// Alerts at or above this severity are summarized.
    #[serde(default = "default_notable_threshold")]
    pub notable_threshold: Severity,

    /// Fail the run when any alert is at or above this severity.
    #[serde(default)]
    pub fail_on: Option<Severity>,

    /// Characters of description kept in the summary.
    #[serde(default = "default_description_limit")]
    pub description_limit: usize,

    /// Where the rendered report is written.
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,
}

fn default_local_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_passive_wait() -> Duration {
    Duration::from_secs(5)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_poll_timeout() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_notable_threshold() -> Severity {
    Severity::Medium
}

fn default_description_limit() -> usize {
    100
}

fn default_report_path() -> PathBuf {
    PathBuf::from("security-report.html")
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            engine_url: default_local_url(),
            target_url: default_local_url(),
            api_key: ApiKey::default(),
            passive_wait: default_passive_wait(),
            poll_interval: default_poll_interval(),
            poll_timeout: default_poll_timeout(),
            max_polls: None,
            request_timeout: default_request_timeout(),
            notable_threshold: default_notable_threshold(),
            fail_on: None,
            description_limit: default_description_limit(),
            report_path: default_report_path(),
        }
    }
}

impl ScanConfig {
    /// Reject settings that would make a run meaningless or unbounded.
    pub fn validate(&self) -> Result<(), ScanError> {
        self.target()?;
        if self.engine_url.trim().is_empty() {
            return Err(ScanError::Config("engine_url is empty".to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(ScanError::Config("poll_interval must be greater than zero".to_string()));
        }
        if self.poll_timeout.is_zero() {
            return Err(ScanError::Config("poll_timeout must be greater than zero".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(ScanError::Config(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_polls == Some(0) {
            return Err(ScanError::Config("max_polls must be at least 1".to_string()));
        }
        if self.report_path.file_name().is_none() {
            return Err(ScanError::Config(format!(
                "report_path '{}' does not name a file",
                self.report_path.display()
            )));
        }
        Ok(())
    }

    pub fn target(&self) -> Result<ScanTarget, ScanError> {
        ScanTarget::parse(&self.target_url).map_err(|e| ScanError::Config(e.to_string()))
    }

    /// Engine client settings derived from this run's configuration.
    pub fn zap_config(&self) -> ZapConfig {
        ZapConfig {
            base_url: self.engine_url.clone(),
            api_key: self.api_key.clone(),
            request_timeout: self.request_timeout,
        }
    }
}
