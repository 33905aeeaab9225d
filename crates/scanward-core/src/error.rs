use std::time::Duration;

use thiserror::Error;

use crate::types::{Phase, Severity};

/// Failure of a single request to the scanning engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Transport error calling {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    #[error("Engine returned HTTP {status} for {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Engine rejected {endpoint} ({code}): {message}")]
    Rejected {
        endpoint: String,
        code: String,
        message: String,
    },

    #[error("Malformed response from {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },
}

impl EngineError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Run-level error taxonomy for a scan session.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Transport error: {0}")]
    Transport(#[source] EngineError),

    #[error("Engine error: {0}")]
    Engine(#[source] EngineError),

    #[error("Scan did not complete within {}s (last progress {progress}%)", waited.as_secs())]
    Timeout { waited: Duration, progress: u8 },

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Policy violation: {count} alert(s) at or above {threshold}")]
    PolicyViolation { count: usize, threshold: Severity },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Illegal phase transition {from} -> {to}")]
    InvalidTransition { from: Phase, to: Phase },
}

impl From<EngineError> for ScanError {
    fn from(err: EngineError) -> Self {
        if err.is_transport() {
            Self::Transport(err)
        } else {
            Self::Engine(err)
        }
    }
}

impl ScanError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
