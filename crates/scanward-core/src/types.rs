//! Core domain types for a scan run.
//!
//! These types describe what the orchestrator exchanges with the external
//! scanning engine: the target under test, the engine-assigned scan id,
//! the alerts the engine reports, and the lifecycle phases of a run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Target ────────────────────────────────────────────────────────

/// URL of the system under test. Immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ScanTarget(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid scan target '{target}': {reason}")]
pub struct InvalidTarget {
    pub target: String,
    pub reason: &'static str,
}

impl ScanTarget {
    /// Validate and wrap a target URL. Only `http://` and `https://` are accepted.
    pub fn parse(raw: &str) -> Result<Self, InvalidTarget> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InvalidTarget {
                target: raw.to_string(),
                reason: "target URL is empty",
            });
        }
        let lower = trimmed.to_ascii_lowercase();
        let rest = lower
            .strip_prefix("http://")
            .or_else(|| lower.strip_prefix("https://"));
        match rest {
            Some(host) if !host.is_empty() => Ok(Self(trimmed.to_string())),
            Some(_) => Err(InvalidTarget {
                target: raw.to_string(),
                reason: "target URL has no host",
            }),
            None => Err(InvalidTarget {
                target: raw.to_string(),
                reason: "target URL must start with http:// or https://",
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Engine identifiers ────────────────────────────────────────────

/// Identifier the engine assigns to an active scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ScanId(pub String);

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque engine credential. May be empty; never printed.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("ApiKey(<empty>)")
        } else {
            f.write_str("ApiKey(<redacted>)")
        }
    }
}

// ── Findings ──────────────────────────────────────────────────────

/// Alert severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Informational,
    Low,
    Medium,
    High,
}

impl Severity {
    /// All severities, most severe first.
    pub const DESCENDING: [Severity; 4] = [
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Informational,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Informational => "Informational",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown severity '{0}'. Choose: informational, low, medium, high")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "informational" | "info" => Ok(Self::Informational),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

/// A single finding reported by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Alert {
    pub severity: Severity,
    pub name: String,
    pub url: String,
    pub description: String,
}

/// Everything retrieved in the reporting phase.
///
/// `artifact` is `None` when the rendered report could not be fetched;
/// the alerts are kept regardless.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub alerts: Vec<Alert>,
    pub artifact: Option<Vec<u8>>,
}

// ── Lifecycle ─────────────────────────────────────────────────────

/// Lifecycle phase of a scan session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    Seeded,
    PassiveWait,
    Scanning,
    Done,
    Reported,
    Succeeded,
    Failed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Whether `next` is a legal transition from this phase.
    ///
    /// The happy path only moves forward one step at a time. Any
    /// non-terminal phase may fail.
    pub fn can_advance_to(&self, next: Phase) -> bool {
        use Phase::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Init, Seeded)
            | (Seeded, PassiveWait)
            | (PassiveWait, Scanning)
            | (Scanning, Done)
            | (Done, Reported)
            | (Reported, Succeeded) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Seeded => "seeded",
            Self::PassiveWait => "passive_wait",
            Self::Scanning => "scanning",
            Self::Done => "done",
            Self::Reported => "reported",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
