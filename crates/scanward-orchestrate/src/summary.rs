//! Run summary and outcome.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use scanward_core::{Phase, ScanError, ScanId, ScanReport, ScanTarget, Severity};

use crate::classify::{self, AlertSummary};
use crate::report::ReportStatus;
use crate::session::ScanSession;

/// What a completed run found.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub run_id: Uuid,
    pub target: ScanTarget,
    pub scan_id: Option<ScanId>,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
    pub notable_threshold: Severity,
    pub total_alerts: usize,
    pub counts: BTreeMap<Severity, usize>,
    pub notable: Vec<AlertSummary>,
    pub report: ReportStatus,
    /// Size of the saved report, when there is one.
    pub report_bytes: Option<usize>,
}

fn as_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis().try_into().unwrap_or(u64::MAX))
}

impl ScanSummary {
    pub fn build(
        session: &ScanSession,
        scan_report: &ScanReport,
        threshold: Severity,
        description_limit: usize,
        report: ReportStatus,
    ) -> Self {
        let alerts = &scan_report.alerts;
        let (notable, _) = classify::partition(alerts, threshold);
        Self {
            run_id: session.run_id(),
            target: session.target().clone(),
            scan_id: session.scan_id().cloned(),
            started_at: session.started_at(),
            duration: session.elapsed(),
            notable_threshold: threshold,
            total_alerts: alerts.len(),
            counts: classify::severity_counts(alerts),
            notable: notable
                .into_iter()
                .map(|a| AlertSummary::from_alert(a, description_limit))
                .collect(),
            report,
            report_bytes: scan_report.artifact.as_ref().map(Vec::len),
        }
    }
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Security scan of {} finished in {:.1}s",
            self.target,
            self.duration.as_secs_f64()
        )?;

        let counts: Vec<String> = Severity::DESCENDING
            .iter()
            .map(|s| format!("{} {}", self.counts.get(s).copied().unwrap_or(0), s))
            .collect();
        writeln!(f, "Alerts: {} total ({})", self.total_alerts, counts.join(", "))?;

        if self.notable.is_empty() {
            writeln!(f, "No alerts at or above {} found", self.notable_threshold)?;
        } else {
            writeln!(
                f,
                "{} alert(s) at or above {}:",
                self.notable.len(),
                self.notable_threshold
            )?;
            for alert in &self.notable {
                writeln!(f, "- {} Risk: {}", alert.severity, alert.name)?;
                writeln!(f, "  URL: {}", alert.url)?;
                writeln!(f, "  Description: {}", alert.description)?;
            }
        }

        match &self.report {
            ReportStatus::Saved { path } => {
                write!(f, "Report saved as {}", path.display())?;
                match self.report_bytes {
                    Some(bytes) => write!(f, " ({bytes} bytes)"),
                    None => Ok(()),
                }
            }
            ReportStatus::Unavailable { reason } => write!(f, "Report unavailable: {reason}"),
        }
    }
}

/// Terminal result of a run.
#[derive(Debug)]
pub enum RunOutcome {
    Succeeded(ScanSummary),
    Failed {
        /// Phase the run was in when it failed.
        phase: Phase,
        error: ScanError,
        /// Present when alerts were collected before failing.
        summary: Option<ScanSummary>,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn summary(&self) -> Option<&ScanSummary> {
        match self {
            Self::Succeeded(summary) => Some(summary),
            Self::Failed { summary, .. } => summary.as_ref(),
        }
    }

    pub fn error(&self) -> Option<&ScanError> {
        match self {
            Self::Succeeded(_) => None,
            Self::Failed { error, .. } => Some(error),
        }
    }

    /// Process exit status: 0 on success, 1 otherwise.
    pub fn exit_status(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}
