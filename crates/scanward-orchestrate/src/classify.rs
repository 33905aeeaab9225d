//! Alert classification against a severity threshold.

use std::collections::BTreeMap;

use serde::Serialize;

use scanward_core::{Alert, Severity};

/// Split alerts into (notable, other), keeping engine order within each.
pub fn partition(alerts: &[Alert], threshold: Severity) -> (Vec<&Alert>, Vec<&Alert>) {
    alerts.iter().partition(|a| a.severity >= threshold)
}

pub fn count_at_or_above(alerts: &[Alert], threshold: Severity) -> usize {
    alerts.iter().filter(|a| a.severity >= threshold).count()
}

/// Number of alerts per severity. Every severity is present, possibly zero.
pub fn severity_counts(alerts: &[Alert]) -> BTreeMap<Severity, usize> {
    let mut counts: BTreeMap<Severity, usize> =
        Severity::DESCENDING.iter().map(|s| (*s, 0)).collect();
    for alert in alerts {
        *counts.entry(alert.severity).or_default() += 1;
    }
    counts
}

/// Keep the first `limit` characters, marking the cut with `...`.
pub fn truncate_description(text: &str, limit: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", text[..idx].trim_end()),
        None => text.to_string(),
    }
}

/// Human-facing digest of one notable alert.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AlertSummary {
    pub severity: Severity,
    pub name: String,
    pub url: String,
    pub description: String,
}

impl AlertSummary {
    pub fn from_alert(alert: &Alert, description_limit: usize) -> Self {
        Self {
            severity: alert.severity,
            name: alert.name.clone(),
            url: alert.url.clone(),
            description: truncate_description(&alert.description, description_limit),
        }
    }
}
