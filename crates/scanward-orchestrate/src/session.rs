//! State of a single orchestration run.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use scanward_core::{ApiKey, Phase, ScanError, ScanId, ScanTarget};

/// One orchestration run. Owned and mutated only by the orchestrator.
#[derive(Debug)]
pub struct ScanSession {
    run_id: Uuid,
    target: ScanTarget,
    engine_url: String,
    api_key: ApiKey,
    scan_id: Option<ScanId>,
    phase: Phase,
    progress: u8,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl ScanSession {
    pub fn new(target: ScanTarget, engine_url: &str, api_key: ApiKey) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            target,
            engine_url: engine_url.to_string(),
            api_key,
            scan_id: None,
            phase: Phase::Init,
            progress: 0,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn target(&self) -> &ScanTarget {
        &self.target
    }

    pub fn engine_url(&self) -> &str {
        &self.engine_url
    }

    /// The credential the run was configured with. Its `Debug` output is redacted.
    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn scan_id(&self) -> Option<&ScanId> {
        self.scan_id.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Move to `next`, refusing anything but the lifecycle's forward edges.
    pub fn advance(&mut self, next: Phase) -> Result<(), ScanError> {
        if !self.phase.can_advance_to(next) {
            return Err(ScanError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!(run_id = %self.run_id, from = %self.phase, to = %next, "Phase transition");
        self.phase = next;
        Ok(())
    }

    /// Mark the run failed. No-op once terminal.
    pub fn fail(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = Phase::Failed;
        }
    }

    pub fn record_scan_id(&mut self, scan_id: ScanId) {
        self.scan_id = Some(scan_id);
    }

    /// Fold an engine progress report into the session.
    ///
    /// Progress never decreases: a lower value than already observed is
    /// logged and ignored. Returns the session's progress afterwards.
    pub fn observe_progress(&mut self, reported: u8) -> u8 {
        let reported = reported.min(100);
        if reported < self.progress {
            tracing::warn!(
                run_id = %self.run_id,
                previous = self.progress,
                reported,
                "Engine reported progress regression, keeping previous value"
            );
        } else {
            self.progress = reported;
        }
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 100
    }
}
