//! Scan orchestration state machine.
//!
//! ```text
//! INIT -> SEEDED -> PASSIVE_WAIT -> SCANNING -> DONE -> REPORTED -> SUCCEEDED
//!                                                                \-> FAILED
//! ```
//!
//! Every engine request and every sleep is raced against the cancellation
//! token. The polling loop is bounded by `poll_timeout` (and `max_polls`
//! when set), so an engine that never reaches 100% cannot stall a run.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::Instrument;

use scanward_core::{EngineError, Phase, ScanEngine, ScanError, ScanReport, ScanTarget};

use crate::cancel::CancelToken;
use crate::classify;
use crate::config::ScanConfig;
use crate::report::{self, ArtifactError, ReportStatus};
use crate::session::ScanSession;
use crate::summary::{RunOutcome, ScanSummary};

/// Drives one scan run against a [`ScanEngine`].
///
/// Each orchestrator owns its engine handle and configuration; independent
/// instances can run concurrently, one per target.
pub struct ScanOrchestrator<E> {
    engine: E,
    config: ScanConfig,
    cancel: CancelToken,
}

impl<E: ScanEngine> ScanOrchestrator<E> {
    pub fn new(engine: E, config: ScanConfig, cancel: CancelToken) -> Self {
        Self {
            engine,
            config,
            cancel,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Execute the full lifecycle and report how it ended.
    pub async fn run(&self) -> RunOutcome {
        let target = match self.config.target() {
            Ok(target) => target,
            Err(error) => {
                tracing::error!(error = %error, "Invalid scan target");
                return RunOutcome::Failed {
                    phase: Phase::Init,
                    error,
                    summary: None,
                };
            }
        };

        let mut session = ScanSession::new(
            target,
            &self.config.engine_url,
            self.config.api_key.clone(),
        );
        let span = tracing::info_span!(
            "scan",
            run_id = %session.run_id(),
            target = %session.target(),
        );

        async move {
            tracing::info!(
                engine = %session.engine_url(),
                api_key = ?session.api_key(),
                "Starting security scan"
            );

            match self.drive(&mut session).await {
                Ok((report, status)) => self.conclude(session, report, status),
                Err(error) => {
                    let phase = session.phase();
                    session.fail();
                    if error.is_cancelled() {
                        tracing::warn!(phase = %phase, "Security scan cancelled");
                    } else {
                        tracing::error!(
                            phase = %phase,
                            scan_id = ?session.scan_id(),
                            progress = session.progress(),
                            error = %error,
                            "Security scan failed"
                        );
                    }
                    RunOutcome::Failed {
                        phase,
                        error,
                        summary: None,
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Seed → passive wait → active scan → poll → report.
    async fn drive(
        &self,
        session: &mut ScanSession,
    ) -> Result<(ScanReport, ReportStatus), ScanError> {
        let target = session.target().clone();

        session.advance(Phase::Seeded)?;
        self.call(self.engine.access_url(&target)).await?;
        tracing::info!("Target URL accessed");

        session.advance(Phase::PassiveWait)?;
        tracing::debug!(
            wait_ms = self.config.passive_wait.as_millis(),
            "Waiting for passive scan"
        );
        self.pause(self.config.passive_wait).await?;

        session.advance(Phase::Scanning)?;
        let scan_id = self.call(self.engine.start_active_scan(&target)).await?;
        tracing::info!(scan_id = %scan_id, "Active scan started");
        session.record_scan_id(scan_id);

        self.await_completion(session).await?;
        session.advance(Phase::Done)?;
        tracing::info!("Scan completed");

        session.advance(Phase::Reported)?;
        self.collect_report(&target).await
    }

    /// Poll until the engine reports 100%, bounded by `poll_timeout`.
    async fn await_completion(&self, session: &mut ScanSession) -> Result<(), ScanError> {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now()
            .checked_add(self.config.poll_timeout)
            .unwrap_or_else(far_future);

        let polled =
            tokio::time::timeout_at(deadline, self.poll_until_complete(session, started)).await;

        match polled {
            Ok(result) => result,
            Err(_) => Err(ScanError::Timeout {
                waited: started.elapsed(),
                progress: session.progress(),
            }),
        }
    }

    async fn poll_until_complete(
        &self,
        session: &mut ScanSession,
        started: Instant,
    ) -> Result<(), ScanError> {
        let scan_id = session.scan_id().cloned().ok_or(ScanError::InvalidTransition {
            from: session.phase(),
            to: Phase::Done,
        })?;
        let mut polls: u32 = 0;

        loop {
            let reported = self.call(self.engine.scan_progress(&scan_id)).await?;
            polls += 1;
            let progress = session.observe_progress(reported);
            tracing::info!(scan_id = %scan_id, progress, "Scan progress: {progress}%");

            if session.is_complete() {
                return Ok(());
            }
            if self.config.max_polls.is_some_and(|max| polls >= max) {
                tracing::warn!(polls, "Maximum status checks reached");
                return Err(ScanError::Timeout {
                    waited: started.elapsed(),
                    progress,
                });
            }

            self.pause(self.config.poll_interval).await?;
        }
    }

    /// Fetch alerts (fatal on failure) and the rendered report (not fatal).
    async fn collect_report(
        &self,
        target: &ScanTarget,
    ) -> Result<(ScanReport, ReportStatus), ScanError> {
        let alerts = self.call(self.engine.alerts(target)).await?;
        tracing::info!(alerts = alerts.len(), "Alerts retrieved");

        let mut report = ScanReport {
            alerts,
            artifact: None,
        };

        let fetched = self.until_cancelled(self.engine.html_report()).await?;
        let saved = match fetched {
            Ok(bytes) => {
                if self.cancel.is_cancelled() {
                    return Err(ScanError::Cancelled);
                }
                let written = report::write_atomically(&self.config.report_path, &bytes).await;
                written.map(|()| bytes)
            }
            Err(e) => Err(ArtifactError::Fetch(e)),
        };

        let status = match saved {
            Ok(bytes) => {
                let path = self.config.report_path.clone();
                tracing::info!(path = %path.display(), "Security report saved");
                report.artifact = Some(bytes);
                ReportStatus::Saved { path }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Report artifact unavailable");
                ReportStatus::from(&e)
            }
        };

        Ok((report, status))
    }

    /// Build the summary and apply the failure policy.
    fn conclude(
        &self,
        mut session: ScanSession,
        report: ScanReport,
        status: ReportStatus,
    ) -> RunOutcome {
        let summary = ScanSummary::build(
            &session,
            &report,
            self.config.notable_threshold,
            self.config.description_limit,
            status,
        );

        if let Some(threshold) = self.config.fail_on {
            let count = classify::count_at_or_above(&report.alerts, threshold);
            if count > 0 {
                let phase = session.phase();
                session.fail();
                tracing::error!(
                    count,
                    threshold = %threshold,
                    "Alerts violate failure policy"
                );
                return RunOutcome::Failed {
                    phase,
                    error: ScanError::PolicyViolation { count, threshold },
                    summary: Some(summary),
                };
            }
        }

        if let Err(error) = session.advance(Phase::Succeeded) {
            return RunOutcome::Failed {
                phase: session.phase(),
                error,
                summary: Some(summary),
            };
        }

        tracing::info!(
            scan_id = ?summary.scan_id,
            total_alerts = summary.total_alerts,
            notable = summary.notable.len(),
            duration_ms = summary.duration.as_millis(),
            "Security scan complete"
        );
        RunOutcome::Succeeded(summary)
    }

    /// Race `fut` against cancellation.
    async fn until_cancelled<F: Future>(&self, fut: F) -> Result<F::Output, ScanError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ScanError::Cancelled),
            out = fut => Ok(out),
        }
    }

    /// An engine request that is fatal on failure.
    async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, EngineError>>,
    ) -> Result<T, ScanError> {
        let result = self.until_cancelled(fut).await?;
        Ok(result?)
    }

    async fn pause(&self, duration: Duration) -> Result<(), ScanError> {
        self.until_cancelled(tokio::time::sleep(duration)).await
    }
}

fn far_future() -> tokio::time::Instant {
    // Roughly 30 years, same as tokio's own "never" deadline.
    tokio::time::Instant::now() + Duration::from_secs(86400 * 365 * 30)
}
