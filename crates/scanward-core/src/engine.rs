//! The seam between the orchestrator and an external scanning engine.

use std::future::Future;

use crate::error::EngineError;
use crate::types::{Alert, ScanId, ScanTarget};

/// Control operations the orchestrator needs from a scanning engine.
///
/// Implementations are expected to apply their own per-request timeout.
/// Cancellation and the overall polling bound are enforced by the caller.
pub trait ScanEngine {
    /// Ask the engine to access (crawl) the target.
    fn access_url(
        &self,
        target: &ScanTarget,
    ) -> impl Future<Output = Result<(), EngineError>> + Send;

    /// Start an active scan against the target and return its identifier.
    fn start_active_scan(
        &self,
        target: &ScanTarget,
    ) -> impl Future<Output = Result<ScanId, EngineError>> + Send;

    /// Current progress of an active scan, 0–100.
    fn scan_progress(&self, scan_id: &ScanId)
        -> impl Future<Output = Result<u8, EngineError>> + Send;

    /// Alerts recorded for URLs under the target, in engine order.
    fn alerts(
        &self,
        target: &ScanTarget,
    ) -> impl Future<Output = Result<Vec<Alert>, EngineError>> + Send;

    /// The rendered report as raw bytes.
    fn html_report(&self) -> impl Future<Output = Result<Vec<u8>, EngineError>> + Send;
}
