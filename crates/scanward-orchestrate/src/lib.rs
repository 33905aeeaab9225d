//! scanward-orchestrate: Security scan orchestration.
//!
//! Drives an external scanning engine through a fixed lifecycle (seed the
//! target, wait for passive analysis, run an active scan to completion,
//! collect alerts and the rendered report) and turns the result into a
//! summary plus a pass/fail outcome.

pub mod cancel;
pub mod classify;
pub mod config;
pub mod orchestrator;
pub mod report;
pub mod session;
pub mod summary;

pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use config::ScanConfig;
pub use orchestrator::ScanOrchestrator;
pub use summary::{RunOutcome, ScanSummary};
