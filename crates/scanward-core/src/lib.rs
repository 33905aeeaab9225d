//! scanward-core: Shared types, configuration, and error handling for scanward.
//!
//! This crate provides the foundational pieces used by the engine client
//! and the orchestrator:
//! - Scan domain types (targets, alerts, severities, lifecycle phases)
//! - The `ScanEngine` trait, the seam to the external scanning engine
//! - Layered configuration loading and duration parsing
//! - Common error types

pub mod config;
pub mod engine;
pub mod error;
pub mod types;

pub use engine::ScanEngine;
pub use error::{EngineError, ScanError};
pub use types::{Alert, ApiKey, Phase, ScanId, ScanReport, ScanTarget, Severity};
