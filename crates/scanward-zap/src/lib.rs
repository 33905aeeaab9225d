//! scanward-zap: OWASP ZAP control API client.
//!
//! Implements [`scanward_core::ScanEngine`] over ZAP's JSON/OTHER HTTP API.

pub mod client;
pub mod wire;

pub use client::{ZapClient, ZapConfig};
