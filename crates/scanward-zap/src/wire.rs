//! ZAP JSON payload shapes and decoding.
//!
//! ZAP is loose about scalar types: scan ids and progress values arrive as
//! strings (`{"scan":"3"}`, `{"status":"40"}`) on most versions and as
//! numbers on some. Both are accepted here.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use scanward_core::types::ParseSeverityError;
use scanward_core::{Alert, EngineError, ScanId};

/// Response of `/JSON/ascan/action/scan/`.
#[derive(Debug, Deserialize)]
pub struct ScanStarted {
    pub scan: Value,
}

/// Response of `/JSON/ascan/view/status/`.
#[derive(Debug, Deserialize)]
pub struct ScanStatus {
    pub status: Value,
}

/// Response of `/JSON/core/view/alerts/`.
#[derive(Debug, Deserialize)]
pub struct AlertList {
    pub alerts: Vec<RawAlert>,
}

/// One alert as ZAP reports it. Only the fields we summarize are kept.
#[derive(Debug, Deserialize)]
pub struct RawAlert {
    pub risk: String,
    #[serde(default)]
    pub name: String,
    /// Older ZAP versions carry the alert title here instead of `name`.
    #[serde(default)]
    pub alert: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
}

impl RawAlert {
    pub fn into_alert(self) -> Result<Alert, ParseSeverityError> {
        let severity = self.risk.parse()?;
        let name = if self.name.is_empty() {
            self.alert
        } else {
            self.name
        };
        Ok(Alert {
            severity,
            name,
            url: self.url,
            description: self.description,
        })
    }
}

/// Error body ZAP returns for bad keys, missing parameters, etc.
#[derive(Debug, Deserialize)]
struct ApiErrorPayload {
    code: String,
    message: String,
}

/// Decode a JSON body, surfacing ZAP error payloads as [`EngineError::Rejected`].
pub fn decode<T: DeserializeOwned>(endpoint: &str, body: &[u8]) -> Result<T, EngineError> {
    if let Ok(err) = serde_json::from_slice::<ApiErrorPayload>(body) {
        return Err(EngineError::Rejected {
            endpoint: endpoint.to_string(),
            code: err.code,
            message: err.message,
        });
    }
    serde_json::from_slice(body).map_err(|e| EngineError::Malformed {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

/// Interpret a status value as a whole percentage.
///
/// Anything that is not a finite number in 0–100 is rejected rather than
/// read as zero progress.
pub fn parse_progress(value: &Value) -> Result<u8, String> {
    let number = match value {
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("status '{s}' is not a number"))?,
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("status {n} is not representable"))?,
        other => return Err(format!("status has unexpected type: {other}")),
    };

    if !number.is_finite() || !(0.0..=100.0).contains(&number) {
        return Err(format!("status {number} is outside 0-100"));
    }
    Ok(number.floor() as u8)
}

/// Interpret the `scan` field of a scan-start response.
pub fn parse_scan_id(value: &Value) -> Result<ScanId, String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(ScanId(s.trim().to_string())),
        Value::Number(n) => Ok(ScanId(n.to_string())),
        other => Err(format!("no usable scan id in {other}")),
    }
}

/// Cut a response body down to something fit for an error message.
pub fn excerpt(body: &[u8]) -> String {
    const LIMIT: usize = 200;
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    match text.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
