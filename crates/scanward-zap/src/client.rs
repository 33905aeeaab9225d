//! HTTP client for the ZAP control API.

use std::time::Duration;

use serde_json::Value;

use scanward_core::{Alert, ApiKey, EngineError, ScanEngine, ScanError, ScanId, ScanTarget};

use crate::wire::{self, AlertList, ScanStarted, ScanStatus};

pub const ACCESS_URL: &str = "/JSON/core/action/accessUrl/";
pub const ASCAN_START: &str = "/JSON/ascan/action/scan/";
pub const ASCAN_STATUS: &str = "/JSON/ascan/view/status/";
pub const CORE_ALERTS: &str = "/JSON/core/view/alerts/";
pub const HTML_REPORT: &str = "/OTHER/core/other/htmlreport/";

/// Configuration for talking to a ZAP instance.
#[derive(Debug, Clone)]
pub struct ZapConfig {
    pub base_url: String,
    pub api_key: ApiKey,
    /// Applied to every request individually.
    pub request_timeout: Duration,
}

impl Default for ZapConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: ApiKey::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// ZAP control API client.
///
/// Clone is cheap (the inner reqwest client is reference counted), so one
/// client per orchestrator is the expected use.
#[derive(Clone)]
pub struct ZapClient {
    http: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
}

impl ZapClient {
    pub fn new(config: &ZapConfig) -> Result<Self, ScanError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| ScanError::Config(format!("Invalid engine URL '{base_url}': {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ScanError::Config(format!("Failed to build HTTP client: {e}")))?;

        tracing::debug!(
            base_url = %base_url,
            api_key = ?config.api_key,
            timeout_ms = config.request_timeout.as_millis(),
            "ZAP client configured"
        );

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a GET with the shared `apikey` parameter and return the raw body.
    async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Vec<u8>, EngineError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("apikey", self.api_key.expose())])
            .send()
            .await
            .map_err(|e| transport(endpoint, e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| transport(endpoint, e))?;

        if !status.is_success() {
            return Err(EngineError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: wire::excerpt(&body),
            });
        }

        tracing::debug!(
            endpoint,
            status = status.as_u16(),
            bytes = body.len(),
            "ZAP request complete"
        );
        Ok(body.to_vec())
    }
}

fn transport(endpoint: &str, err: reqwest::Error) -> EngineError {
    let message = if err.is_timeout() {
        format!("request timed out: {err}")
    } else {
        err.to_string()
    };
    EngineError::Transport {
        endpoint: endpoint.to_string(),
        message,
    }
}

impl ScanEngine for ZapClient {
    async fn access_url(&self, target: &ScanTarget) -> Result<(), EngineError> {
        let body = self.get(ACCESS_URL, &[("url", target.as_str())]).await?;
        let _: Value = wire::decode(ACCESS_URL, &body)?;
        Ok(())
    }

    async fn start_active_scan(&self, target: &ScanTarget) -> Result<ScanId, EngineError> {
        let body = self.get(ASCAN_START, &[("url", target.as_str())]).await?;
        let started: ScanStarted = wire::decode(ASCAN_START, &body)?;
        wire::parse_scan_id(&started.scan).map_err(|reason| EngineError::Malformed {
            endpoint: ASCAN_START.to_string(),
            reason,
        })
    }

    async fn scan_progress(&self, scan_id: &ScanId) -> Result<u8, EngineError> {
        let body = self.get(ASCAN_STATUS, &[("scanId", scan_id.0.as_str())]).await?;
        let status: ScanStatus = wire::decode(ASCAN_STATUS, &body)?;
        wire::parse_progress(&status.status).map_err(|reason| EngineError::Malformed {
            endpoint: ASCAN_STATUS.to_string(),
            reason,
        })
    }

    async fn alerts(&self, target: &ScanTarget) -> Result<Vec<Alert>, EngineError> {
        let body = self.get(CORE_ALERTS, &[("baseurl", target.as_str())]).await?;
        let list: AlertList = wire::decode(CORE_ALERTS, &body)?;
        list.alerts
            .into_iter()
            .map(|raw| {
                raw.into_alert().map_err(|e| EngineError::Malformed {
                    endpoint: CORE_ALERTS.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    async fn html_report(&self) -> Result<Vec<u8>, EngineError> {
        self.get(HTML_REPORT, &[]).await
    }
}
