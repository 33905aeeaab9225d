//! ZapClient behavior against a mocked ZAP control API.

use std::time::Duration;

use scanward_core::{ApiKey, EngineError, ScanEngine, ScanId, ScanTarget, Severity};
use scanward_zap::{ZapClient, ZapConfig};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, key: &str) -> ZapClient {
    ZapClient::new(&ZapConfig {
        base_url: server.uri(),
        api_key: ApiKey::new(key),
        request_timeout: Duration::from_millis(500),
    })
    .unwrap()
}

fn target() -> ScanTarget {
    ScanTarget::parse("http://example.test").unwrap()
}

#[tokio::test]
async fn access_url_sends_target_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/JSON/core/action/accessUrl/"))
        .and(query_param("url", "http://example.test"))
        .and(query_param("apikey", "k3y"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Result": "OK"})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server, "k3y").access_url(&target()).await.unwrap();
}

#[tokio::test]
async fn empty_api_key_is_still_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/JSON/ascan/action/scan/"))
        .and(query_param("apikey", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"scan": "42"})))
        .expect(1)
        .mount(&server)
        .await;

    let id = client_for(&server, "")
        .start_active_scan(&target())
        .await
        .unwrap();
    assert_eq!(id, ScanId("42".to_string()));
}

#[tokio::test]
async fn scan_progress_parses_string_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/JSON/ascan/view/status/"))
        .and(query_param("scanId", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "40"})))
        .mount(&server)
        .await;

    let progress = client_for(&server, "")
        .scan_progress(&ScanId("42".to_string()))
        .await
        .unwrap();
    assert_eq!(progress, 40);
}

#[tokio::test]
async fn non_numeric_status_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/JSON/ascan/view/status/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
        .mount(&server)
        .await;

    let err = client_for(&server, "")
        .scan_progress(&ScanId("1".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Malformed { .. }), "{err}");
}

#[tokio::test]
async fn non_success_status_is_engine_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/JSON/ascan/action/scan/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal failure"))
        .mount(&server)
        .await;

    let err = client_for(&server, "")
        .start_active_scan(&target())
        .await
        .unwrap_err();
    match err {
        EngineError::Status { status, body, .. } => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal failure");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn bad_api_key_payload_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/JSON/core/action/accessUrl/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"code": "bad_api_key", "message": "Bad API Key"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server, "wrong")
        .access_url(&target())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Rejected { .. }), "{err}");
}

#[tokio::test]
async fn alerts_are_filtered_by_base_url_and_ordered() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/JSON/core/view/alerts/"))
        .and(query_param("baseurl", "http://example.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "alerts": [
                {"risk": "Low", "name": "Cookie without SameSite", "url": "http://example.test/", "description": "a"},
                {"risk": "High", "name": "SQLi", "url": "http://example.test/login", "description": "b"}
            ]
        })))
        .mount(&server)
        .await;

    let alerts = client_for(&server, "").alerts(&target()).await.unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].severity, Severity::Low);
    assert_eq!(alerts[1].severity, Severity::High);
    assert_eq!(alerts[1].name, "SQLi");
}

#[tokio::test]
async fn unknown_risk_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/JSON/core/view/alerts/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "alerts": [{"risk": "Catastrophic", "name": "?"}]
        })))
        .mount(&server)
        .await;

    let err = client_for(&server, "").alerts(&target()).await.unwrap_err();
    assert!(matches!(err, EngineError::Malformed { .. }), "{err}");
}

#[tokio::test]
async fn html_report_returns_raw_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/OTHER/core/other/htmlreport/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>report</html>"))
        .mount(&server)
        .await;

    let bytes = client_for(&server, "").html_report().await.unwrap();
    assert_eq!(bytes, b"<html>report</html>");
}

#[tokio::test]
async fn slow_engine_hits_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/JSON/ascan/view/status/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "10"}))
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&server)
        .await;

    let err = client_for(&server, "")
        .scan_progress(&ScanId("1".to_string()))
        .await
        .unwrap_err();
    assert!(err.is_transport(), "{err}");
}

#[tokio::test]
async fn unreachable_engine_is_transport_error() {
    let client = ZapClient::new(&ZapConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        request_timeout: Duration::from_millis(500),
        ..Default::default()
    })
    .unwrap();

    let err = client.access_url(&target()).await.unwrap_err();
    assert!(err.is_transport(), "{err}");
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zap/JSON/ascan/view/status/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 100})))
        .mount(&server)
        .await;

    let client = ZapClient::new(&ZapConfig {
        base_url: format!("{}/zap/", server.uri()),
        ..Default::default()
    })
    .unwrap();
    let progress = client.scan_progress(&ScanId("0".to_string())).await.unwrap();
    assert_eq!(progress, 100);
}
