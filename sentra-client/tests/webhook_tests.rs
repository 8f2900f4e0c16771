use chrono::{TimeZone, Utc};
use sentra_client::{fetch_text, with_token, ClientError, WebhookReport, WebhookSink};
use sentra_guard::{GuardError, ThreatSink};
use sentra_types::{Severity, ThreatEvent, ThreatKind};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn event() -> ThreatEvent {
    ThreatEvent::new(
        ThreatKind::IntegrityMismatch,
        "binary digest changed",
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 5).unwrap(),
        Severity::Fatal,
    )
}

// ── Payload ──────────────────────────────────────────────────────

#[test]
fn report_uses_type_details_timestamp() {
    let report = WebhookReport::from(&event());
    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!({
            "type": "integrity_mismatch",
            "details": "binary digest changed",
            "timestamp": "2026-03-01 09:30:05"
        })
    );
}

// ── Token ────────────────────────────────────────────────────────

#[test]
fn token_is_url_encoded() {
    assert_eq!(
        with_token("https://h.example.com/exec", Some("a b&c=d")),
        "https://h.example.com/exec?token=a%20b%26c%3Dd"
    );
}

#[test]
fn token_respects_existing_query() {
    assert_eq!(
        with_token("https://h.example.com/exec?v=2", Some("t")),
        "https://h.example.com/exec?v=2&token=t"
    );
}

#[test]
fn blank_token_is_ignored() {
    assert_eq!(with_token("https://h.example.com", Some("  ")), "https://h.example.com");
    assert_eq!(with_token("https://h.example.com", None), "https://h.example.com");
}

#[test]
fn empty_url_is_rejected() {
    let err = WebhookSink::new(" ", None, Duration::from_secs(1)).unwrap_err();
    assert!(matches!(err, ClientError::Config(_)));
}

// ── Delivery ─────────────────────────────────────────────────────

#[tokio::test]
async fn sink_posts_report_with_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(query_param("token", "s3cr3t/+"))
        .and(body_json(json!({
            "type": "integrity_mismatch",
            "details": "binary digest changed",
            "timestamp": "2026-03-01 09:30:05"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let sink = WebhookSink::new(
        &format!("{}/hook", server.uri()),
        Some("s3cr3t/+"),
        Duration::from_secs(5),
    )
    .unwrap();
    sink.report(&event()).await.unwrap();
}

#[tokio::test]
async fn failed_delivery_is_a_report_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sink = WebhookSink::new(&server.uri(), Some("tok"), Duration::from_secs(5)).unwrap();
    let err = sink.report(&event()).await.unwrap_err();
    assert!(matches!(err, GuardError::Report(_)));
    assert!(!err.to_string().contains("tok"));
}

#[test]
fn debug_does_not_leak_the_token() {
    let sink = WebhookSink::new("https://h.example.com", Some("s3cr3t"), Duration::from_secs(1))
        .unwrap();
    assert!(!format!("{sink:?}").contains("s3cr3t"));
}

// ── Announcement ─────────────────────────────────────────────────

#[tokio::test]
async fn fetch_text_trims_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/announcement.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("  Maintenance at 22:00\n"))
        .mount(&server)
        .await;

    let text = fetch_text(
        &reqwest::Client::new(),
        &format!("{}/announcement.txt", server.uri()),
    )
    .await
    .unwrap();
    assert_eq!(text, "Maintenance at 22:00");
}

#[tokio::test]
async fn fetch_text_fails_on_missing_resource() {
    let server = MockServer::start().await;
    let err = fetch_text(&reqwest::Client::new(), &format!("{}/nope", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
}
