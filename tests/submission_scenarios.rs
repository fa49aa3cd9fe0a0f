//! End-to-end submission scenarios against a scripted transport.

mod common;

use common::{document, ENDPOINT};
use document_gateway::infrastructure::mocks::{MockCaptureLayer, MockTransport};
use document_gateway::{
    BuildError, ConfigError, RateLimitConfig, SubmissionGateway, SubmissionOutcome,
    TransportError, TransportResponse,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

fn gateway(period: Duration, limit: u32, transport: &MockTransport) -> SubmissionGateway {
    SubmissionGateway::builder()
        .with_period(period)
        .with_request_limit(limit)
        .with_transport(Arc::new(transport.clone()))
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_three_concurrent_then_one_after_window() {
    // Slow transport so the three calls overlap
    let transport = MockTransport::new().with_delay(Duration::from_millis(50));
    let gateway = gateway(Duration::from_secs(1), 1, &transport);
    let doc = document("doc-1");

    let (a, b, c) = tokio::join!(
        gateway.submit(ENDPOINT, &doc, "sig"),
        gateway.submit(ENDPOINT, &doc, "sig"),
        gateway.submit(ENDPOINT, &doc, "sig"),
    );
    let outcomes = [a.unwrap(), b.unwrap(), c.unwrap()];

    assert_eq!(outcomes.iter().filter(|o| o.is_success()).count(), 1);
    assert_eq!(outcomes.iter().filter(|o| o.is_throttled()).count(), 2);
    assert_eq!(transport.call_count(), 1);

    // Still inside the first window
    let outcome = gateway.submit(ENDPOINT, &doc, "sig").await.unwrap();
    assert!(outcome.is_throttled());

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let outcome = gateway.submit(ENDPOINT, &doc, "sig").await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn test_created_is_success() {
    let transport = MockTransport::new().with_response(TransportResponse::new(201, r#"{"id":"x"}"#));
    let gateway = gateway(Duration::from_secs(60), 10, &transport);

    let outcome = gateway.submit(ENDPOINT, &document("d"), "sig").await.unwrap();
    assert_eq!(
        outcome,
        SubmissionOutcome::Success {
            status: 201,
            body: r#"{"id":"x"}"#.to_string()
        }
    );
}

#[tokio::test]
async fn test_internal_error_is_failure() {
    let transport = MockTransport::new().with_response(TransportResponse::new(500, "oops"));
    let gateway = gateway(Duration::from_secs(60), 10, &transport);

    let outcome = gateway.submit(ENDPOINT, &document("d"), "sig").await.unwrap();
    assert_eq!(outcome.status(), Some(500));
    assert_eq!(outcome.body(), Some("oops"));
    assert!(outcome.is_failure());
}

#[tokio::test]
async fn test_transport_error_is_distinct_from_failure() {
    let transport = MockTransport::new().with_error(TransportError::Timeout);
    let gateway = gateway(Duration::from_secs(60), 10, &transport);

    let err = gateway
        .submit(ENDPOINT, &document("d"), "sig")
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert_eq!(gateway.metrics().failed(), 0);
    assert_eq!(gateway.metrics().errors(), 1);
}

#[test]
fn test_zero_request_limit_is_invalid_configuration() {
    assert_eq!(
        RateLimitConfig::new(Duration::from_secs(1), 0),
        Err(ConfigError::ZeroRequestLimit)
    );
}

#[tokio::test]
async fn test_builder_zero_request_limit() {
    let result = SubmissionGateway::builder()
        .with_request_limit(0)
        .with_transport(Arc::new(MockTransport::new()))
        .build();
    assert!(matches!(
        result,
        Err(BuildError::Config(ConfigError::ZeroRequestLimit))
    ));
}

#[tokio::test]
async fn test_no_retry_on_failure() {
    let transport = MockTransport::new()
        .with_response(TransportResponse::new(503, "unavailable"))
        .with_response(TransportResponse::new(201, "created"));
    let gateway = gateway(Duration::from_secs(60), 10, &transport);

    let outcome = gateway.submit(ENDPOINT, &document("d"), "sig").await.unwrap();
    assert!(outcome.is_failure());
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_throttled_submission_is_logged() {
    let capture = MockCaptureLayer::new();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let transport = MockTransport::new().with_response(TransportResponse::new(201, "created"));
    let gateway = gateway(Duration::from_secs(60), 1, &transport);

    gateway.submit(ENDPOINT, &document("first"), "sig").await.unwrap();
    gateway.submit(ENDPOINT, &document("second"), "sig").await.unwrap();

    let submitted = capture.with_message("document submitted");
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].level, Level::INFO);
    assert_eq!(submitted[0].field("doc_id"), Some("first"));
    assert_eq!(submitted[0].field("status"), Some("201"));

    let throttled = capture.with_message("request limit exceeded");
    assert_eq!(throttled.len(), 1);
    assert_eq!(throttled[0].level, Level::WARN);
    assert_eq!(throttled[0].field("doc_id"), Some("second"));
}

#[tokio::test]
async fn test_rejection_is_logged_with_body() {
    let capture = MockCaptureLayer::new();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let transport = MockTransport::new().with_response(TransportResponse::new(400, "bad inn"));
    let gateway = gateway(Duration::from_secs(60), 1, &transport);
    gateway.submit(ENDPOINT, &document("d"), "sig").await.unwrap();

    let rejected = capture.with_message("rejected");
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].level, Level::WARN);
    assert_eq!(rejected[0].field("body"), Some("bad inn"));
}

#[tokio::test]
async fn test_shutdown_keeps_gateway_usable() {
    let transport = MockTransport::new();
    let gateway = gateway(Duration::from_millis(10), 2, &transport);

    gateway.shutdown().await.expect("shutdown failed");

    assert!(gateway.submit(ENDPOINT, &document("a"), "s").await.unwrap().is_success());
    assert!(gateway.submit(ENDPOINT, &document("b"), "s").await.unwrap().is_success());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(gateway.submit(ENDPOINT, &document("c"), "s").await.unwrap().is_throttled());
}
