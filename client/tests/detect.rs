//! Integration tests for `DetectorClient` against a mock backend.

use vigil_client::{
    DetectorClient, EndpointConfig, FallbackCause, ResultOrigin, TransportError, ValidationError,
};
use vigil_types::RiskLevel;
use wiremock::matchers::{any, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server_uri: &str) -> DetectorClient {
    DetectorClient::new(Some(EndpointConfig::new(server_uri)))
}

const VERDICT_BODY: &str = r#"{
    "post": "check this message",
    "predicted_skills": ["threat_detection", "toxicity"],
    "output": [
        {"label": "threat", "confidence": 0.87},
        {"label": "insult", "confidence": 0.41}
    ],
    "harmful": true,
    "risk_level": "MEDIUM",
    "timestamp": "2026-08-21T09:30:00.000Z"
}"#;

#[tokio::test]
async fn success_returns_backend_verdict_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(VERDICT_BODY, "application/json"))
        .mount(&server)
        .await;

    let outcome = client_for(&server.uri())
        .analyze("check this message")
        .await
        .expect("non-empty input");

    assert!(matches!(outcome.origin, ResultOrigin::Backend));
    let result = outcome.result;
    assert_eq!(result.post, "check this message");
    assert_eq!(result.predicted_skills, vec!["threat_detection", "toxicity"]);
    assert_eq!(result.output.len(), 2);
    assert_eq!(result.output[0].label, "threat");
    assert!((result.output[0].confidence - 0.87).abs() < f64::EPSILON);
    assert!(result.harmful);
    assert_eq!(result.risk_level, RiskLevel::Medium);
    assert_eq!(result.timestamp, "2026-08-21T09:30:00.000Z");
}

#[tokio::test]
async fn request_carries_trimmed_body_and_skip_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/detect"))
        .and(header("ngrok-skip-browser-warning", "true"))
        .and(body_json(serde_json::json!({"text": "hello world"})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"post": "hello world", "harmful": false, "risk_level": "SAFE"}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client_for(&server.uri())
        .analyze("  hello world  \n")
        .await
        .expect("non-empty input");

    assert!(matches!(outcome.origin, ResultOrigin::Backend));
    assert_eq!(outcome.result.post, "hello world");
}

#[tokio::test]
async fn empty_input_is_rejected_without_network() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server.uri())
        .analyze("   \n\t  ")
        .await
        .expect_err("whitespace-only input must not analyze");

    assert_eq!(err, ValidationError);
    let received = server.received_requests().await;
    assert!(matches!(received, Some(reqs) if reqs.is_empty()));
}

#[tokio::test]
async fn server_error_falls_back_with_capped_detail() {
    let server = MockServer::start().await;
    let huge_body = "x".repeat(600);
    Mock::given(method("POST"))
        .and(path("/api/detect"))
        .respond_with(ResponseTemplate::new(500).set_body_string(huge_body))
        .mount(&server)
        .await;

    // 33 bytes, odd length: threat template.
    let text = "I will find you and make you pay.";
    let outcome = client_for(&server.uri())
        .analyze(text)
        .await
        .expect("failures fall back, never error");

    assert_eq!(outcome.result.post, text);
    assert_eq!(outcome.result.risk_level, RiskLevel::High);
    assert!(outcome.result.harmful);

    let ResultOrigin::Fallback(FallbackCause::Transport(TransportError::Status {
        status,
        detail,
    })) = outcome.origin
    else {
        panic!("expected a status fallback, got {:?}", outcome.origin);
    };
    assert_eq!(status.as_u16(), 500);
    assert_eq!(detail.chars().count(), 200);
    assert!(detail.ends_with("..."));
}

#[tokio::test]
async fn malformed_success_body_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>tunnel warning</html>"))
        .mount(&server)
        .await;

    let outcome = client_for(&server.uri())
        .analyze("hi")
        .await
        .expect("failures fall back, never error");

    assert!(matches!(
        outcome.origin,
        ResultOrigin::Fallback(FallbackCause::Transport(TransportError::Malformed(_)))
    ));
    assert_eq!(outcome.result.post, "hi");
}

#[tokio::test]
async fn missing_endpoint_always_falls_back() {
    let client = DetectorClient::new(None);
    assert!(!client.is_configured());

    let text = "This is a harmless status update about my weekend plans.";
    let outcome = client.analyze(text).await.expect("non-empty input");

    assert_eq!(outcome.result.post, text);
    assert_eq!(outcome.result.risk_level, RiskLevel::Safe);
    assert!(!outcome.result.harmful);

    let ResultOrigin::Fallback(cause) = outcome.origin else {
        panic!("expected a fallback origin");
    };
    assert!(matches!(cause, FallbackCause::NotConfigured));
    assert!(cause.reason().contains("no backend configured"));
}

#[tokio::test]
async fn unreachable_backend_falls_back() {
    // A non-pooled server: `MockServer::start()` hands out a server from a
    // shared pool whose port stays open after drop, so the backend would
    // still answer 404 instead of refusing the connection.
    let server = MockServer::builder().start().await;
    let uri = server.uri();
    drop(server);

    let outcome = client_for(&uri)
        .analyze("anything")
        .await
        .expect("failures fall back, never error");

    assert!(matches!(
        outcome.origin,
        ResultOrigin::Fallback(FallbackCause::Transport(TransportError::Connection { .. }))
    ));
    assert_eq!(outcome.result.post, "anything");
}

#[tokio::test]
async fn optional_fields_default_in_backend_verdicts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"post": "hi", "harmful": false, "risk_level": "LOW"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let outcome = client_for(&server.uri())
        .analyze("hi")
        .await
        .expect("non-empty input");

    assert!(matches!(outcome.origin, ResultOrigin::Backend));
    assert!(outcome.result.predicted_skills.is_empty());
    assert!(outcome.result.output.is_empty());
    assert!(outcome.result.timestamp.is_empty());
}

#[tokio::test]
async fn fallback_template_selection_follows_input_length() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/detect"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());

    let even = client.analyze("ab").await.expect("non-empty input");
    assert_eq!(even.result.risk_level, RiskLevel::Safe);

    let odd = client.analyze("abc").await.expect("non-empty input");
    assert_eq!(odd.result.risk_level, RiskLevel::High);
}
