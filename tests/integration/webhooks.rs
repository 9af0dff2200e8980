//! Integration tests for webhook subscriptions and inbound verification

use super::*;
use integrations_motive::types::CreateWebhookRequest;
use integrations_motive::webhooks::{signature, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use integrations_motive::{MotiveErrorKind, WebhookEvent};
use pretty_assertions::assert_eq;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

const SECRET: &str = "whsec_test";

fn signed_headers(body: &[u8], timestamp: Option<i64>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let signature = match timestamp {
        Some(ts) => {
            headers.insert(
                HeaderName::from_bytes(TIMESTAMP_HEADER.as_bytes()).unwrap(),
                HeaderValue::from_str(&ts.to_string()).unwrap(),
            );
            signature::generate_with_timestamp(body, SECRET, ts)
        }
        None => signature::generate(body, SECRET),
    };
    headers.insert(
        HeaderName::from_bytes(SIGNATURE_HEADER.as_bytes()).unwrap(),
        HeaderValue::from_str(&signature).unwrap(),
    );
    headers
}

#[test]
fn test_signature_round_trip() {
    let payload = br#"{"event":"vehicle.updated","data":{}}"#;
    let signature = signature::generate(payload, SECRET);

    assert!(signature::verify(payload, &signature, SECRET));

    let mut tampered = payload.to_vec();
    tampered[10] ^= 0x01;
    assert!(!signature::verify(&tampered, &signature, SECRET));
}

#[tokio::test]
async fn test_register_webhook() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/v2/company_webhooks"))
        .and(body_json(json!({
            "url": "https://hooks.example.com/motive",
            "secret": SECRET,
            "actions": ["vehicle.updated", "fault_code.opened"],
            "enabled": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "company_webhook": {
                "id": 11,
                "url": "https://hooks.example.com/motive",
                "enabled": true,
                "actions": ["vehicle.updated", "fault_code.opened"]
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server);
    let webhook = client
        .webhooks()
        .create(&CreateWebhookRequest {
            url: "https://hooks.example.com/motive".into(),
            secret: Some(SECRET.into()),
            actions: vec![
                WebhookEvent::VehicleUpdated.to_string(),
                WebhookEvent::FaultCodeOpened.to_string(),
            ],
            enabled: true,
            format: None,
        })
        .await
        .unwrap();

    assert_eq!(webhook.id, 11);
    assert_eq!(webhook.actions.len(), 2);
}

#[test]
fn test_verify_inbound_delivery_with_configured_secret() {
    let client = MotiveClient::builder()
        .api_key(API_KEY)
        .webhook_secret(SECRET)
        .build()
        .unwrap();
    let verifier = client.webhook_verifier().unwrap();

    let body = br#"{"event":"hos_violation.created","timestamp":"2024-03-01T12:00:00Z","data":{"driver_id":5}}"#;
    let now = chrono::Utc::now().timestamp();
    let headers = signed_headers(body, Some(now));

    let payload = verifier.verify_and_parse(&headers, body).unwrap();
    assert_eq!(payload.event(), WebhookEvent::HosViolationCreated);
    assert_eq!(payload.get("driver_id"), Some(&json!(5)));
}

#[test]
fn test_verification_decision_table() {
    let verifier = integrations_motive::WebhookVerifier::new(SECRET);
    let body = br#"{"event":"vehicle.updated","timestamp":1709294400,"data":{}}"#;
    let now = chrono::Utc::now().timestamp();

    let missing = verifier.verify_request(&HeaderMap::new(), body).unwrap_err();
    assert_eq!(missing.kind(), MotiveErrorKind::MissingSignature);

    let stale = verifier
        .verify_request(&signed_headers(body, Some(now - 301)), body)
        .unwrap_err();
    assert_eq!(stale.kind(), MotiveErrorKind::ExpiredTimestamp);

    let other_body = br#"{"event":"vehicle.created","timestamp":1709294400,"data":{}}"#;
    let mismatched = verifier
        .verify_request(&signed_headers(other_body, Some(now)), body)
        .unwrap_err();
    assert_eq!(mismatched.kind(), MotiveErrorKind::InvalidSignature);

    assert!(verifier.verify_request(&signed_headers(body, None), body).is_ok());
    assert!(verifier.verify_request(&signed_headers(body, Some(now)), body).is_ok());
}

#[test]
fn test_verified_but_unknown_event() {
    let verifier = integrations_motive::WebhookVerifier::new(SECRET);
    let body = br#"{"event":"spaceship.launched","timestamp":1709294400}"#;

    let err = verifier
        .verify_and_parse(&signed_headers(body, None), body)
        .unwrap_err();
    assert_eq!(err.kind(), MotiveErrorKind::InvalidPayload);
}
