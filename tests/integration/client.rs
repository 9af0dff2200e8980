//! Integration tests for the request pipeline

use super::*;
use integrations_motive::{MotiveErrorKind, Vehicle};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_api_key_and_default_headers() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v1/vehicles/42"))
        .and(header("X-Api-Key", API_KEY))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "vehicle": {"id": 42, "number": "TRUCK-42", "fuel_type": "diesel"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server);
    let vehicle: Vehicle = client.vehicles().get(42).await.unwrap();

    assert_eq!(vehicle.id, 42);
    assert_eq!(vehicle.number.as_deref(), Some("TRUCK-42"));
    assert_eq!(vehicle.extra["fuel_type"], json!("diesel"));
}

#[tokio::test]
async fn test_query_values_are_flattened() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .and(query_param("role", "driver"))
        .and(query_param("ids", "1,2,3"))
        .and(query_param("active", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"users": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server);
    let response = client
        .get(
            "/v1/users",
            &json!({"role": "driver", "ids": [1, 2, 3], "active": true, "skip": null}),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let requests = mock_server.received_requests().await.unwrap();
    assert!(!requests[0].url.query().unwrap_or_default().contains("skip"));
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/v1/vehicles"))
        .and(body_json(json!({"number": "TRUCK-7", "vin": "1FUJGLDR"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "vehicle": {"id": 7, "number": "TRUCK-7", "vin": "1FUJGLDR"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server);
    let vehicle = client
        .vehicles()
        .create(&json!({"number": "TRUCK-7", "vin": "1FUJGLDR"}))
        .await
        .unwrap();

    assert_eq!(vehicle.vin.as_deref(), Some("1FUJGLDR"));
}

#[tokio::test]
async fn test_delete_sends_no_body() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("DELETE"))
        .and(path("/v2/company_webhooks/9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server);
    client.webhooks().delete(9).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests[0].body.is_empty());
}

#[test_case(400, MotiveErrorKind::Api; "bad request")]
#[test_case(401, MotiveErrorKind::Authentication; "unauthorized")]
#[test_case(403, MotiveErrorKind::Authorization; "forbidden")]
#[test_case(404, MotiveErrorKind::NotFound; "not found")]
#[test_case(418, MotiveErrorKind::Api; "other client error")]
#[test_case(422, MotiveErrorKind::Validation; "unprocessable")]
#[test_case(429, MotiveErrorKind::RateLimit; "rate limited")]
#[test_case(500, MotiveErrorKind::Server; "internal error")]
#[test_case(503, MotiveErrorKind::Server; "unavailable")]
#[tokio::test]
async fn test_status_mapping(status: u16, expected: MotiveErrorKind) {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v1/vehicles/1"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({"error": "Nope"})))
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server);
    let err = client.get("v1/vehicles/1", &()).await.unwrap_err();

    assert_eq!(err.kind(), expected);
    assert_eq!(err.status_code(), Some(status));
    assert_eq!(err.message(), "Nope");
    assert_eq!(err.response().map(|r| r.status()), Some(status));
}

#[tokio::test]
async fn test_validation_field_errors() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/v1/users"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Validation failed",
            "errors": {"email": ["is invalid", "is taken"], "first_name": "can't be blank"}
        })))
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server);
    let err = client
        .users()
        .create(&json!({"email": "nope"}))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), MotiveErrorKind::Validation);
    assert_eq!(err.message(), "Validation failed");
    assert_eq!(err.field_errors()["email"], vec!["is invalid", "is taken"]);
    assert_eq!(err.field_errors()["first_name"], vec!["can't be blank"]);
}

#[tokio::test]
async fn test_rate_limit_is_not_retried() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v1/vehicles"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "30")
                .set_body_json(json!({"error": "Too many requests"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server);
    let err = client.get("v1/vehicles", &()).await.unwrap_err();

    assert_eq!(err.kind(), MotiveErrorKind::RateLimit);
    assert_eq!(err.retry_after(), Some(30));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v1/vehicles/404"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server);
    let err = client.vehicles().get(404).await.unwrap_err();

    assert_eq!(err.kind(), MotiveErrorKind::NotFound);
    assert_eq!(err.message(), integrations_motive::errors::DEFAULT_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_server_errors_are_retried_until_success() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v1/vehicles/5"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/vehicles/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"vehicle": {"id": 5}})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server);
    let vehicle = client.vehicles().get(5).await.unwrap();

    assert_eq!(vehicle.id, 5);
}

#[tokio::test]
async fn test_retries_exhausted_returns_last_error() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v1/vehicles/5"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "Boom"})))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server);
    let err = client.vehicles().get(5).await.unwrap_err();

    assert_eq!(err.kind(), MotiveErrorKind::Server);
    assert_eq!(err.message(), "Boom");
}

#[tokio::test]
async fn test_connection_failure() {
    let client = MotiveClient::builder()
        .api_key(API_KEY)
        .base_url("http://127.0.0.1:1")
        .retry(2, Duration::from_millis(1))
        .build()
        .unwrap();

    let err = client.get("v1/vehicles", &()).await.unwrap_err();

    assert_eq!(err.kind(), MotiveErrorKind::Connection);
    assert!(err.status_code().is_none());
}

#[tokio::test]
async fn test_timeout() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v1/vehicles"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let client = MotiveClient::builder()
        .api_key(API_KEY)
        .base_url(mock_server.uri())
        .timeout(Duration::from_millis(50))
        .no_retry()
        .build()
        .unwrap();

    let err = client.get("v1/vehicles", &()).await.unwrap_err();

    assert_eq!(err.kind(), MotiveErrorKind::Timeout);
}

#[tokio::test]
async fn test_non_object_body_is_rejected() {
    let mock_server = setup_mock_server().await;
    let client = api_key_client(&mock_server);

    let err = client.post("v1/vehicles", &json!([1, 2])).await.unwrap_err();

    assert_eq!(err.kind(), MotiveErrorKind::InvalidRequest);
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}
