//! Integration tests for pagination

use super::*;
use futures::{StreamExt, TryStreamExt};
use integrations_motive::{MotiveErrorKind, User, Vehicle};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn vehicle_page(ids: std::ops::RangeInclusive<u64>, total: u64, per_page: u32, page: u32) -> Value {
    let vehicles: Vec<Value> = ids
        .map(|id| json!({"vehicle": {"id": id, "number": format!("TRUCK-{}", id)}}))
        .collect();
    json!({
        "vehicles": vehicles,
        "pagination": {"total": total, "per_page": per_page, "current_page": page}
    })
}

async fn mount_page(server: &wiremock::MockServer, page: &str, body: Value, times: u64) {
    Mock::given(method("GET"))
        .and(path("/v1/vehicles"))
        .and(query_param("page_no", page))
        .and(query_param("per_page", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_cursor_walks_all_pages() {
    let mock_server = setup_mock_server().await;
    mount_page(&mock_server, "1", vehicle_page(1..=25, 47, 25, 1), 1).await;
    mount_page(&mock_server, "2", vehicle_page(26..=47, 47, 25, 2), 1).await;

    let client = api_key_client(&mock_server);
    let vehicles: Vec<Vehicle> = client.vehicles().list().cursor().try_collect().await.unwrap();

    assert_eq!(vehicles.len(), 47);
    let ids: Vec<u64> = vehicles.iter().map(|v| v.id).collect();
    assert_eq!(ids, (1..=47).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_cursor_tolerates_string_pagination_fields() {
    let mock_server = setup_mock_server().await;
    for (page, ids) in [("1", 1..=25), ("2", 26..=47)] {
        let mut body = vehicle_page(ids, 47, 25, 0);
        body["pagination"]["current_page"] = json!(page);
        mount_page(&mock_server, page, body, 1).await;
    }

    let client = api_key_client(&mock_server);
    let vehicles: Vec<Vehicle> = client.vehicles().list().cursor().try_collect().await.unwrap();

    assert_eq!(vehicles.len(), 47);
    assert_eq!(vehicles.last().map(|v| v.id), Some(47));
}

#[tokio::test]
async fn test_empty_page_stops_iteration() {
    let mock_server = setup_mock_server().await;
    mount_page(
        &mock_server,
        "1",
        json!({"vehicles": [], "pagination": {"total": 100, "per_page": 25, "current_page": 1}}),
        1,
    )
    .await;

    let client = api_key_client(&mock_server);
    let vehicles: Vec<Vehicle> = client.vehicles().list().cursor().try_collect().await.unwrap();

    assert!(vehicles.is_empty());
}

#[tokio::test]
async fn test_missing_resource_key_yields_nothing() {
    let mock_server = setup_mock_server().await;
    mount_page(&mock_server, "1", json!({"unexpected": true}), 1).await;

    let client = api_key_client(&mock_server);
    let vehicles: Vec<Vehicle> = client.vehicles().list().cursor().try_collect().await.unwrap();

    assert!(vehicles.is_empty());
}

#[tokio::test]
async fn test_cursor_restarts_from_first_page() {
    let mock_server = setup_mock_server().await;
    mount_page(&mock_server, "1", vehicle_page(1..=3, 3, 25, 1), 2).await;

    let client = api_key_client(&mock_server);
    let paginator = client.vehicles().list();

    let first: Vec<Vehicle> = paginator.cursor().try_collect().await.unwrap();
    let second: Vec<Vehicle> = paginator.cursor().try_collect().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[tokio::test]
async fn test_cursor_is_lazy() {
    let mock_server = setup_mock_server().await;
    mount_page(&mock_server, "1", vehicle_page(1..=25, 47, 25, 1), 1).await;
    mount_page(&mock_server, "2", vehicle_page(26..=47, 47, 25, 2), 0).await;

    let client = api_key_client(&mock_server);
    let first_five: Vec<Vehicle> = client
        .vehicles()
        .list()
        .cursor()
        .take(5)
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(first_five.len(), 5);
}

#[tokio::test]
async fn test_error_mid_stream() {
    let mock_server = setup_mock_server().await;
    mount_page(&mock_server, "1", vehicle_page(1..=25, 47, 25, 1), 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/vehicles"))
        .and(query_param("page_no", "2"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "Forbidden"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server);
    let results: Vec<_> = client.vehicles().list().cursor().collect().await;

    assert_eq!(results.len(), 26);
    assert!(results[..25].iter().all(|r| r.is_ok()));
    let err = results[25].as_ref().unwrap_err();
    assert_eq!(err.kind(), MotiveErrorKind::Authorization);
}

#[tokio::test]
async fn test_paginate_single_page() {
    let mock_server = setup_mock_server().await;
    mount_page(&mock_server, "2", vehicle_page(26..=47, 47, 25, 2), 1).await;

    let client = api_key_client(&mock_server);
    let page = client.vehicles().paginate(2, 25).await.unwrap();

    assert_eq!(page.len(), 22);
    assert_eq!(page.total, 47);
    assert_eq!(page.current_page, 2);
    assert_eq!(page.last_page(), 2);
    assert!(!page.has_more_pages());
}

#[tokio::test]
async fn test_paginate_defaults_without_metadata() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .and(query_param("page_no", "1"))
        .and(query_param("per_page", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{"user": {"id": 1}}, {"user": {"id": 2}}, {"user": {"id": 3}}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server);
    let page = client.users().paginate(1, 10).await.unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(page.per_page, 10);
    assert_eq!(page.current_page, 1);
    assert!(!page.has_more_pages());
}

#[tokio::test]
async fn test_filters_are_sent_with_every_page() {
    let mock_server = setup_mock_server().await;

    for page in ["1", "2"] {
        let ids = if page == "1" { 1..=2 } else { 3..=3 };
        let users: Vec<Value> = ids
            .map(|id| json!({"user": {"id": id, "role": "driver"}}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/v1/users"))
            .and(query_param("role", "driver"))
            .and(query_param("page_no", page))
            .and(query_param("per_page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": users,
                "pagination": {"total": 3, "per_page": 2, "current_page": page.parse::<u32>().unwrap()}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let client = api_key_client(&mock_server);
    let drivers: Vec<User> = client
        .users()
        .drivers()
        .per_page(2)
        .cursor()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(drivers.len(), 3);
    assert!(drivers.iter().all(User::is_driver));
}
