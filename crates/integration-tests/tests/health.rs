//! Integration tests for health endpoints and request plumbing.

use axum::http::StatusCode;
use ticketwave_integration_tests::TestClient;

#[tokio::test]
async fn test_liveness() {
    let mut client = TestClient::new();

    let resp = client.get("/health").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, "ok");
}

#[tokio::test]
async fn test_api_health() {
    let mut client = TestClient::new();

    let resp = client.get("/api/health").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"], "OK");
    assert_eq!(resp.body["message"], "TicketWave API is running");
}

#[tokio::test]
async fn test_readiness_without_database() {
    let mut client = TestClient::new();

    let resp = client.get("/health/ready").await;

    assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_route() {
    let mut client = TestClient::new();

    let resp = client.get("/api/nope").await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}
