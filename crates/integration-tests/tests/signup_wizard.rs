//! Integration tests for the session-scoped signup wizard.
//!
//! None of these reach the database: the wizard and its draft live in the
//! session, and registration is only attempted by the live tests.

use axum::http::StatusCode;
use serde_json::{Value, json};
use ticketwave_integration_tests::TestClient;

fn user_info(email: &str) -> Value {
    json!({
        "name": "Dana Rivers",
        "email": email,
        "password": "hunter2hunter2",
        "confirmPassword": "hunter2hunter2",
        "address": "12 Harbor Way",
        "city": "Newark",
        "state": "NJ",
        "zipCode": "07102",
    })
}

fn valid_card() -> Value {
    json!({
        "cardNumber": "4242 4242 4242 4242",
        "cardExpiry": "12/29",
        "cardCvc": "123",
    })
}

/// Walk a fresh session through steps 1-3 so it lands on payment.
async fn reach_payment(client: &mut TestClient, email: &str) {
    let mount = client.get("/api/signup").await;
    assert_eq!(mount.status, StatusCode::OK);

    client.patch("/api/signup/form", json!({"paymentOption": "oneTime"})).await;
    assert_eq!(client.post("/api/signup/advance", None).await.status, StatusCode::OK);

    client
        .patch(
            "/api/signup/form",
            json!({"merchandise": ["tshirt", "poster"], "termsAccepted": true}),
        )
        .await;
    assert_eq!(client.post("/api/signup/advance", None).await.status, StatusCode::OK);

    client.patch("/api/signup/form", user_info(email)).await;
    let resp = client.post("/api/signup/advance", None).await;
    assert_eq!(resp.status, StatusCode::OK, "{:?}", resp.body);
    assert_eq!(resp.body["currentStep"], 4);
}

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test]
async fn test_mount_starts_on_ticket_options() {
    let mut client = TestClient::new();

    let resp = client.get("/api/signup").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["currentStep"], 1);
    assert_eq!(resp.body["stepName"], "ticket_options");
    assert_eq!(resp.body["totalSteps"], 5);
    assert!(resp.body["resumeOffer"].is_null());
    assert_eq!(resp.body["canAdvance"], true);
}

#[tokio::test]
async fn test_advance_requires_payment_option() {
    let mut client = TestClient::new();
    client.get("/api/signup").await;

    let resp = client.post("/api/signup/advance", None).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.body["errors"]["paymentOption"].is_string());
}

#[tokio::test]
async fn test_merchandise_must_be_two_items() {
    let mut client = TestClient::new();
    client.get("/api/signup").await;
    client.patch("/api/signup/form", json!({"paymentOption": "installment"})).await;
    client.post("/api/signup/advance", None).await;

    client
        .patch(
            "/api/signup/form",
            json!({"merchandise": ["tshirt"], "termsAccepted": true}),
        )
        .await;
    let resp = client.post("/api/signup/advance", None).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.body["errors"]["merchandise"].is_string());
    assert!(resp.body["errors"]["termsAccepted"].is_null());
}

#[tokio::test]
async fn test_full_walk_to_payment_and_back() {
    let mut client = TestClient::new();
    reach_payment(&mut client, "dana@example.com").await;

    let resp = client.post("/api/signup/retreat", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["currentStep"], 3);
    assert_eq!(resp.body["formData"]["email"], "dana@example.com");
}

#[tokio::test]
async fn test_retreat_saturates_at_first_step() {
    let mut client = TestClient::new();
    client.get("/api/signup").await;

    let resp = client.post("/api/signup/retreat", None).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["currentStep"], 1);
    assert_eq!(resp.body["canRetreat"], false);
}

// ============================================================================
// Form data
// ============================================================================

#[tokio::test]
async fn test_view_never_echoes_passwords() {
    let mut client = TestClient::new();
    reach_payment(&mut client, "dana@example.com").await;

    let resp = client.post("/api/signup/retreat", None).await;
    let form = &resp.body["formData"];

    assert_eq!(form["name"], "Dana Rivers");
    assert!(form.get("password").is_none());
    assert!(form.get("confirmPassword").is_none());
}

#[tokio::test]
async fn test_card_fields_are_not_kept_in_form() {
    let mut client = TestClient::new();
    client.get("/api/signup").await;

    let resp = client
        .patch(
            "/api/signup/form",
            json!({"paymentOption": "oneTime", "cardNumber": "4242424242424242", "cardCvc": "123"}),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["formData"]["paymentOption"], "oneTime");
    assert!(resp.body["formData"].get("cardNumber").is_none());
    assert!(resp.body["formData"].get("cardCvc").is_none());
}

// ============================================================================
// Drafts and resume
// ============================================================================

#[tokio::test]
async fn test_no_draft_before_email_is_known() {
    let mut client = TestClient::new();
    client.get("/api/signup").await;
    client.patch("/api/signup/form", json!({"paymentOption": "oneTime"})).await;
    client.post("/api/signup/advance", None).await;

    let resp = client.get("/api/signup/draft").await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reload_offers_resume() {
    let mut client = TestClient::new();
    reach_payment(&mut client, "dana@example.com").await;

    let draft = client.get("/api/signup/draft").await;
    assert_eq!(draft.status, StatusCode::OK);
    assert_eq!(draft.body["email"], "dana@example.com");
    assert_eq!(draft.body["step"], 4);
    assert!(draft.body["lastUpdated"].is_string());

    let reload = client.get("/api/signup").await;
    assert_eq!(reload.body["currentStep"], 1);
    assert_eq!(reload.body["resumeOffer"]["step"], 4);
    assert_eq!(reload.body["canAdvance"], false);

    let blocked = client.post("/api/signup/advance", None).await;
    assert_eq!(blocked.status, StatusCode::CONFLICT);

    let resumed = client.post("/api/signup/resume", None).await;
    assert_eq!(resumed.status, StatusCode::OK);
    assert_eq!(resumed.body["currentStep"], 4);
    assert_eq!(resumed.body["formData"]["email"], "dana@example.com");
    assert!(resumed.body["resumeOffer"].is_null());
}

#[tokio::test]
async fn test_start_fresh_discards_draft() {
    let mut client = TestClient::new();
    reach_payment(&mut client, "dana@example.com").await;
    client.get("/api/signup").await;

    let resp = client.post("/api/signup/start-fresh", None).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["currentStep"], 1);
    assert!(resp.body["resumeOffer"].is_null());
    assert_eq!(resp.body["formData"], json!({}));
    assert_eq!(
        client.get("/api/signup/draft").await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_form_is_locked_while_resume_is_offered() {
    let mut client = TestClient::new();
    reach_payment(&mut client, "dana@example.com").await;
    client.get("/api/signup").await;

    let blocked = client
        .patch("/api/signup/form", json!({"paymentOption": "installment"}))
        .await;
    assert_eq!(blocked.status, StatusCode::CONFLICT);

    let resumed = client.post("/api/signup/resume", None).await;
    assert_eq!(resumed.status, StatusCode::OK);
    assert_eq!(resumed.body["formData"]["paymentOption"], "oneTime");
}

#[tokio::test]
async fn test_resume_without_offer_conflicts() {
    let mut client = TestClient::new();
    client.get("/api/signup").await;

    let resp = client.post("/api/signup/resume", None).await;

    assert_eq!(resp.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_drafts_are_per_session() {
    let mut client = TestClient::new();
    reach_payment(&mut client, "dana@example.com").await;

    client.clear_cookies();

    let resp = client.get("/api/signup").await;
    assert!(resp.body["resumeOffer"].is_null());
    assert_eq!(
        client.get("/api/signup/draft").await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_flush_saves_with_warning() {
    let mut client = TestClient::new();
    reach_payment(&mut client, "dana@example.com").await;

    let resp = client.post("/api/signup/flush", None).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["saved"], true);
    assert!(resp.body["warning"].is_string());
}

#[tokio::test]
async fn test_flush_without_email_is_silent() {
    let mut client = TestClient::new();
    client.get("/api/signup").await;

    let resp = client.post("/api/signup/flush", None).await;

    assert_eq!(resp.body["saved"], false);
    assert!(resp.body["warning"].is_null());
}

// ============================================================================
// Submission guards (no database needed)
// ============================================================================

#[tokio::test]
async fn test_submit_before_payment_conflicts() {
    let mut client = TestClient::new();
    client.get("/api/signup").await;

    let resp = client.post("/api/signup/submit", Some(valid_card())).await;

    assert_eq!(resp.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_submit_rejects_bad_card_and_stays_on_payment() {
    let mut client = TestClient::new();
    reach_payment(&mut client, "dana@example.com").await;

    let resp = client
        .post(
            "/api/signup/submit",
            Some(json!({"cardNumber": "4242", "cardExpiry": "13/29", "cardCvc": "1"})),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.body["errors"]["cardNumber"].is_string());
    assert!(resp.body["errors"]["cardExpiry"].is_string());
    assert!(resp.body["errors"]["cardCvc"].is_string());

    let back = client.post("/api/signup/retreat", None).await;
    assert_eq!(back.body["currentStep"], 3);
}
