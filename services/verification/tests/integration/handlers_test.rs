use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::Duration;
use serde_json::{Value, json};
use uuid::Uuid;

use welfare_testing::clock::ManualClock;
use welfare_verification::config::VerificationConfig;
use welfare_verification::infra::account::HttpAccountRepository;
use welfare_verification::router::build_router;
use welfare_verification::state::AppState;

use crate::helpers::TTL_MINUTES;

// Nothing listens here; these tests never reach the sweep side effect.
const UNREACHABLE_USERS: &str = "http://127.0.0.1:9";

fn server(clock: &ManualClock) -> TestServer {
    let config = VerificationConfig {
        verification_port: 0,
        verification_code_expires_in: TTL_MINUTES,
        step_up_expires_in: TTL_MINUTES,
        accounts_base_url: UNREACHABLE_USERS.to_owned(),
    };
    let accounts = HttpAccountRepository::new(&config.accounts_base_url).unwrap();
    let state = AppState::new(&config, Arc::new(clock.clone()), accounts);
    TestServer::new(build_router(state)).unwrap()
}

async fn issue(server: &TestServer, body: Value) -> String {
    let resp = server.post("/internal/codes").json(&body).await;
    resp.assert_status(StatusCode::CREATED);
    resp.json::<Value>()["code"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn should_issue_and_verify_activation_code_once() {
    let clock = ManualClock::default();
    let server = server(&clock);
    let user_id = Uuid::new_v4();

    let resp = server
        .post("/internal/codes")
        .json(&json!({ "mode": 1, "email": "a@example.com", "user_id": user_id }))
        .await;
    resp.assert_status(StatusCode::CREATED);
    let body = resp.json::<Value>();
    let code = body["code"].as_str().unwrap();
    assert_eq!(code.len(), 6);
    assert_eq!(body["expires_at"], "2026-01-01T00:05:00.000Z");

    let verify = json!({ "mode": 1, "code": code, "email": "a@example.com" });
    let resp = server.post("/internal/codes/verify").json(&verify).await;
    resp.assert_status_ok();
    let body = resp.json::<Value>();
    assert_eq!(body["mode"], 1);
    assert_eq!(body["user_id"], user_id.to_string());
    assert!(body.get("family_id").is_none());

    let resp = server.post("/internal/codes/verify").json(&verify).await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json::<Value>()["kind"], "INVALID_CODE");
}

#[tokio::test]
async fn should_verify_family_invite_code() {
    let clock = ManualClock::default();
    let server = server(&clock);
    let family_id = Uuid::new_v4();

    let code = issue(
        &server,
        json!({ "mode": 2, "email": "a@example.com", "family_id": family_id }),
    )
    .await;

    let resp = server
        .post("/internal/codes/verify")
        .json(&json!({ "mode": 2, "code": code, "email": "a@example.com" }))
        .await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<Value>()["family_id"], family_id.to_string());
}

#[tokio::test]
async fn should_reject_code_missing_its_payload() {
    let clock = ManualClock::default();
    let server = server(&clock);

    let resp = server
        .post("/internal/codes")
        .json(&json!({ "mode": 2, "email": "a@example.com", "user_id": Uuid::new_v4() }))
        .await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>()["kind"], "INVALID_PAYLOAD");
}

#[tokio::test]
async fn should_reject_unknown_mode() {
    let clock = ManualClock::default();
    let server = server(&clock);

    let resp = server
        .post("/internal/codes")
        .json(&json!({ "mode": 9, "email": "a@example.com" }))
        .await;

    assert!(resp.status_code().is_client_error());
}

#[tokio::test]
async fn should_reject_expired_code() {
    let clock = ManualClock::default();
    let server = server(&clock);

    let code = issue(
        &server,
        json!({ "mode": 1, "email": "a@example.com", "user_id": Uuid::new_v4() }),
    )
    .await;
    clock.advance(Duration::minutes(TTL_MINUTES) + Duration::seconds(1));

    let resp = server
        .post("/internal/codes/verify")
        .json(&json!({ "mode": 1, "code": code, "email": "a@example.com" }))
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_gate_action_behind_step_up_code() {
    let clock = ManualClock::default();
    let server = server(&clock);
    let user_id = Uuid::new_v4();
    let consume = format!("/internal/step-up/{user_id}/consume");

    let resp = server.post(&consume).await;
    resp.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(resp.json::<Value>()["kind"], "STEP_UP_REQUIRED");

    let code = issue(
        &server,
        json!({ "mode": 3, "email": "a@example.com", "user_id": user_id }),
    )
    .await;
    let resp = server
        .post("/internal/step-up/confirm")
        .json(&json!({ "code": code, "email": "a@example.com" }))
        .await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<Value>()["user_id"], user_id.to_string());

    server
        .post(&consume)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .post(&consume)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn should_set_and_consume_step_up_flag_directly() {
    let clock = ManualClock::default();
    let server = server(&clock);
    let user_id = Uuid::new_v4();

    server
        .put(&format!("/internal/step-up/{user_id}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .post(&format!("/internal/step-up/{user_id}/consume"))
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn should_evaluate_eligibility() {
    let clock = ManualClock::default();
    let server = server(&clock);

    let resp = server
        .post("/internal/eligibility")
        .json(&json!({ "person_tags": [2, 5], "required_tags": [1, 2, 5] }))
        .await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<Value>()["eligibility"], "eligible");

    let resp = server
        .post("/internal/eligibility")
        .json(&json!({ "person_tags": [2], "required_tags": [2, 5] }))
        .await;
    assert_eq!(resp.json::<Value>()["eligibility"], "not_eligible");

    let resp = server
        .post("/internal/eligibility")
        .json(&json!({ "person_tags": [], "required_tags": [5] }))
        .await;
    assert_eq!(resp.json::<Value>()["eligibility"], "unknown");
}

#[tokio::test]
async fn should_explain_failed_requirements() {
    let clock = ManualClock::default();
    let server = server(&clock);

    let resp = server
        .post("/internal/eligibility")
        .json(&json!({ "person_tags": [2, 4], "required_tags": [1, 8] }))
        .await;
    resp.assert_status_ok();
    assert_eq!(
        resp.json::<Value>(),
        json!({
            "eligibility": "not_eligible",
            "mismatches": [
                { "kind": "age_bracket", "required": [1] },
                { "kind": "missing", "tag": 8 },
            ],
        })
    );
}

#[tokio::test]
async fn should_ignore_out_of_range_tags() {
    let clock = ManualClock::default();
    let server = server(&clock);

    let resp = server
        .post("/internal/eligibility")
        .json(&json!({ "person_tags": [4, 300], "required_tags": [4, 70000] }))
        .await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<Value>()["eligibility"], "eligible");
}

#[tokio::test]
async fn should_derive_age_bracket_from_birthday() {
    let clock = ManualClock::default();
    let server = server(&clock);

    // 70 years old on the test clock's 2026-01-01.
    let resp = server
        .post("/internal/eligibility")
        .json(&json!({ "person_tags": [], "required_tags": [3], "birthday": "1955-06-15" }))
        .await;
    assert_eq!(resp.json::<Value>()["eligibility"], "eligible");
}

#[tokio::test]
async fn should_report_health_and_readiness() {
    let clock = ManualClock::default();
    let server = server(&clock);

    server.get("/healthz").await.assert_status_ok();
    server.get("/readyz").await.assert_status_ok();
}

#[tokio::test]
async fn should_echo_request_id() {
    let clock = ManualClock::default();
    let server = server(&clock);

    let resp = server.get("/healthz").await;
    assert!(resp.headers().contains_key("x-request-id"));
}
