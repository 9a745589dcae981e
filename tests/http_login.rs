mod common;

use common::*;
use concierge::api;
use concierge::application_port::AuthService;
use concierge::domain_model::*;
use serde_json::{Value, json};
use std::sync::Arc;
use warp::Filter;
use warp::http::StatusCode;

fn filter(
    h: Harness,
) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone {
    let service: Arc<dyn AuthService> = Arc::new(h.service);
    api::routes(service).recover(api::recover_error)
}

async fn post_login(h: Harness, body: Value) -> (StatusCode, Value) {
    let response = warp::test::request()
        .method("POST")
        .path("/auth/login")
        .json(&body)
        .reply(&filter(h))
        .await;
    let json: Value = serde_json::from_slice(response.body()).unwrap();
    (response.status(), json)
}

#[tokio::test]
async fn should_return_tokens_and_role_keyed_profile() {
    let h = Harness::new();
    h.in_sync_account("ops@harbour.test", LoginRole::Merchant);

    let (status, body) = post_login(
        h,
        json!({ "email": "ops@harbour.test", "password": PASSWORD, "userType": "merchant" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "ops@harbour.test");
    assert_eq!(body["user"]["role"], "merchant");
    assert_eq!(body["merchant"]["display_name"], "Harbour Light Tours");
    assert!(body.get("collaborator").is_none());
    assert!(body["merchant"].get("password_hash").is_none());
    assert!(!body["access_token"].as_str().unwrap().is_empty());
    assert!(!body["refresh_token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn should_detect_role_when_user_type_is_omitted() {
    let h = Harness::new();
    h.in_sync_account("guide@harbour.test", LoginRole::Collaborator);

    let (status, body) =
        post_login(h, json!({ "email": "guide@harbour.test", "password": PASSWORD })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "collaborator");
    assert!(body.get("collaborator").is_some());
}

#[tokio::test]
async fn should_answer_401_with_generic_message_for_wrong_password() {
    let h = Harness::new();
    h.in_sync_account("ops@harbour.test", LoginRole::Merchant);

    let (status, body) = post_login(
        h,
        json!({ "email": "ops@harbour.test", "password": "nope", "userType": "merchant" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "InvalidCredentials");
    assert_eq!(body["error"]["message"], "Invalid email or password");
}

#[tokio::test]
async fn should_answer_401_with_same_message_for_unknown_email() {
    let h = Harness::new();

    let (status, body) =
        post_login(h, json!({ "email": "nobody@harbour.test", "password": "nope" })).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Invalid email or password");
}

#[tokio::test]
async fn should_tell_pending_accounts_to_wait_for_approval() {
    let h = Harness::new();
    h.store.insert_account(
        "pending@harbour.test",
        LoginRole::Merchant,
        "Pending",
        Some(hash(PASSWORD)),
        false,
        None,
    );

    let (status, body) = post_login(
        h,
        json!({ "email": "pending@harbour.test", "password": PASSWORD, "userType": "merchant" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "NotVerified");
    assert_eq!(body["error"]["message"], "Account is pending admin approval");
}

#[tokio::test]
async fn should_hide_provider_error_text_when_repair_fails() {
    let h = Harness::new();
    let external_id = h.provider.register("ops@harbour.test", "placeholder");
    h.store.insert_account(
        "ops@harbour.test",
        LoginRole::Merchant,
        "Harbour",
        Some(hash(PASSWORD)),
        true,
        Some(external_id),
    );
    h.provider.set_admin_outage(true);

    let response = warp::test::request()
        .method("POST")
        .path("/auth/login")
        .json(&json!({ "email": "ops@harbour.test", "password": PASSWORD }))
        .reply(&filter(h))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let raw = String::from_utf8_lossy(response.body());
    assert!(raw.contains("Login failed, please contact support"));
    assert!(!raw.contains("upstream"));
    assert!(!raw.contains("503"));
}

#[tokio::test]
async fn should_reject_empty_credentials_as_bad_request() {
    let (status, body) = post_login(Harness::new(), json!({ "email": " ", "password": "" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BadRequest");
}

#[tokio::test]
async fn should_reject_unknown_user_type_as_bad_request() {
    let (status, _) = post_login(
        Harness::new(),
        json!({ "email": "a@x.com", "password": "pw", "userType": "admin" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_answer_method_not_allowed_for_get_login() {
    let response = warp::test::request()
        .method("GET")
        .path("/auth/login")
        .reply(&filter(Harness::new()))
        .await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn should_answer_not_found_for_unknown_path() {
    let response = warp::test::request()
        .method("GET")
        .path("/auth/nowhere")
        .reply(&filter(Harness::new()))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_report_health() {
    let response = warp::test::request()
        .method("GET")
        .path("/health")
        .reply(&filter(Harness::new()))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["data"]["status"], "ok");
}
