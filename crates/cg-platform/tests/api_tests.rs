//! Account API Integration Tests
//!
//! Drives the router end to end with tower's oneshot: auth middleware,
//! provisioning handlers, and error mapping.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use tower::util::ServiceExt;

use cg_platform::api::{account_router, AccountApiState, AppState, AuthLayer};
use cg_platform::{
    IdentityClaims, JwtIdentityVerifier, MemoryAccountStore, MemoryCreditLedger,
    ProvisioningService, VerifierConfig, DEFAULT_API_KEY_BYTES,
};

const TEST_SECRET: &str = "api-test-secret";

struct TestApp {
    app: Router,
    accounts: Arc<MemoryAccountStore>,
    ledger: Arc<MemoryCreditLedger>,
}

fn test_app() -> TestApp {
    let accounts = Arc::new(MemoryAccountStore::new());
    let ledger = Arc::new(MemoryCreditLedger::new());
    let provisioning = Arc::new(ProvisioningService::new(accounts.clone(), ledger.clone()));

    let verifier = Arc::new(JwtIdentityVerifier::new(VerifierConfig {
        secret: TEST_SECRET.to_string(),
        ..VerifierConfig::default()
    }));

    let app = Router::new()
        .nest("/api/account", account_router(AccountApiState { provisioning }))
        .layer(AuthLayer::new(AppState { verifier }));

    TestApp { app, accounts, ledger }
}

fn token_for(subject: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = IdentityClaims {
        sub: subject.to_string(),
        iss: "creditgate".to_string(),
        aud: "creditgate".to_string(),
        exp: now + 3600,
        iat: now,
        email: Some(format!("{}@example.com", subject)),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

fn get_account_request(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri("/api/account");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_get_account_provisions_on_first_access() {
    let t = test_app();
    let token = token_for("user-1");

    let response = t.app.oneshot(get_account_request(Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let api_key = body["apiKey"].as_str().unwrap();
    assert_eq!(api_key.len(), DEFAULT_API_KEY_BYTES * 2);
    assert_eq!(body["balance"], 1000);

    assert_eq!(t.accounts.len(), 1);
    assert_eq!(t.ledger.len(), 1);
}

#[tokio::test]
async fn test_get_account_is_stable_across_requests() {
    let t = test_app();
    let token = token_for("user-1");

    let first = t.app.clone().oneshot(get_account_request(Some(&token))).await.unwrap();
    let second = t.app.oneshot(get_account_request(Some(&token))).await.unwrap();

    let first = body_json(first).await;
    let second = body_json(second).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_missing_token_is_rejected_without_writes() {
    let t = test_app();

    let response = t.app.oneshot(get_account_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["error"], "UNAUTHORIZED");

    // Rejection happens before the provisioning path; nothing was written
    assert!(t.accounts.is_empty());
    assert!(t.ledger.is_empty());
}

#[tokio::test]
async fn test_forged_token_is_rejected_without_writes() {
    let t = test_app();

    let now = chrono::Utc::now().timestamp();
    let claims = IdentityClaims {
        sub: "intruder".to_string(),
        iss: "creditgate".to_string(),
        aud: "creditgate".to_string(),
        exp: now + 3600,
        iat: now,
        email: None,
    };
    let forged = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"wrong-secret"),
    )
    .unwrap();

    let response = t.app.oneshot(get_account_request(Some(&forged))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(t.accounts.is_empty());
    assert!(t.ledger.is_empty());
}

#[tokio::test]
async fn test_rotate_credential_endpoint() {
    let t = test_app();
    let token = token_for("user-1");

    let before = body_json(
        t.app.clone().oneshot(get_account_request(Some(&token))).await.unwrap(),
    )
    .await;

    let rotate = Request::builder()
        .method("POST")
        .uri("/api/account/credential")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(rotate).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let rotated = body_json(response).await;
    let rotated_key = rotated["apiKey"].as_str().unwrap();
    assert_ne!(rotated_key, before["apiKey"].as_str().unwrap());

    // The rotated credential is the one a later read observes
    let after = body_json(
        t.app.oneshot(get_account_request(Some(&token))).await.unwrap(),
    )
    .await;
    assert_eq!(after["apiKey"].as_str().unwrap(), rotated_key);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let t = test_app();
    let token = token_for("user-1");

    let request = Request::builder()
        .method("GET")
        .uri("/api/unknown")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = t.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unsupported_method_is_rejected() {
    let t = test_app();
    let token = token_for("user-1");

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/account")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = t.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
