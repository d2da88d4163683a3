//! API Integration Tests
//!
//! Router-level behaviour that is settled before any database access:
//! authentication, body and path validation, rate limiting and the
//! correlation id echo. The pool behind these routers never connects.

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

mod common;

const RELAXED_LIMIT: i64 = 1_000;

async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

fn post_json(uri: &str, auth: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body)).unwrap()
}

fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

fn purchase_body(customer_id: Uuid) -> Value {
    json!({
        "customer_id": customer_id,
        "contract_number": "CTR-API-001",
        "tenor_months": 3,
        "otr_amount": "4000000",
        "admin_fee": "100000",
        "installment_amount": "1500000",
        "interest_amount": "100000",
        "asset_name": "Motorcycle"
    })
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = common::lazy_app(RELAXED_LIMIT);

    let response = app.oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let (app, _) = common::lazy_app(RELAXED_LIMIT);

    let response = app
        .oneshot(get("/api/v1/customers/me", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "missing_token");
}

#[tokio::test]
async fn test_malformed_authorization_header() {
    let (app, _) = common::lazy_app(RELAXED_LIMIT);

    for value in ["Token abc", "Bearer", "Bearer   "] {
        let response = app
            .clone()
            .oneshot(get("/api/v1/customers/me", Some(value)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "header {:?}", value);
    }
}

#[tokio::test]
async fn test_refresh_token_is_not_a_bearer_token() {
    let (app, state) = common::lazy_app(RELAXED_LIMIT);
    let pair = state
        .tokens
        .issue(Uuid::new_v4(), "3201010101900001")
        .unwrap();

    let auth = format!("Bearer {}", pair.refresh_token);
    let response = app
        .oneshot(get("/api/v1/customers/me", Some(&auth)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "invalid_token");
}

#[tokio::test]
async fn test_unknown_route_is_not_found_not_unauthorized() {
    let (app, _) = common::lazy_app(RELAXED_LIMIT);

    let response = app.oneshot(get("/api/v1/nowhere", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_transaction_rejects_malformed_json() {
    let (app, state) = common::lazy_app(RELAXED_LIMIT);
    let auth = common::bearer(&state, Uuid::new_v4());

    let response = app
        .oneshot(post_json(
            "/api/v1/transactions",
            Some(&auth),
            "{\"customer_id\": ".to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "invalid_request");
}

#[tokio::test]
async fn test_create_transaction_validation_errors() {
    let (app, state) = common::lazy_app(RELAXED_LIMIT);
    let customer_id = Uuid::new_v4();
    let auth = common::bearer(&state, customer_id);

    let cases = [
        ("tenor_months", json!(4)),
        ("otr_amount", json!("0")),
        ("admin_fee", json!("-1")),
        ("installment_amount", json!("0")),
        ("contract_number", json!("   ")),
        ("asset_name", json!("")),
    ];

    for (field, value) in cases {
        let mut body = purchase_body(customer_id);
        body[field] = value;

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/transactions", Some(&auth), body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "field {}", field);
        let body = body_json(response).await;
        assert_eq!(body["error_code"], "invalid_input", "field {}", field);
    }
}

#[tokio::test]
async fn test_set_credit_limit_rejects_bad_tenor() {
    let (app, state) = common::lazy_app(RELAXED_LIMIT);
    let auth = common::bearer(&state, Uuid::new_v4());

    let body = json!({
        "customer_id": Uuid::new_v4(),
        "tenor_months": 12,
        "limit_amount": "1000000"
    });
    let response = app
        .oneshot(post_json("/api/v1/credit-limits", Some(&auth), body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_credit_limit_path_tenor_validation() {
    let (app, state) = common::lazy_app(RELAXED_LIMIT);
    let auth = common::bearer(&state, Uuid::new_v4());
    let customer_id = Uuid::new_v4();

    for tenor in ["three", "4", "-1"] {
        let uri = format!("/api/v1/customers/{}/credit-limits/{}", customer_id, tenor);
        let response = app
            .clone()
            .oneshot(get(&uri, Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "tenor {}", tenor);
    }
}

#[tokio::test]
async fn test_bad_customer_id_in_path() {
    let (app, state) = common::lazy_app(RELAXED_LIMIT);
    let auth = common::bearer(&state, Uuid::new_v4());

    let response = app
        .oneshot(get("/api/v1/customers/not-a-uuid/transactions", Some(&auth)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "invalid_request");
}

#[tokio::test]
async fn test_lookup_by_malformed_nik() {
    let (app, state) = common::lazy_app(RELAXED_LIMIT);
    let auth = common::bearer(&state, Uuid::new_v4());

    let response = app
        .oneshot(get("/api/v1/customers/nik/12345", Some(&auth)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_validation_is_public_and_checked() {
    let (app, _) = common::lazy_app(RELAXED_LIMIT);

    let body = json!({
        "nik": "3201010101900001",
        "full_name": "Budi Santoso",
        "legal_name": "Budi Santoso",
        "birth_place": "Bandung",
        "birth_date": "1990-01-01",
        "salary": "0",
        "password": "s3cret-pass"
    });
    let response = app
        .oneshot(post_json("/api/v1/auth/register", None, body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_with_malformed_nik() {
    let (app, _) = common::lazy_app(RELAXED_LIMIT);

    let body = json!({ "nik": "abc", "password": "whatever1" });
    let response = app
        .oneshot(post_json("/api/v1/auth/login", None, body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "invalid_credentials");
}

#[tokio::test]
async fn test_refresh_issues_new_pair() {
    let (app, state) = common::lazy_app(RELAXED_LIMIT);
    let customer_id = Uuid::new_v4();
    let pair = state.tokens.issue(customer_id, "3201010101900001").unwrap();

    let body = json!({ "refresh_token": pair.refresh_token });
    let response = app
        .oneshot(post_json("/api/v1/auth/refresh", None, body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["token_type"], "Bearer");

    let access = body["access_token"].as_str().unwrap();
    let claims = state.tokens.validate_access(access).unwrap();
    assert_eq!(claims.customer_id, customer_id);
}

#[tokio::test]
async fn test_refresh_with_bad_token() {
    let (app, state) = common::lazy_app(RELAXED_LIMIT);
    let pair = state
        .tokens
        .issue(Uuid::new_v4(), "3201010101900001")
        .unwrap();

    // An access token is not accepted for refresh.
    for token in ["garbage".to_string(), pair.access_token] {
        let body = json!({ "refresh_token": token });
        let response = app
            .clone()
            .oneshot(post_json("/api/v1/auth/refresh", None, body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_rate_limit_exceeded() {
    let (app, _) = common::lazy_app(2);

    let request = || {
        Request::builder()
            .uri("/api/v1/customers/me")
            .header("x-forwarded-for", "198.51.100.7")
            .body(Body::empty())
            .unwrap()
    };

    for expected_remaining in ["1", "0"] {
        let response = app.clone().oneshot(request()).await.unwrap();
        // Counted, then rejected by auth.
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["x-ratelimit-limit"], "2");
        assert_eq!(response.headers()["x-ratelimit-remaining"], expected_remaining);
    }

    let response = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    assert!(response.headers().contains_key("x-ratelimit-reset"));
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "rate_limit_exceeded");

    // Another client has its own window.
    let other = Request::builder()
        .uri("/api/v1/customers/me")
        .header("x-forwarded-for", "198.51.100.8")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(other).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_correlation_id_is_echoed() {
    let (app, _) = common::lazy_app(RELAXED_LIMIT);
    let id = Uuid::new_v4();

    let request = Request::builder()
        .uri("/api/v1/customers/me")
        .header("x-correlation-id", id.to_string())
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-correlation-id"], id.to_string().as_str());

    // Missing or invalid ids are replaced with a fresh one.
    let request = Request::builder()
        .uri("/api/v1/customers/me")
        .header("x-correlation-id", "not-a-uuid")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let echoed = response.headers()["x-correlation-id"].to_str().unwrap();
    assert!(Uuid::parse_str(echoed).is_ok());
}
