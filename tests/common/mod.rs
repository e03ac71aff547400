#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use lektora::modules::identity::model::{NewIdentity, Role};
use lektora::modules::identity::store::IdentityStore;
use lektora::router::init_router;
use lektora::testing::{TestStores, test_app_state};
use lektora::utils::password::hash_password;

/// Builds the real router over in-memory stores, plus concrete store
/// handles for seeding data outside the API surface.
pub fn setup_test_app() -> (Router, TestStores) {
    let (state, stores) = test_app_state();
    (init_router(state), stores)
}

pub async fn seed_identity(stores: &TestStores, role: Role, email: &str, password: &str) -> i64 {
    let password_hash = hash_password(password).unwrap();
    stores
        .identities
        .insert(NewIdentity {
            role,
            email: email.to_string(),
            password_hash,
        })
        .await
        .unwrap()
        .id
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn authed_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn authed_json_request(method: &str, uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Logs in through the API and returns the full login response body.
pub async fn login(app: &Router, email: &str, password: &str) -> Value {
    let request = json_request(
        "POST",
        "/api/auth/login",
        &serde_json::json!({ "email": email, "password": password }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response_json(response).await
}

/// Logs in and returns just the access token.
pub async fn login_token(app: &Router, email: &str, password: &str) -> String {
    login(app, email, password).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}
