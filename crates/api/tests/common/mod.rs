//! Shared harness for API integration tests.
//!
//! Builds the application router with the exact same middleware stack as
//! production (via `build_app_router`) against the test database pool that
//! `#[sqlx::test]` provides.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use ridepool_api::auth::jwt::JwtConfig;
use ridepool_api::config::ServerConfig;
use ridepool_api::router::build_app_router;
use ridepool_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Send a request and return the raw response.
pub async fn request(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    request(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    request(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> Response<Body> {
    request(app, Method::POST, uri, token, Some(body)).await
}

pub async fn put_json(app: &Router, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
    request(app, Method::PUT, uri, token, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    request(app, Method::DELETE, uri, token, None).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register an account through the API; returns `(user_id, token)`.
pub async fn register_user(app: &Router, phone: &str, role: &str) -> (i64, String) {
    let response = post_json(
        app,
        "/api/v1/users",
        None,
        serde_json::json!({
            "phone_number": phone,
            "username": format!("user-{phone}"),
            "password": "hunter2-hunter2",
            "role": role,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let user_id = json["user"]["id"].as_i64().unwrap();
    let token = json["token"].as_str().unwrap().to_string();
    (user_id, token)
}

/// Register a driver and give them a car; returns `(user_id, token)`.
pub async fn register_driver(app: &Router, phone: &str) -> (i64, String) {
    let (user_id, token) = register_user(app, phone, "ROLE_DRIVER").await;
    let response = put_json(
        app,
        &format!("/api/v1/users/{user_id}/car"),
        Some(&token),
        serde_json::json!({
            "model": "Volvo 240",
            "color": "blue",
            "reg_number": format!("REG-{phone}"),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    (user_id, token)
}

/// A valid track creation payload departing in one hour.
pub fn track_payload() -> Value {
    serde_json::json!({
        "start_x": 10.0,
        "start_y": 20.0,
        "start_address": "Origin St 1",
        "end_x": 30.0,
        "end_y": 40.0,
        "end_address": null,
        "max_seats": 1,
        "driver_comment": "north gate",
        "departure_time": chrono::Utc::now() + chrono::Duration::hours(1),
    })
}
