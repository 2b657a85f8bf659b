//! Integration tests for registration and login.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use common::{body_json, post_json, register_user};

#[sqlx::test(migrations = "../db/migrations")]
async fn register_returns_token_and_user(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        &app,
        "/api/v1/users",
        None,
        json!({
            "phone_number": "5551234567",
            "username": "maria",
            "password": "a-decent-password",
            "role": "ROLE_PASSENGER",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["phone_number"], "5551234567");
    assert_eq!(body["user"]["state"], "FREE");
    // The password hash must never appear in responses.
    assert!(body["user"].get("password_hash").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_phone_number_conflicts(pool: PgPool) {
    let app = common::build_test_app(pool);
    register_user(&app, "5551234567", "ROLE_PASSENGER").await;

    let response = post_json(
        &app,
        "/api/v1/users",
        None,
        json!({
            "phone_number": "5551234567",
            "username": "impostor",
            "password": "a-decent-password",
            "role": "ROLE_PASSENGER",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_rejects_bad_phone_and_short_password(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        &app,
        "/api/v1/users",
        None,
        json!({
            "phone_number": "not-a-phone",
            "username": "maria",
            "password": "a-decent-password",
            "role": "ROLE_PASSENGER",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        &app,
        "/api/v1/users",
        None,
        json!({
            "phone_number": "5551234567",
            "username": "maria",
            "password": "short",
            "role": "ROLE_PASSENGER",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_rejects_unknown_role(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        &app,
        "/api/v1/users",
        None,
        json!({
            "phone_number": "5551234567",
            "username": "maria",
            "password": "a-decent-password",
            "role": "ROLE_WIZARD",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn login_roundtrip(pool: PgPool) {
    let app = common::build_test_app(pool);
    register_user(&app, "5551234567", "ROLE_DRIVER").await;

    let response = post_json(
        &app,
        "/api/v1/auth/login",
        None,
        json!({
            "phone_number": "5551234567",
            "password": "hunter2-hunter2",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["role"], "ROLE_DRIVER");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn login_with_wrong_password_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);
    register_user(&app, "5551234567", "ROLE_DRIVER").await;

    let response = post_json(
        &app,
        "/api/v1/auth/login",
        None,
        json!({
            "phone_number": "5551234567",
            "password": "wrong-password",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn login_with_unknown_phone_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        &app,
        "/api/v1/auth/login",
        None,
        json!({
            "phone_number": "5550000000",
            "password": "hunter2-hunter2",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
