// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth gate tests against the real router (offline database).
//!
//! Everything here must be decided before any store access: missing,
//! malformed, expired, and wrong-class tokens are all rejected at the
//! gate with 401.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use std::sync::Arc;
use tower::ServiceExt;
use vidstream::services::signer::{unix_now, AccessClaims, RefreshClaims, Signer};
use vidstream::services::JwtSigner;

mod common;

fn test_signer() -> Arc<dyn Signer> {
    let config = vidstream::config::Config::test_default();
    Arc::new(JwtSigner::from_config(&config))
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_garbage_bearer() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::AUTHORIZATION, "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_expired_token() {
    let (app, _) = common::create_test_app();

    let now = unix_now();
    let token = test_signer()
        .sign_access(&AccessClaims {
            sub: "user-1".to_string(),
            username: "alice".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        })
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_rejected_at_the_gate() {
    // A refresh token must never authenticate a request: wrong class,
    // wrong secret.
    let (app, _) = common::create_test_app();

    let now = unix_now();
    let token = test_signer()
        .sign_refresh(&RefreshClaims {
            sub: "user-1".to_string(),
            iat: now,
            exp: now + 864_000,
        })
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_token_passes_the_gate() {
    // With a valid access token the gate admits the request; the offline
    // database then fails the handler with a 500, proving we got past 401.
    let (app, _) = common::create_test_app();

    let now = unix_now();
    let token = test_signer()
        .sign_access(&AccessClaims {
            sub: "user-1".to_string(),
            username: "alice".to_string(),
            iat: now,
            exp: now + 900,
        })
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_token_accepted_from_cookie() {
    let (app, _) = common::create_test_app();

    let now = unix_now();
    let token = test_signer()
        .sign_access(&AccessClaims {
            sub: "user-1".to_string(),
            username: "alice".to_string(),
            iat: now,
            exp: now + 900,
        })
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::COOKIE, format!("accessToken={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Past the gate; fails on the offline database, not on auth.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_logout_requires_auth() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_without_any_token() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_with_forged_token() {
    // Signature failure is decided before any store lookup.
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/refresh")
                .header(header::COOKIE, "refreshToken=forged.refresh.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
