// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access token authentication middleware (the auth gate).

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Name of the access token cookie.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Name of the refresh token cookie.
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Authenticated user extracted from a verified access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
}

/// Middleware that requires a valid access token.
///
/// The token is taken from the `accessToken` cookie first, then from the
/// `Authorization: Bearer` header. Verification is delegated to the token
/// service; the resolved identity is attached as a request extension.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header {
            Some(h) if h.starts_with("Bearer ") => h[7..].to_string(),
            _ => return Err(StatusCode::UNAUTHORIZED),
        }
    };

    let claims = state
        .token_service
        .verify_access(&token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let auth_user = AuthUser {
        user_id: claims.sub,
        username: claims.username,
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}
