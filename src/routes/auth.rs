// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, login, and session routes.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{AuthUser, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::models::{MediaRef, User};
use crate::routes::users::UserResponse;
use crate::services::TokenPair;
use crate::AppState;

/// Body limit for registration (two images).
const REGISTER_BODY_LIMIT: usize = 16 * 1024 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .layer(DefaultBodyLimit::max(REGISTER_BODY_LIMIT))
}

/// Routes that require an authenticated session; the auth middleware is
/// applied in routes/mod.rs.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/logout", post(logout))
}

// ─── Cookies ─────────────────────────────────────────────────

/// Session cookie: HttpOnly, SameSite=Lax, Secure outside localhost.
fn session_cookie(
    name: &'static str,
    value: String,
    max_age_secs: u64,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(max_age_secs as i64))
        .build()
}

/// Expired cookie with matching attributes, for removal.
fn removal_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .build()
}

/// Add both session cookies for a freshly issued pair.
fn with_session_cookies(jar: CookieJar, state: &AppState, pair: &TokenPair) -> CookieJar {
    let secure = state.config.secure_cookies();
    jar.add(session_cookie(
        ACCESS_TOKEN_COOKIE,
        pair.access_token.clone(),
        state.config.access_token_ttl_secs,
        secure,
    ))
    .add(session_cookie(
        REFRESH_TOKEN_COOKIE,
        pair.refresh_token.clone(),
        state.config.refresh_token_ttl_secs,
        secure,
    ))
}

// ─── Registration ────────────────────────────────────────────

#[derive(Debug, Validate)]
struct RegisterInput {
    #[validate(length(min = 1, message = "fullname is required"))]
    fullname: String,
    #[validate(email(message = "email must be a valid address"))]
    email: String,
    #[validate(length(min = 3, message = "username must be at least 3 characters"))]
    username: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    password: String,
}

/// An uploaded file captured from a multipart field.
struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
}

/// Register a new user from a multipart form: text fields plus a required
/// `avatar` file and an optional `coverImage` file.
async fn register(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let mut fullname = String::new();
    let mut email = String::new();
    let mut username = String::new();
    let mut password = String::new();
    let mut avatar: Option<UploadedFile> = None;
    let mut cover: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "fullname" => fullname = read_text(field).await?,
            "email" => email = read_text(field).await?,
            "username" => username = read_text(field).await?,
            "password" => password = read_text(field).await?,
            "avatar" => avatar = Some(read_file(field).await?),
            "coverImage" => cover = Some(read_file(field).await?),
            _ => {}
        }
    }

    let input = RegisterInput {
        fullname: fullname.trim().to_string(),
        email: User::normalize_email(&email),
        username: User::normalize_username(&username),
        password,
    };
    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let avatar = avatar.ok_or_else(|| AppError::Validation("avatar is required".to_string()))?;

    // Uniqueness of handle and contact address. Firestore has no unique
    // indexes; query-before-create is the guard.
    if state
        .db
        .find_user_by_username(&input.username)
        .await?
        .is_some()
        || state.db.find_user_by_email(&input.email).await?.is_some()
    {
        return Err(AppError::Conflict(
            "username or email already exists".to_string(),
        ));
    }

    let avatar_asset = state.media.upload(avatar.bytes, &avatar.filename).await?;
    let cover_ref = match cover {
        Some(file) => Some(media_ref(
            state.media.upload(file.bytes, &file.filename).await?,
        )),
        None => None,
    };

    let password_hash = state.hasher.hash(&input.password)?;
    let now = chrono::Utc::now().to_rfc3339();

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username: input.username,
        email: input.email,
        fullname: input.fullname,
        password_hash,
        refresh_token: None,
        avatar: Some(media_ref(avatar_asset)),
        cover_image: cover_ref,
        created_at: now.clone(),
        updated_at: now,
    };

    state.db.upsert_user(&user).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

fn media_ref(asset: crate::services::MediaAsset) -> MediaRef {
    MediaRef {
        url: asset.url,
        public_id: asset.public_id,
    }
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))
}

async fn read_file(field: axum::extract::multipart::Field<'_>) -> Result<UploadedFile> {
    let filename = field.file_name().unwrap_or("upload").to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
        .to_vec();
    Ok(UploadedFile { filename, bytes })
}

// ─── Login ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

/// Contact-address login: verify the password, issue a token pair, and
/// hand both tokens to the client as cookies and in the body.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    if req.email.trim().is_empty() {
        return Err(AppError::Validation("email is required".to_string()));
    }

    let email = User::normalize_email(&req.email);
    let user = state
        .db
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("user does not exist".to_string()))?;

    if !state.hasher.verify(&req.password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let pair = state.token_service.issue(&user).await?;
    let jar = with_session_cookies(jar, &state, &pair);

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        jar,
        Json(SessionResponse {
            user: UserResponse::from(&user),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }),
    ))
}

// ─── Refresh ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RefreshRequest {
    /// Body fallback when the cookie is absent.
    #[serde(default, alias = "refreshToken")]
    refresh_token: Option<String>,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Rotate a refresh token into a fresh pair. The sole path by which a
/// client regains a valid access token without re-submitting credentials.
///
/// The body is read manually: cookie-only requests arrive with no body
/// at all, and a missing token must be a 401, not an extractor rejection.
async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: axum::body::Bytes,
) -> Result<(CookieJar, Json<TokenResponse>)> {
    let body_token = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<RefreshRequest>(&body)
            .ok()
            .and_then(|req| req.refresh_token)
    };

    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or(body_token)
        .ok_or(AppError::Unauthorized)?;

    let (user, pair) = state.token_service.rotate(&presented).await?;
    let jar = with_session_cookies(jar, &state, &pair);

    tracing::debug!(user_id = %user.id, "Access token refreshed");

    Ok((
        jar,
        Json(TokenResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }),
    ))
}

// ─── Logout ──────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Revoke the session's refresh token and expire both cookies.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>)> {
    state.token_service.revoke(&user.user_id).await?;

    let secure = state.config.secure_cookies();
    let jar = jar
        .add(removal_cookie(ACCESS_TOKEN_COOKIE, secure))
        .add(removal_cookie(REFRESH_TOKEN_COOKIE, secure));

    tracing::info!(user_id = %user.user_id, "User logged out");

    Ok((
        jar,
        Json(MessageResponse {
            message: "logged out".to_string(),
        }),
    ))
}
