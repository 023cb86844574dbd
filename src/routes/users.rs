// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes for authenticated users.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{MediaRef, User};
use crate::routes::auth::MessageResponse;
use crate::AppState;

/// Body limit for single-image uploads.
const IMAGE_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Profile routes (require authentication via the auth middleware,
/// applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/change-password", post(change_password))
        .route("/api/account", patch(update_account))
        .route("/api/avatar", post(update_avatar))
        .route("/api/cover", post(update_cover))
        .route("/api/channel/{username}", get(get_channel))
        .layer(DefaultBodyLimit::max(IMAGE_BODY_LIMIT))
}

// ─── User Profile ────────────────────────────────────────────

/// Public view of a user. Never carries the password hash or the
/// refresh token.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            fullname: user.fullname.clone(),
            avatar_url: user.avatar.as_ref().map(|m| m.url.clone()),
            cover_image_url: user.cover_image.as_ref().map(|m| m.url.clone()),
            created_at: user.created_at.clone(),
        }
    }
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = load_user(&state, &user.user_id).await?;
    Ok(Json(UserResponse::from(&profile)))
}

async fn load_user(state: &AppState, user_id: &str) -> Result<User> {
    state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
}

// ─── Password ────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[serde(default, alias = "oldPassword")]
    old_password: String,
    #[serde(default, alias = "newPassword")]
    #[validate(length(min = 8, message = "new password must be at least 8 characters"))]
    new_password: String,
}

/// Change the current password after re-verifying the old one.
async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let mut profile = load_user(&state, &user.user_id).await?;

    if !state
        .hasher
        .verify(&req.old_password, &profile.password_hash)?
    {
        return Err(AppError::Unauthorized);
    }

    profile.password_hash = state.hasher.hash(&req.new_password)?;
    profile.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.upsert_user(&profile).await?;

    tracing::info!(user_id = %profile.id, "Password changed");

    Ok(Json(MessageResponse {
        message: "password changed".to_string(),
    }))
}

// ─── Account Details ─────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct UpdateAccountRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "fullname is required"))]
    fullname: String,
    #[serde(default)]
    #[validate(email(message = "email must be a valid address"))]
    email: String,
}

/// Update display name and contact address.
async fn update_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<UserResponse>> {
    let req = UpdateAccountRequest {
        fullname: req.fullname.trim().to_string(),
        email: User::normalize_email(&req.email),
    };
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let mut profile = load_user(&state, &user.user_id).await?;

    // Moving to a new address must not collide with another account.
    if req.email != profile.email
        && state.db.find_user_by_email(&req.email).await?.is_some()
    {
        return Err(AppError::Conflict("email already exists".to_string()));
    }

    profile.fullname = req.fullname;
    profile.email = req.email;
    profile.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.upsert_user(&profile).await?;

    Ok(Json(UserResponse::from(&profile)))
}

// ─── Profile Media ───────────────────────────────────────────

fn avatar_slot(user: &mut User) -> &mut Option<MediaRef> {
    &mut user.avatar
}

fn cover_slot(user: &mut User) -> &mut Option<MediaRef> {
    &mut user.cover_image
}

/// Replace the avatar: upload the new image, then retire the old asset.
async fn update_avatar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<Json<UserResponse>> {
    let profile = replace_image(&state, &user.user_id, multipart, "avatar", avatar_slot).await?;
    Ok(Json(UserResponse::from(&profile)))
}

/// Replace the channel banner image.
async fn update_cover(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<Json<UserResponse>> {
    let profile = replace_image(&state, &user.user_id, multipart, "coverImage", cover_slot).await?;
    Ok(Json(UserResponse::from(&profile)))
}

/// Shared avatar/cover replacement: read the single file field, upload
/// it, swap the stored reference, and delete the superseded asset.
async fn replace_image(
    state: &AppState,
    user_id: &str,
    mut multipart: Multipart,
    field_name: &str,
    select: fn(&mut User) -> &mut Option<MediaRef>,
) -> Result<User> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() == Some(field_name) {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(e.to_string()))?
                .to_vec();
            upload = Some((filename, bytes));
        }
    }

    let (filename, bytes) = upload
        .ok_or_else(|| AppError::Validation(format!("{} file is missing", field_name)))?;

    let mut profile = load_user(state, user_id).await?;

    let asset = state.media.upload(bytes, &filename).await?;

    // Retire the old asset only after the new upload landed. A failed
    // delete leaves an orphan in the media store, not a broken profile.
    if let Some(old) = select(&mut profile).take() {
        if let Err(e) = state.media.delete(&old.public_id).await {
            tracing::warn!(public_id = %old.public_id, error = %e, "Failed to delete old asset");
        }
    }

    *select(&mut profile) = Some(MediaRef {
        url: asset.url,
        public_id: asset.public_id,
    });
    profile.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.upsert_user(&profile).await?;

    tracing::info!(user_id = %profile.id, field = field_name, "Profile image updated");

    Ok(profile)
}

// ─── Channel ─────────────────────────────────────────────────

/// Public channel profile: no contact address.
#[derive(Serialize)]
pub struct ChannelResponse {
    pub username: String,
    pub fullname: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
}

/// Look up a channel by handle.
async fn get_channel(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ChannelResponse>> {
    let username = User::normalize_username(&username);
    if username.is_empty() {
        return Err(AppError::Validation("username is missing".to_string()));
    }

    let user = state
        .db
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("channel not found".to_string()))?;

    Ok(Json(ChannelResponse {
        username: user.username,
        fullname: user.fullname,
        avatar_url: user.avatar.map(|m| m.url),
        cover_image_url: user.cover_image.map(|m| m.url),
    }))
}
