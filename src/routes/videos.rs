// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Video upload and retrieval routes.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{MediaRef, Video};
use crate::AppState;

/// Body limit for video uploads (file plus thumbnail).
const VIDEO_BODY_LIMIT: usize = 512 * 1024 * 1024;

const MAX_PER_PAGE: u32 = 100;

/// Video routes (require authentication via the auth middleware,
/// applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/videos", post(upload_video).get(list_videos))
        .route("/api/videos/{id}", get(get_video))
        .layer(DefaultBodyLimit::max(VIDEO_BODY_LIMIT))
}

// ─── Responses ───────────────────────────────────────────────

#[derive(Serialize)]
pub struct VideoResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub thumbnail_url: String,
    pub duration_seconds: f64,
    pub views: u64,
    pub is_published: bool,
    pub owner_id: String,
    pub created_at: String,
}

impl From<&Video> for VideoResponse {
    fn from(video: &Video) -> Self {
        Self {
            id: video.id.clone(),
            title: video.title.clone(),
            description: video.description.clone(),
            url: video.video.url.clone(),
            thumbnail_url: video.thumbnail.url.clone(),
            duration_seconds: video.duration_seconds,
            views: video.views,
            is_published: video.is_published,
            owner_id: video.owner_id.clone(),
            created_at: video.created_at.clone(),
        }
    }
}

// ─── Upload ──────────────────────────────────────────────────

/// Upload a video: `title` and `description` text fields plus the
/// `videofile` and `thumbnail` files. Both binaries go to the media store
/// concurrently before the record is written.
async fn upload_video(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<VideoResponse>)> {
    let mut title = String::new();
    let mut description = String::new();
    let mut video_file: Option<(String, Vec<u8>)> = None;
    let mut thumbnail_file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => {
                title = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?
            }
            "description" => {
                description = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?
            }
            "videofile" | "thumbnail" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?
                    .to_vec();
                if name == "videofile" {
                    video_file = Some((filename, bytes));
                } else {
                    thumbnail_file = Some((filename, bytes));
                }
            }
            _ => {}
        }
    }

    let title = title.trim().to_string();
    let description = description.trim().to_string();
    if title.is_empty() || description.is_empty() {
        return Err(AppError::Validation(
            "title and description are required".to_string(),
        ));
    }

    let (video_name, video_bytes) =
        video_file.ok_or_else(|| AppError::Validation("video file is required".to_string()))?;
    let (thumb_name, thumb_bytes) =
        thumbnail_file.ok_or_else(|| AppError::Validation("thumbnail is required".to_string()))?;

    let (video_asset, thumb_asset) = futures_util::try_join!(
        state.media.upload(video_bytes, &video_name),
        state.media.upload(thumb_bytes, &thumb_name),
    )?;

    let now = chrono::Utc::now().to_rfc3339();
    let video = Video {
        id: uuid::Uuid::new_v4().to_string(),
        title,
        description,
        duration_seconds: video_asset.duration_seconds,
        video: MediaRef {
            url: video_asset.url,
            public_id: video_asset.public_id,
        },
        thumbnail: MediaRef {
            url: thumb_asset.url,
            public_id: thumb_asset.public_id,
        },
        views: 0,
        is_published: true,
        owner_id: user.user_id.clone(),
        created_at: now.clone(),
        updated_at: now,
    };

    state.db.upsert_video(&video).await?;

    tracing::info!(video_id = %video.id, owner_id = %user.user_id, "Video uploaded");

    Ok((StatusCode::CREATED, Json(VideoResponse::from(&video))))
}

// ─── Retrieval ───────────────────────────────────────────────

/// Fetch a video by ID and count the view.
///
/// Concurrent fetches may coalesce increments; the counter only ever
/// moves forward.
async fn get_video(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<VideoResponse>> {
    let mut video = state
        .db
        .get_video(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;

    // Drafts are visible to their owner only.
    if !video.is_published && video.owner_id != user.user_id {
        return Err(AppError::NotFound(format!("Video {} not found", id)));
    }

    video.views += 1;
    video.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.upsert_video(&video).await?;

    Ok(Json(VideoResponse::from(&video)))
}

#[derive(Deserialize)]
struct VideosQuery {
    /// Pagination: page number (1-indexed)
    #[serde(default = "default_page")]
    page: u32,
    /// Pagination: items per page
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

#[derive(Serialize)]
struct VideoListResponse {
    videos: Vec<VideoResponse>,
    page: u32,
    per_page: u32,
}

/// List the caller's published videos, newest first.
async fn list_videos(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<VideosQuery>,
) -> Result<Json<VideoListResponse>> {
    let page = query.page.max(1);
    let per_page = query.per_page.clamp(1, MAX_PER_PAGE);
    let offset = (page - 1).saturating_mul(per_page);

    let videos = state
        .db
        .get_videos_for_owner(&user.user_id, per_page, offset)
        .await?;

    Ok(Json(VideoListResponse {
        videos: videos.iter().map(VideoResponse::from).collect(),
        page,
        per_page,
    }))
}
