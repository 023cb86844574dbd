// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! VidStream: backend API for a video-sharing platform.
//!
//! This crate provides user registration/authentication with
//! access/refresh token rotation, profile management, and video
//! upload/retrieval backed by Firestore and a media-hosting service.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use config::Config;
use db::FirestoreDb;
use services::{Hasher, MediaService, TokenService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub token_service: TokenService<FirestoreDb>,
    pub media: MediaService,
    pub hasher: Arc<dyn Hasher>,
}
