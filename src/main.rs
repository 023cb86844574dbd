// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! VidStream API Server
//!
//! Backend for a video-sharing platform: registration, token-based
//! sessions with refresh rotation, and video upload/retrieval.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidstream::{
    config::Config,
    db::FirestoreDb,
    services::{Argon2Hasher, JwtSigner, MediaService, TokenService},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting VidStream API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Token service: signing secrets are read once here and never again.
    let signer = Arc::new(JwtSigner::from_config(&config));
    let token_service = TokenService::new(
        db.clone(),
        signer,
        config.access_token_ttl_secs,
        config.refresh_token_ttl_secs,
    );
    tracing::info!(
        access_ttl_secs = config.access_token_ttl_secs,
        refresh_ttl_secs = config.refresh_token_ttl_secs,
        "Token service initialized"
    );

    // Media store client
    let media = MediaService::new(&config);
    tracing::info!(cloud = %config.media_cloud_name, "Media service initialized");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        token_service,
        media,
        hasher: Arc::new(Argon2Hasher),
    });

    // Build router
    let app = vidstream::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vidstream=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
