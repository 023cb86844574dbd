// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use std::sync::Arc;

use vidstream::config::Config;
use vidstream::db::FirestoreDb;
use vidstream::routes::create_router;
use vidstream::services::{Argon2Hasher, JwtSigner, MediaService, TokenService};
use vidstream::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Build the app around a given database; media store is always mocked.
#[allow(dead_code)]
pub fn create_test_app_with_db(db: FirestoreDb) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();

    let signer = Arc::new(JwtSigner::from_config(&config));
    let token_service = TokenService::new(
        db.clone(),
        signer,
        config.access_token_ttl_secs,
        config.refresh_token_ttl_secs,
    );

    let state = Arc::new(AppState {
        config,
        db,
        token_service,
        media: MediaService::new_mock(),
        hasher: Arc::new(Argon2Hasher),
    });

    (create_router(state.clone()), state)
}

/// Create a test app with offline mock dependencies.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_db(test_db_offline())
}

/// Create a test app against the Firestore emulator.
#[allow(dead_code)]
pub async fn create_emulator_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_db(test_db().await)
}

/// Serialize fields and files into a multipart/form-data body.
#[allow(dead_code)]
pub fn multipart_body(
    boundary: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    for (name, filename, bytes) in files {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}
