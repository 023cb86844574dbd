// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile + session storage)
//! - Videos (metadata, view counters, owner listings)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{User, Video};
use crate::services::token::IdentityStore;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by document ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by their unique handle.
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let username = username.to_string();
        let mut users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("username").eq(username.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.pop())
    }

    /// Find a user by their unique contact address.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_string();
        let mut users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("email").eq(email.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.pop())
    }

    /// Create or update a user document.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Overwrite a user's refresh token field.
    ///
    /// Fetch-modify-write of the whole document; the single-document
    /// update is the only concurrency guard (last write wins).
    pub async fn set_refresh_token(
        &self,
        user_id: &str,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        let mut user = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        user.refresh_token = token.map(String::from);
        user.updated_at = chrono::Utc::now().to_rfc3339();
        self.upsert_user(&user).await
    }

    // ─── Video Operations ────────────────────────────────────────

    /// Get a video by document ID.
    pub async fn get_video(&self, id: &str) -> Result<Option<Video>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::VIDEOS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a video document.
    pub async fn upsert_video(&self, video: &Video) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::VIDEOS)
            .document_id(&video.id)
            .object(video)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get published videos for an owner with pagination, newest first.
    pub async fn get_videos_for_owner(
        &self,
        owner_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Video>, AppError> {
        let owner_id = owner_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::VIDEOS)
            .filter(move |q| {
                q.for_all([
                    q.field("owner_id").eq(owner_id.clone()),
                    q.field("is_published").eq(true),
                ])
            })
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(limit)
            .offset(offset)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

// The slice of this store the token lifecycle depends on.
impl IdentityStore for FirestoreDb {
    async fn identity_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        self.get_user(id).await
    }

    async fn persist_refresh_token(
        &self,
        id: &str,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        self.set_refresh_token(id, token).await
    }
}
