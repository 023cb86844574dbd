//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// A media store asset reference: the fetchable URL plus the
/// store-assigned identifier needed to delete it later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
    pub public_id: String,
}

/// User profile stored in Firestore.
///
/// `password_hash` and `refresh_token` are persistence-only fields; API
/// responses are built from dedicated DTOs and never expose them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Document ID (UUID v4)
    pub id: String,
    /// Unique handle, lowercase and trimmed
    pub username: String,
    /// Unique contact address, lowercase
    pub email: String,
    /// Display name
    pub fullname: String,
    /// Salted one-way hash of the password
    pub password_hash: String,
    /// The sole valid refresh token, if a session is active
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Profile image
    #[serde(default)]
    pub avatar: Option<MediaRef>,
    /// Channel banner image
    #[serde(default)]
    pub cover_image: Option<MediaRef>,
    /// When the user registered (RFC 3339)
    pub created_at: String,
    /// Last profile mutation (RFC 3339)
    pub updated_at: String,
}

impl User {
    /// Normalize a handle the way registration stores it.
    pub fn normalize_username(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    /// Normalize a contact address the way registration stores it.
    pub fn normalize_email(raw: &str) -> String {
        raw.trim().to_lowercase()
    }
}
