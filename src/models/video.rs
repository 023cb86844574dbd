//! Video model for storage and API.

use serde::{Deserialize, Serialize};

use crate::models::MediaRef;

/// A published (or draft) video stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// Document ID (UUID v4)
    pub id: String,
    pub title: String,
    pub description: String,
    /// The video file in the media store
    pub video: MediaRef,
    /// Thumbnail image in the media store
    pub thumbnail: MediaRef,
    /// Duration reported by the media store on upload, in seconds
    #[serde(default)]
    pub duration_seconds: f64,
    /// View counter; only ever incremented
    #[serde(default)]
    pub views: u64,
    /// Unpublished videos are hidden from listings
    #[serde(default = "default_published")]
    pub is_published: bool,
    /// Owning user's document ID (weak reference)
    pub owner_id: String,
    pub created_at: String,
    pub updated_at: String,
}

fn default_published() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_published_defaults_to_true() {
        let json = r#"{
            "id": "v1",
            "title": "intro",
            "description": "first video",
            "video": { "url": "https://media.example/v1.mp4", "public_id": "vid/v1" },
            "thumbnail": { "url": "https://media.example/t1.jpg", "public_id": "thumb/t1" },
            "owner_id": "u1",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        }"#;

        let video: Video = serde_json::from_str(json).unwrap();
        assert!(video.is_published);
        assert_eq!(video.views, 0);
    }
}
