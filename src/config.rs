//! Application configuration loaded from environment variables.
//!
//! Token signing secrets are read once at startup and injected into the
//! services that need them; nothing reads the environment after boot.

use std::env;

/// Default access token lifetime: 15 minutes.
const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 900;
/// Default refresh token lifetime: 10 days.
const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 864_000;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL for CORS and cookie attributes
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,

    // --- Token signing ---
    /// Access token signing secret (short-lived tokens)
    pub access_token_secret: String,
    /// Access token lifetime in seconds
    pub access_token_ttl_secs: u64,
    /// Refresh token signing secret (independent from the access secret)
    pub refresh_token_secret: String,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_secs: u64,

    // --- Media store ---
    /// Media store cloud name (URL path component)
    pub media_cloud_name: String,
    /// Media store API key
    pub media_api_key: String,
    /// Media store API secret
    pub media_api_secret: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),

            access_token_secret: env::var("ACCESS_TOKEN_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("ACCESS_TOKEN_SECRET"))?,
            access_token_ttl_secs: env::var("ACCESS_TOKEN_EXPIRY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_token_secret: env::var("REFRESH_TOKEN_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("REFRESH_TOKEN_SECRET"))?,
            refresh_token_ttl_secs: env::var("REFRESH_TOKEN_EXPIRY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_REFRESH_TOKEN_TTL_SECS),

            media_cloud_name: env::var("CLOUDINARY_CLOUD_NAME")
                .map_err(|_| ConfigError::Missing("CLOUDINARY_CLOUD_NAME"))?,
            media_api_key: env::var("CLOUDINARY_API_KEY")
                .map_err(|_| ConfigError::Missing("CLOUDINARY_API_KEY"))?,
            media_api_secret: env::var("CLOUDINARY_API_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("CLOUDINARY_API_SECRET"))?,
        })
    }

    /// Config for tests: fixed secrets, localhost frontend.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            access_token_secret: "test_access_secret_32_bytes_min!".to_string(),
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_token_secret: "test_refresh_secret_32_bytes_mi!".to_string(),
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
            media_cloud_name: "test-cloud".to_string(),
            media_api_key: "test_api_key".to_string(),
            media_api_secret: "test_api_secret".to_string(),
        }
    }

    /// Whether session cookies should carry the `Secure` attribute.
    ///
    /// Localhost frontends run without TLS; everything else must be https.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("ACCESS_TOKEN_SECRET", "access_secret");
        env::set_var("REFRESH_TOKEN_SECRET", "refresh_secret");
        env::set_var("CLOUDINARY_CLOUD_NAME", "demo");
        env::set_var("CLOUDINARY_API_KEY", "key");
        env::set_var("CLOUDINARY_API_SECRET", "secret");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.access_token_secret, "access_secret");
        assert_eq!(config.refresh_token_secret, "refresh_secret");
        assert_eq!(config.media_cloud_name, "demo");
        assert_eq!(config.port, 8080);
        assert_eq!(config.access_token_ttl_secs, DEFAULT_ACCESS_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_secure_cookies_follows_frontend_scheme() {
        let mut config = Config::test_default();
        assert!(!config.secure_cookies());

        config.frontend_url = "https://vidstream.example.com".to_string();
        assert!(config.secure_cookies());
    }
}
