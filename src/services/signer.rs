// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token signing behind a capability trait.
//!
//! Access and refresh tokens are signed with independent secrets, so a
//! leaked access secret can never forge a refresh token. The default
//! implementation is HS256 JWTs; tests substitute deterministic stubs.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AppError;

/// Access token claims: identity plus handle for request handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user document ID)
    pub sub: String,
    /// User handle
    pub username: String,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
}

/// Refresh token claims: identity only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject (user document ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
}

/// Signing/verification capability for both token classes.
///
/// Verification failures collapse to [`AppError::Unauthorized`]: callers
/// must not be able to distinguish a forged token from an expired one.
pub trait Signer: Send + Sync {
    fn sign_access(&self, claims: &AccessClaims) -> Result<String, AppError>;
    fn sign_refresh(&self, claims: &RefreshClaims) -> Result<String, AppError>;
    fn verify_access(&self, token: &str) -> Result<AccessClaims, AppError>;
    fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AppError>;
}

/// HS256 JWT signer with one secret per token class.
pub struct JwtSigner {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    validation: Validation,
}

impl JwtSigner {
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        // Zero leeway: a token expires exactly at `exp`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
            validation,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.access_token_secret.as_bytes(),
            config.refresh_token_secret.as_bytes(),
        )
    }
}

impl Signer for JwtSigner {
    fn sign_access(&self, claims: &AccessClaims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.access_encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("token signing failed: {}", e)))
    }

    fn sign_refresh(&self, claims: &RefreshClaims) -> Result<String, AppError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.refresh_encoding,
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("token signing failed: {}", e)))
    }

    fn verify_access(&self, token: &str) -> Result<AccessClaims, AppError> {
        decode::<AccessClaims>(token, &self.access_decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }

    fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AppError> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }
}

/// Current Unix timestamp in seconds.
pub fn unix_now() -> usize {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> JwtSigner {
        JwtSigner::new(b"access_secret_for_tests_32bytes!", b"refresh_secret_for_tests_32byte!")
    }

    #[test]
    fn test_access_roundtrip() {
        let signer = signer();
        let now = unix_now();
        let claims = AccessClaims {
            sub: "user-1".to_string(),
            username: "alice".to_string(),
            iat: now,
            exp: now + 900,
        };

        let token = signer.sign_access(&claims).unwrap();
        let decoded = signer.verify_access(&token).unwrap();

        assert_eq!(decoded.sub, "user-1");
        assert_eq!(decoded.username, "alice");
    }

    #[test]
    fn test_refresh_roundtrip() {
        let signer = signer();
        let now = unix_now();
        let claims = RefreshClaims {
            sub: "user-1".to_string(),
            iat: now,
            exp: now + 864_000,
        };

        let token = signer.sign_refresh(&claims).unwrap();
        let decoded = signer.verify_refresh(&token).unwrap();

        assert_eq!(decoded.sub, "user-1");
    }

    #[test]
    fn test_classes_use_independent_secrets() {
        // A refresh token must not verify as an access token, and vice versa.
        let signer = signer();
        let now = unix_now();

        let refresh = signer
            .sign_refresh(&RefreshClaims {
                sub: "user-1".to_string(),
                iat: now,
                exp: now + 864_000,
            })
            .unwrap();
        assert!(matches!(
            signer.verify_access(&refresh),
            Err(AppError::Unauthorized)
        ));

        let access = signer
            .sign_access(&AccessClaims {
                sub: "user-1".to_string(),
                username: "alice".to_string(),
                iat: now,
                exp: now + 900,
            })
            .unwrap();
        assert!(matches!(
            signer.verify_refresh(&access),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_expired_token_rejected_despite_valid_signature() {
        let signer = signer();
        let now = unix_now();
        let claims = AccessClaims {
            sub: "user-1".to_string(),
            username: "alice".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };

        let token = signer.sign_access(&claims).unwrap();
        assert!(matches!(
            signer.verify_access(&token),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let signer = signer();
        assert!(matches!(
            signer.verify_access("not.a.jwt"),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            signer.verify_refresh(""),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = signer();
        let other = JwtSigner::new(b"other_access_secret_32_bytes!!!!", b"other_refresh_secret_32_bytes!!!");
        let now = unix_now();

        let token = other
            .sign_access(&AccessClaims {
                sub: "user-1".to_string(),
                username: "alice".to_string(),
                iat: now,
                exp: now + 900,
            })
            .unwrap();

        assert!(matches!(
            signer.verify_access(&token),
            Err(AppError::Unauthorized)
        ));
    }
}
