// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token lifecycle: issue, verify, rotate, revoke.
//!
//! Two token classes are minted per session: a short-lived access token
//! carrying `{id, username}` and a long-lived refresh token carrying only
//! the id. A user has at most one valid refresh token at a time; every
//! rotation overwrites the stored token and kills the previous one.

use std::future::Future;
use std::sync::Arc;

use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::models::User;
use crate::services::signer::{unix_now, AccessClaims, RefreshClaims, Signer};

/// The slice of the persistence layer the token lifecycle needs: resolve
/// an identity and overwrite its refresh token field.
pub trait IdentityStore: Send + Sync {
    fn identity_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<User>, AppError>> + Send;

    /// Persist `token` as the identity's sole refresh token
    /// (`None` clears it).
    fn persist_refresh_token(
        &self,
        id: &str,
        token: Option<&str>,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues, verifies, and rotates session tokens against an identity store.
pub struct TokenService<S> {
    store: S,
    signer: Arc<dyn Signer>,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
}

impl<S: IdentityStore> TokenService<S> {
    pub fn new(store: S, signer: Arc<dyn Signer>, access_ttl_secs: u64, refresh_ttl_secs: u64) -> Self {
        Self {
            store,
            signer,
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Mint a token pair for an already-authenticated user and persist the
    /// refresh token as the user's sole valid one, superseding any prior
    /// session.
    pub async fn issue(&self, user: &User) -> Result<TokenPair, AppError> {
        let now = unix_now();

        let access_token = self.signer.sign_access(&AccessClaims {
            sub: user.id.clone(),
            username: user.username.clone(),
            iat: now,
            exp: now + self.access_ttl_secs as usize,
        })?;

        let refresh_token = self.signer.sign_refresh(&RefreshClaims {
            sub: user.id.clone(),
            iat: now,
            exp: now + self.refresh_ttl_secs as usize,
        })?;

        // A generic failure here: the caller must not learn whether the
        // identity exists or what went wrong in the store.
        self.store
            .persist_refresh_token(&user.id, Some(&refresh_token))
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Failed to persist refresh token");
                AppError::Internal(anyhow::anyhow!(
                    "something went wrong while generating tokens"
                ))
            })?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Validate an access token. No side effects.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AppError> {
        self.signer.verify_access(token)
    }

    /// Exchange a valid refresh token for a fresh pair, invalidating it.
    ///
    /// Not idempotent: the same token presented twice fails the second
    /// time because the store already holds its successor. Two concurrent
    /// rotations race at the store; the last write wins and the loser's
    /// pair dies on its next rotation.
    pub async fn rotate(&self, presented: &str) -> Result<(User, TokenPair), AppError> {
        let claims = self.signer.verify_refresh(presented)?;

        let user = self
            .store
            .identity_by_id(&claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let current = user
            .refresh_token
            .as_deref()
            .ok_or(AppError::RefreshTokenExpired)?;

        if !bool::from(current.as_bytes().ct_eq(presented.as_bytes())) {
            // Well-formed and signed, but already rotated out (or the
            // session was revoked and re-established).
            return Err(AppError::RefreshTokenExpired);
        }

        let pair = self.issue(&user).await?;
        Ok((user, pair))
    }

    /// Clear the stored refresh token; every previously issued refresh
    /// token for this user fails rotation from now on.
    pub async fn revoke(&self, user_id: &str) -> Result<(), AppError> {
        self.store.persist_refresh_token(user_id, None).await
    }
}
