// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing behind a capability trait.
//!
//! Handlers depend on [`Hasher`], not on a specific crypto crate, so the
//! implementation can be swapped for a deterministic stub in tests.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::AppError;

/// One-way password hashing capability.
pub trait Hasher: Send + Sync {
    /// Hash a cleartext password for storage.
    fn hash(&self, password: &str) -> Result<String, AppError>;

    /// Check a cleartext password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError>;
}

/// Argon2id implementation with per-password random salts.
#[derive(Default)]
pub struct Argon2Hasher;

impl Hasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
            .to_string();

        Ok(hash)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("stored hash unparseable: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
