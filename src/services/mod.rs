// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod hash;
pub mod media;
pub mod signer;
pub mod token;

pub use hash::{Argon2Hasher, Hasher};
pub use media::{MediaAsset, MediaService};
pub use signer::{AccessClaims, JwtSigner, RefreshClaims, Signer};
pub use token::{IdentityStore, TokenPair, TokenService};
