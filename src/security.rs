// SPDX-License-Identifier: AGPL-3.0-or-later

//! Credential engine: password hashing and token generation.
//!
//! Passwords are derived with PBKDF2-HMAC-SHA256 (310 000 iterations,
//! 16-byte random salt, 32-byte key). Verification goes through
//! `ring::pbkdf2::verify`, which compares in constant time.
//!
//! Session and verification tokens are opaque random strings; their validity
//! is checked by server-side lookup, so logout is a real revocation. No
//! signed-token variant is kept.

use std::num::NonZeroU32;

use base64ct::{Base64, Base64UrlUnpadded, Encoding};
use ring::{digest, pbkdf2, rand};
use ring::rand::SecureRandom;

/// PBKDF2 iteration count. Matches the legacy dataset so existing password
/// hashes keep verifying.
const PBKDF2_ITERATIONS: u32 = 310_000;

const SALT_LEN: usize = 16;
const KEY_LEN: usize = digest::SHA256_OUTPUT_LEN;

const SESSION_TOKEN_LEN: usize = 32;
const VERIFICATION_TOKEN_LEN: usize = 24;

/// Session lifetime: 7 days.
pub const SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Verification link lifetime: 24 hours.
pub const VERIFICATION_TTL_SECONDS: i64 = 24 * 60 * 60;

/// Errors from the credential engine.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("system randomness unavailable")]
    Rng,
}

/// A salted password hash, both parts base64 encoded for storage.
#[derive(Debug, Clone)]
pub struct PasswordCredential {
    pub salt: String,
    pub hash: String,
}

/// Derive a salted hash for a new password.
pub fn hash_password(password: &str) -> Result<PasswordCredential, CredentialError> {
    let rng = rand::SystemRandom::new();

    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| CredentialError::Rng)?;

    let mut key = [0u8; KEY_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations(),
        &salt,
        password.as_bytes(),
        &mut key,
    );

    Ok(PasswordCredential {
        salt: Base64::encode_string(&salt),
        hash: Base64::encode_string(&key),
    })
}

/// Check a password against a stored salt + hash.
///
/// Undecodable stored values count as a mismatch rather than an error, so a
/// damaged record cannot be logged into.
pub fn verify_password(password: &str, salt: &str, hash: &str) -> bool {
    let Ok(salt) = Base64::decode_vec(salt) else {
        return false;
    };
    let Ok(hash) = Base64::decode_vec(hash) else {
        return false;
    };

    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations(),
        &salt,
        password.as_bytes(),
        &hash,
    )
    .is_ok()
}

/// Opaque session token: 32 random bytes, base64url.
pub fn generate_session_token() -> Result<String, CredentialError> {
    random_token(SESSION_TOKEN_LEN)
}

/// Single-use email verification token: 24 random bytes, base64url.
pub fn generate_verification_token() -> Result<String, CredentialError> {
    random_token(VERIFICATION_TOKEN_LEN)
}

fn random_token(len: usize) -> Result<String, CredentialError> {
    let rng = rand::SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes).map_err(|_| CredentialError::Rng)?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

fn iterations() -> NonZeroU32 {
    NonZeroU32::new(PBKDF2_ITERATIONS).expect("iteration count is non-zero")
}
