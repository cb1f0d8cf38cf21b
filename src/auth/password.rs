//! Password hashing and verification.

use crate::types::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::sync::LazyLock;

/// Argon2id memory cost in KiB.
pub const MEMORY_COST_KIB: u32 = 19_456;
/// Argon2id iteration count.
pub const TIME_COST: u32 = 2;
/// Argon2id lanes.
pub const PARALLELISM: u32 = 1;

fn hasher() -> Result<Argon2<'static>> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
        .map_err(|e| AppError::Internal(format!("Invalid Argon2 parameters: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password with a fresh random salt.
///
/// Returns a PHC-formatted string that embeds the algorithm, cost and salt.
pub fn hash(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    hasher()?
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Checks `plaintext` against a stored hash.
///
/// A non-matching password is reported as [`AppError::CredentialMismatch`];
/// an unparsable stored hash is an internal error. Verification reads its
/// cost parameters from the hash itself.
pub fn verify(hashed: &str, plaintext: &str) -> Result<()> {
    let parsed = PasswordHash::new(hashed)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(()),
        Err(argon2::password_hash::Error::Password) => Err(AppError::CredentialMismatch(
            "password does not match".to_string(),
        )),
        Err(e) => Err(AppError::Internal(format!(
            "Failed to verify password: {}",
            e
        ))),
    }
}

static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| hash("devbook-dummy-password").ok());

/// Runs a full verification against a throwaway hash and discards the
/// outcome, so a lookup miss costs the same as a wrong password.
pub fn verify_dummy(plaintext: &str) {
    if let Some(hashed) = DUMMY_HASH.as_deref() {
        let _ = verify(hashed, plaintext);
    }
}
