//! Password hashing with Argon2id.
//!
//! Account passwords use a fresh random salt per hash. Password-history
//! entries use one fixed, configured salt so a candidate can be matched by
//! plain hash equality.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashError(String);

impl Display for HashError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "password hashing failed: {}", self.0)
    }
}

impl Error for HashError {}

/// Hashes `raw` with a random salt into a PHC string.
pub fn hash_password(raw: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    hash_with_salt(raw, &salt)
}

/// Hashes `raw` with a caller-supplied salt. Equal inputs give equal output.
pub fn hash_password_with_fixed_salt(raw: &str, salt: &str) -> Result<String, HashError> {
    let salt = SaltString::encode_b64(salt.as_bytes())
        .map_err(|err| HashError(format!("invalid salt: {err}")))?;
    hash_with_salt(raw, &salt)
}

/// Checks `raw` against a stored PHC string.
///
/// Returns `Ok(false)` on mismatch and on an empty (unusable) stored hash.
pub fn verify_password(raw: &str, stored: &str) -> Result<bool, HashError> {
    if stored.is_empty() {
        return Ok(false);
    }

    let parsed = PasswordHash::new(stored)
        .map_err(|err| HashError(format!("invalid hash format: {err}")))?;
    match Argon2::default().verify_password(raw.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(HashError(format!("verify error: {err}"))),
    }
}

fn hash_with_salt(raw: &str, salt: &SaltString) -> Result<String, HashError> {
    Argon2::default()
        .hash_password(raw.as_bytes(), salt)
        .map(|hash| hash.to_string())
        .map_err(|err| HashError(err.to_string()))
}
