// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id password hashing, used by storage seeding and the login path.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::error::SnapbinError;

/// Hash a plaintext password into a PHC-format argon2id string.
pub fn hash_password(plain: &str) -> Result<String, SnapbinError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| SnapbinError::Internal(format!("password hashing failed: {e}")))
}

/// Verify a plaintext password against a stored PHC hash.
///
/// An unparseable hash verifies as false rather than erroring; a corrupt
/// stored hash must not be distinguishable from a wrong password.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
