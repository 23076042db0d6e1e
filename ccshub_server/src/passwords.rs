//! Password hashing for local user and admin accounts (Argon2id, PHC string format).
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use log::*;

use crate::errors::ServerError;

pub fn hash_password(password: &str) -> Result<String, ServerError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ServerError::BackendError(format!("Could not hash password. {e}")))
}

/// Returns `false` for a wrong password, and also for stored values that are not password hashes (such as the
/// `N/A` placeholder on accounts created through external login).
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(h) => h,
        Err(e) => {
            debug!("🔐️ Stored password is not a valid hash. {e}");
            return false;
        },
    };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}
