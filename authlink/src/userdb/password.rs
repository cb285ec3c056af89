use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

use crate::utils::gen_random_bytes;

use super::errors::UserError;
use super::types::User;

/// Hash a plaintext password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, UserError> {
    let salt_bytes = gen_random_bytes(16).map_err(|e| UserError::PasswordHash(e.to_string()))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| UserError::PasswordHash(e.to_string()))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| UserError::PasswordHash(e.to_string()))?
        .to_string();
    Ok(phc)
}

fn verify_password(phc: &str, password: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is not a valid PHC string: {}", e);
            false
        }
    }
}

impl User {
    /// False when the account has no password or the candidate does not match.
    pub fn compare_password(&self, candidate: &str) -> bool {
        self.password
            .as_deref()
            .is_some_and(|phc| verify_password(phc, candidate))
    }

    pub fn set_password(&mut self, password: &str) -> Result<(), UserError> {
        self.password = Some(hash_password(password)?);
        Ok(())
    }
}
