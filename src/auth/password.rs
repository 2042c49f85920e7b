// Password and PIN hashing (Argon2id)

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use crate::auth::error::AuthError;

/// Outcome of checking a credential against its stored form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Matched an Argon2 hash
    Valid,
    /// Matched a legacy plain-text value; caller should re-hash it
    ValidLegacy,
    Invalid,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Verification::Invalid)
    }
}

/// Password service for hashing and verification
pub struct PasswordService;

impl PasswordService {
    /// Hash a password or PIN using Argon2id with a random salt
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::PasswordHashError)
    }

    /// Whether a stored credential is already in PHC hash form
    pub fn is_hashed(stored: &str) -> bool {
        stored.starts_with("$argon2")
    }

    /// Verify a candidate against a stored credential
    ///
    /// Rows seeded by hand may hold plain text. Those are compared directly
    /// and reported as `ValidLegacy` so the caller can upgrade them.
    pub fn verify(candidate: &str, stored: &str) -> Verification {
        if stored.is_empty() {
            return Verification::Invalid;
        }

        if !Self::is_hashed(stored) {
            return if constant_time_eq(candidate.as_bytes(), stored.as_bytes()) {
                Verification::ValidLegacy
            } else {
                Verification::Invalid
            };
        }

        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Stored credential is not a valid PHC string: {}", e);
                return Verification::Invalid;
            }
        };

        match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Verification::Valid,
            Err(_) => Verification::Invalid,
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
