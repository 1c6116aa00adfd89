//! Password hashing using Argon2id.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2, Params,
};
use hyu_core::{HyuError, HyuResult, Interface};
use shaku::Component;
use std::sync::Arc;
use tracing::debug;

/// Interface for password hashing operations.
pub trait PasswordHasherInterface: Interface + Send + Sync {
    /// Hashes a password into a PHC string.
    ///
    /// # Errors
    ///
    /// `Internal` when hashing fails.
    fn hash(&self, password: &str) -> HyuResult<String>;

    /// Verifies a password against a stored PHC string.
    ///
    /// # Errors
    ///
    /// `Internal` when the stored hash cannot be parsed.
    fn verify(&self, password: &str, hash: &str) -> HyuResult<bool>;
}

/// Argon2id password hasher.
#[derive(Component, Clone)]
#[shaku(interface = PasswordHasherInterface)]
pub struct PasswordHasher {
    argon2: Arc<Argon2<'static>>,
}

impl PasswordHasher {
    /// Hasher with the argon2 default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(Params::DEFAULT)
    }

    #[must_use]
    pub fn with_params(params: Params) -> Self {
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
        Self {
            argon2: Arc::new(argon2),
        }
    }

    /// Hasher with the given time cost (iterations) and default memory.
    #[must_use]
    pub fn with_cost(time_cost: u32) -> Self {
        let params = Params::new(Params::DEFAULT_M_COST, time_cost.max(1), Params::DEFAULT_P_COST, None)
            .unwrap_or(Params::DEFAULT);
        Self::with_params(params)
    }

    /// Shaku parameters for a hasher with the given time cost.
    #[must_use]
    pub fn parameters(time_cost: u32) -> PasswordHasherParameters {
        PasswordHasherParameters {
            argon2: Self::with_cost(time_cost).argon2,
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasherInterface for PasswordHasher {
    fn hash(&self, password: &str) -> HyuResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| HyuError::Internal(format!("Failed to hash password: {e}")))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> HyuResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| HyuError::Internal(format!("Invalid password hash format: {e}")))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                debug!("Password verification failed");
                Ok(false)
            }
            Err(e) => Err(HyuError::Internal(format!("Password verification error: {e}"))),
        }
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::with_cost(1);
        let hash = hasher.hash("correct horse battery").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse battery", &hash).unwrap());
        assert!(!hasher.verify("wrong horse battery", &hash).unwrap());
    }

    #[test]
    fn test_salted_hashes_differ() {
        let hasher = PasswordHasher::with_cost(1);
        let first = hasher.hash("password1").unwrap();
        let second = hasher.hash("password1").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_invalid_stored_hash() {
        let hasher = PasswordHasher::with_cost(1);
        assert!(hasher.verify("password1", "plaintext").is_err());
    }

    #[test]
    fn test_verifies_across_cost_settings() {
        let hash = PasswordHasher::with_cost(1).hash("password1").unwrap();
        assert!(PasswordHasher::with_cost(3).verify("password1", &hash).unwrap());
    }
}
