//! Token digests and random secrets.
//!
//! Refresh and password-reset tokens are only ever stored as digests.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

/// SHA-256 of the input, URL-safe base64 without padding.
#[must_use]
pub fn sha256_b64url(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// `len` random bytes, URL-safe base64 without padding.
#[must_use]
pub fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_is_stable() {
        assert_eq!(sha256_b64url("abc"), "ungWv48Bz-pBQUDeXa4iI7ADYaOWF3qctBD_YfIAFa0");
        assert_ne!(sha256_b64url("abc"), sha256_b64url("abd"));
    }

    #[test]
    fn test_random_token_length() {
        // 48 bytes encode to 64 characters without padding
        let token = random_token(48);
        assert_eq!(token.len(), 64);
        assert!(!token.contains('='));
        assert_ne!(token, random_token(48));
    }
}
