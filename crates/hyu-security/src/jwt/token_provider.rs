//! JWT token provider for creating and validating access tokens.

use super::Claims;
use crate::digest::random_token;
use chrono::{Duration, Utc};
use hyu_config::SecurityConfig;
use hyu_core::{HyuError, HyuResult, Interface};
use hyu_domain::Role;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use shaku::Component;
use tracing::{debug, warn};

/// An issued access token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub jti: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

/// Interface for access-token operations.
pub trait TokenProviderInterface: Interface + Send + Sync {
    /// Issues an access token for a user.
    ///
    /// # Errors
    ///
    /// `Internal` when signing fails.
    fn issue(&self, user_id: i64, role: Role, email: &str) -> HyuResult<AccessToken>;

    /// Validates signature and expiry and returns the claims.
    ///
    /// # Errors
    ///
    /// `TokenExpired` or `InvalidToken`.
    fn validate(&self, token: &str) -> HyuResult<Claims>;
}

/// HS256 token provider.
#[derive(Component, Clone)]
#[shaku(interface = TokenProviderInterface)]
pub struct TokenProvider {
    secret: String,
    issuer: String,
    access_ttl_secs: u64,
}

impl TokenProvider {
    #[must_use]
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            issuer: config.jwt_issuer.clone(),
            access_ttl_secs: config.jwt_access_expiration_secs,
        }
    }

    /// Shaku parameters equivalent to [`TokenProvider::new`].
    #[must_use]
    pub fn parameters(config: &SecurityConfig) -> TokenProviderParameters {
        TokenProviderParameters {
            secret: config.jwt_secret.clone(),
            issuer: config.jwt_issuer.clone(),
            access_ttl_secs: config.jwt_access_expiration_secs,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation
    }
}

impl TokenProviderInterface for TokenProvider {
    fn issue(&self, user_id: i64, role: Role, email: &str) -> HyuResult<AccessToken> {
        let now = Utc::now();
        let ttl = i64::try_from(self.access_ttl_secs).unwrap_or(i64::MAX / 2);
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.authority().to_string(),
            email: email.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl)).timestamp(),
            jti: random_token(16),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| HyuError::Internal(format!("Failed to generate access token: {e}")))?;

        debug!("Generated access token for user {}", user_id);
        Ok(AccessToken {
            token,
            jti: claims.jti,
            expires_in: self.access_ttl_secs,
        })
    }

    fn validate(&self, token: &str) -> HyuResult<Claims> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &self.validation(),
        )
        .map_err(|e| {
            warn!("Token validation failed: {}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => HyuError::TokenExpired,
                ErrorKind::InvalidSignature => HyuError::InvalidToken("Invalid token signature".to_string()),
                ErrorKind::InvalidIssuer => HyuError::InvalidToken("Invalid token issuer".to_string()),
                _ => HyuError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("issuer", &self.issuer)
            .field("access_ttl_secs", &self.access_ttl_secs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(secret: &str) -> TokenProvider {
        let config = SecurityConfig {
            jwt_secret: secret.to_string(),
            ..Default::default()
        };
        TokenProvider::new(&config)
    }

    #[test]
    fn test_issue_and_validate() {
        let provider = provider("test-secret-key-for-testing-only-0001");
        let access = provider.issue(7, Role::Admin, "admin@example.com").unwrap();
        assert_eq!(access.expires_in, 3600);

        let claims = provider.validate(&access.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), 7);
        assert_eq!(claims.role, "ROLE_ADMIN");
        assert_eq!(claims.email, "admin@example.com");
        assert_eq!(claims.jti, access.jti);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let issuer = provider("first-secret-key-for-testing-only-0001");
        let other = provider("other-secret-key-for-testing-only-0002");
        let access = issuer.issue(1, Role::User, "u@example.com").unwrap();
        assert!(matches!(other.validate(&access.token), Err(HyuError::InvalidToken(_))));
    }

    #[test]
    fn test_rejects_expired() {
        let secret = "expiry-secret-key-for-testing-only-001";
        let claims = Claims {
            sub: "1".to_string(),
            role: "ROLE_USER".to_string(),
            email: "u@example.com".to_string(),
            iss: "hyu".to_string(),
            iat: 1_000,
            exp: 2_000,
            jti: "x".to_string(),
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap();
        assert!(matches!(provider(secret).validate(&token), Err(HyuError::TokenExpired)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(provider("garbage-secret-key-for-testing-only-01").validate("not.a.jwt").is_err());
    }
}
