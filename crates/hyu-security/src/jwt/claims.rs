//! JWT claims structure.

use chrono::{DateTime, Utc};
use hyu_core::{HyuError, HyuResult};
use hyu_domain::Role;
use serde::{Deserialize, Serialize};

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (numeric user id as a string).
    pub sub: String,

    /// Authority, `ROLE_USER` or `ROLE_ADMIN`.
    pub role: String,

    pub email: String,

    /// Issuer.
    pub iss: String,

    /// Issued at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,

    /// Token id, used for logout blacklisting.
    pub jti: String,
}

impl Claims {
    /// Numeric user id from the subject.
    ///
    /// # Errors
    ///
    /// `InvalidToken` when the subject is not numeric.
    pub fn user_id(&self) -> HyuResult<i64> {
        self.sub
            .parse()
            .map_err(|_| HyuError::InvalidToken("Subject is not a user id".to_string()))
    }

    /// Role parsed from the authority claim. Unknown authorities map to `User`.
    #[must_use]
    pub fn role(&self) -> Role {
        Role::from_authority(&self.role).unwrap_or(Role::User)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    /// Seconds until expiry, never negative.
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from(self.exp - now.timestamp()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, role: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            email: "a@b.c".to_string(),
            iss: "hyu".to_string(),
            iat: 0,
            exp: 100,
            jti: "j".to_string(),
        }
    }

    #[test]
    fn test_user_id() {
        assert_eq!(claims("42", "ROLE_USER").user_id().unwrap(), 42);
        assert!(claims("abc", "ROLE_USER").user_id().is_err());
    }

    #[test]
    fn test_role() {
        assert!(claims("1", "ROLE_ADMIN").is_admin());
        assert_eq!(claims("1", "ROLE_GUEST").role(), Role::User);
    }

    #[test]
    fn test_remaining_secs() {
        let c = claims("1", "ROLE_USER");
        let at = DateTime::from_timestamp(40, 0).unwrap();
        assert_eq!(c.remaining_secs(at), 60);
        let late = DateTime::from_timestamp(400, 0).unwrap();
        assert_eq!(c.remaining_secs(late), 0);
    }
}
