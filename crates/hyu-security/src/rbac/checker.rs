//! Role checks on authenticated claims.

use crate::Claims;
use hyu_core::{HyuError, HyuResult};
use hyu_domain::Role;

/// Extension trait for role checks on [`Claims`].
pub trait ClaimsExt {
    /// Requires an exact role.
    ///
    /// # Errors
    ///
    /// `Forbidden` when the caller holds another role.
    fn require_role(&self, role: Role) -> HyuResult<()>;

    /// Requires `ROLE_ADMIN`.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins.
    fn require_admin(&self) -> HyuResult<()>;
}

impl ClaimsExt for Claims {
    fn require_role(&self, role: Role) -> HyuResult<()> {
        if self.role() == role {
            Ok(())
        } else {
            Err(HyuError::Forbidden(format!("Required role: {}", role.authority())))
        }
    }

    fn require_admin(&self) -> HyuResult<()> {
        self.require_role(Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: &str) -> Claims {
        Claims {
            sub: "5".to_string(),
            role: role.to_string(),
            email: "x@y.z".to_string(),
            iss: "hyu".to_string(),
            iat: 0,
            exp: 1,
            jti: "j".to_string(),
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(claims("ROLE_ADMIN").require_admin().is_ok());
        let err = claims("ROLE_USER").require_admin().unwrap_err();
        assert_eq!(err.status_code(), 403);
    }
}
