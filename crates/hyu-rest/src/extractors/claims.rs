//! JWT claims extractors.
//!
//! The auth middleware validates the bearer token and leaves the claims in
//! the request extensions; these extractors only read them back.

use crate::responses::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use hyu_core::HyuError;
use hyu_security::{Claims, ClaimsExt};

/// The caller of a route that requires a valid access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub claims: Claims,
}

impl std::ops::Deref for AuthenticatedUser {
    type Target = Claims;

    fn deref(&self) -> &Self::Target {
        &self.claims
    }
}

fn claims_from(parts: &Parts) -> Result<AuthenticatedUser, AppError> {
    let claims = parts
        .extensions
        .get::<Claims>()
        .cloned()
        .ok_or_else(|| HyuError::unauthorized("Missing or invalid access token"))?;
    let id = claims.user_id()?;
    Ok(AuthenticatedUser { id, claims })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        claims_from(parts)
    }
}

/// An authenticated caller holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl std::ops::Deref for AdminUser {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = claims_from(parts)?;
        user.claims.require_admin()?;
        Ok(AdminUser(user))
    }
}

/// Optional authenticated user extractor.
///
/// Returns `None` if no valid token is present, instead of failing.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthenticatedUser>);

impl OptionalUser {
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }

    #[must_use]
    pub fn into_claims(self) -> Option<Claims> {
        self.0.map(|u| u.claims)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(claims_from(parts).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn claims(sub: &str, role: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            email: "a@b.c".to_string(),
            iss: "hyu".to_string(),
            iat: 0,
            exp: 1,
            jti: "jti".to_string(),
        }
    }

    fn parts_with(claims: Option<Claims>) -> Parts {
        let mut request = Request::new(());
        if let Some(claims) = claims {
            request.extensions_mut().insert(claims);
        }
        request.into_parts().0
    }

    #[tokio::test]
    async fn test_authenticated_user_requires_claims() {
        let mut parts = parts_with(None);
        let err = AuthenticatedUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.0.status_code(), 401);

        let mut parts = parts_with(Some(claims("12", "ROLE_USER")));
        let user = AuthenticatedUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.id, 12);
    }

    #[tokio::test]
    async fn test_admin_user_checks_role() {
        let mut parts = parts_with(Some(claims("3", "ROLE_USER")));
        let err = AdminUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.0.status_code(), 403);

        let mut parts = parts_with(Some(claims("3", "ROLE_ADMIN")));
        assert_eq!(AdminUser::from_request_parts(&mut parts, &()).await.unwrap().id, 3);
    }

    #[tokio::test]
    async fn test_optional_user() {
        let mut parts = parts_with(None);
        let user = OptionalUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.id(), None);
    }
}
