//! Authentication middleware.

use crate::responses::AppError;
use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use hyu_core::HyuError;
use hyu_service::AuthService;
use std::sync::Arc;
use tracing::debug;

/// Authentication middleware state.
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub auth_service: Arc<dyn AuthService>,
}

impl AuthMiddlewareState {
    pub fn new(auth_service: Arc<dyn AuthService>) -> Self {
        Self { auth_service }
    }
}

/// Returns the token of a `Bearer` authorization header.
pub fn bearer_token<B>(request: &Request<B>) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Validates the bearer token and applies the account-state guard.
///
/// A valid token puts its claims into the request extensions. An invalid
/// one is ignored; routes that need a caller reject the request themselves.
/// Suspended and withdrawn accounts are stopped here with 403.
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let claims = match bearer_token(&request) {
        Some(token) => match state.auth_service.authenticate(token).await {
            Ok(claims) => Some(claims),
            Err(e) => {
                debug!("Token validation failed: {}", e);
                None
            }
        },
        None => None,
    };

    if let Some(claims) = claims {
        let guard = match claims.user_id() {
            Ok(user_id) => state.auth_service.ensure_active(user_id).await,
            Err(e) => Err(e),
        };
        match guard {
            Ok(()) => {
                debug!("Authenticated user: {}", claims.sub);
                request.extensions_mut().insert(claims);
            }
            Err(e @ (HyuError::AccountSuspended | HyuError::AccountWithdrawn)) => {
                debug!("Blocked request from user {}: {}", claims.sub, e);
                return AppError(e).into_response();
            }
            Err(e) => {
                debug!("Ignoring token of user {}: {}", claims.sub, e);
            }
        }
    }

    next.run(request).await
}
