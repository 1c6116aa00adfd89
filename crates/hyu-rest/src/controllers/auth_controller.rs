//! Authentication controller.
//!
//! The refresh token travels in an HttpOnly cookie; clients without cookie
//! support may send it in `X-Refresh-Token` instead.

use crate::{
    extractors::{ClientIp, OptionalUser, RefreshTokenHeader, ValidatedJson},
    responses::{no_content, ok, ApiResult, AppError},
    state::{AppState, CookieSettings},
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use hyu_core::HyuError;
use hyu_service::{
    IssuedTokens, LoginRequest, MessageResponse, PasswordResetConfirmRequest, SignupRequest, SignupResponse,
    TokenResponse,
};
use serde::Deserialize;
use tracing::debug;
use utoipa::IntoParams;

/// Creates the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/password-reset/confirm", post(confirm_password_reset))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LogoutParams {
    #[serde(default)]
    pub all_devices: bool,
}

/// Builds the refresh cookie; `max_age_secs == 0` expires it.
pub(crate) fn refresh_cookie(settings: &CookieSettings, value: String, max_age_secs: u64) -> Cookie<'static> {
    let max_age = time::Duration::seconds(i64::try_from(max_age_secs).unwrap_or(i64::MAX));
    let mut builder = Cookie::build((settings.name.clone(), value))
        .http_only(true)
        .path("/")
        .max_age(max_age)
        .secure(settings.secure)
        .same_site(if settings.secure { SameSite::None } else { SameSite::Lax });
    if let Some(domain) = &settings.domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}

fn with_refresh_cookie(jar: CookieJar, settings: &CookieSettings, issued: IssuedTokens) -> (CookieJar, Json<TokenResponse>) {
    let cookie = refresh_cookie(settings, issued.refresh_token, issued.refresh_ttl_secs);
    (jar.add(cookie), Json(issued.response))
}

/// Register a new account.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Invalid input", body = hyu_core::ErrorResponse),
        (status = 409, description = "Email already registered", body = hyu_core::ErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    debug!("Signup request for: {}", request.email);
    let response = state.auth_service.signup(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with email and password.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token issued, refresh cookie set", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = hyu_core::ErrorResponse),
        (status = 403, description = "Account suspended or withdrawn", body = hyu_core::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    jar: CookieJar,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    debug!("Login request for: {}", request.email);
    let issued = state.auth_service.login(request, ip).await?;
    Ok(with_refresh_cookie(jar, &state.cookies, issued))
}

/// Rotate the refresh token and issue a new access token.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "auth",
    params(("X-Refresh-Token" = Option<String>, Header, description = "Refresh token when no cookie is sent")),
    responses(
        (status = 200, description = "New token pair issued", body = TokenResponse),
        (status = 401, description = "Missing or unknown refresh token", body = hyu_core::ErrorResponse)
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    RefreshTokenHeader(header): RefreshTokenHeader,
    jar: CookieJar,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let token = header
        .or_else(|| jar.get(&state.cookies.name).map(|c| c.value().to_string()))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| HyuError::unauthorized("Missing refresh token"))?;
    let issued = state.auth_service.refresh(&token).await?;
    Ok(with_refresh_cookie(jar, &state.cookies, issued))
}

/// Revoke the refresh token and blacklist the presented access token.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    params(LogoutParams),
    responses((status = 204, description = "Logged out, refresh cookie expired"))
)]
pub async fn logout(
    State(state): State<AppState>,
    Query(params): Query<LogoutParams>,
    user: OptionalUser,
    RefreshTokenHeader(header): RefreshTokenHeader,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), AppError> {
    let token = header.or_else(|| jar.get(&state.cookies.name).map(|c| c.value().to_string()));
    state
        .auth_service
        .logout(token, user.into_claims(), params.all_devices)
        .await?;
    let expired = refresh_cookie(&state.cookies, String::new(), 0);
    Ok((jar.add(expired), no_content()))
}

/// Set a new password with an admin-issued reset token.
#[utoipa::path(
    post,
    path = "/api/auth/password-reset/confirm",
    tag = "auth",
    request_body = PasswordResetConfirmRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Token invalid or expired", body = hyu_core::ErrorResponse)
    )
)]
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<PasswordResetConfirmRequest>,
) -> ApiResult<MessageResponse> {
    ok(state.auth_service.confirm_password_reset(request).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_cookie_attributes() {
        let settings = CookieSettings {
            name: "RT".to_string(),
            secure: true,
            domain: Some("hyu.app".to_string()),
            max_age_secs: 60,
        };
        let cookie = refresh_cookie(&settings, "rt.abc".to_string(), 60);
        assert_eq!(cookie.name(), "RT");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("hyu.app"));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(60)));
    }

    #[test]
    fn test_insecure_cookie_is_lax() {
        let settings = CookieSettings {
            secure: false,
            domain: None,
            ..CookieSettings::default()
        };
        let cookie = refresh_cookie(&settings, String::new(), 0);
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert!(cookie.domain().is_none());
    }
}
