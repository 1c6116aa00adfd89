//! The caller's profile and chat overview.

use crate::{
    extractors::{AuthenticatedUser, ValidatedJson},
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use hyu_service::{MessageDto, ProfileResponse, RecentChatParams, SessionPreview, UpdateProfileRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_profile).put(update_profile))
        .route("/chat/recent", get(recent_chat))
        .route("/chat/sessions", get(chat_sessions))
}

#[utoipa::path(
    get,
    path = "/api/profiles/me",
    tag = "profile",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Profile, created with defaults on first read", body = ProfileResponse))
)]
pub async fn get_profile(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<ProfileResponse> {
    ok(state.profile_service.get_or_create(user.id).await?)
}

#[utoipa::path(
    put,
    path = "/api/profiles/me",
    tag = "profile",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile saved", body = ProfileResponse),
        (status = 400, description = "Invalid field", body = hyu_core::ErrorResponse)
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<ProfileResponse> {
    ok(state.profile_service.update(user.id, request).await?)
}

#[utoipa::path(
    get,
    path = "/api/profiles/me/chat/recent",
    tag = "profile",
    security(("bearer_auth" = [])),
    params(RecentChatParams),
    responses((status = 200, description = "Latest user and assistant messages", body = [MessageDto]))
)]
pub async fn recent_chat(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<RecentChatParams>,
) -> ApiResult<Vec<MessageDto>> {
    ok(state.profile_service.recent_chat(user.id, params.limit).await?)
}

#[utoipa::path(
    get,
    path = "/api/profiles/me/chat/sessions",
    tag = "profile",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Sessions with their latest message", body = [SessionPreview]))
)]
pub async fn chat_sessions(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<Vec<SessionPreview>> {
    ok(state.profile_service.chat_sessions(user.id).await?)
}
