//! Chat sessions with the assistant.

use crate::{
    extractors::{AuthenticatedUser, ValidatedJson},
    responses::{created, ok, ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use hyu_core::Page;
use hyu_service::{MessageDto, PageParams, SendMessageRequest, SessionDto, MESSAGE_PAGE_SIZE, SESSION_PAGE_SIZE};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(sessions).post(create_session))
        .route("/:id/messages", get(messages).post(send))
}

#[utoipa::path(
    post,
    path = "/api/sessions",
    tag = "chat",
    security(("bearer_auth" = [])),
    responses((status = 201, description = "Session opened", body = SessionDto))
)]
pub async fn create_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<(StatusCode, Json<SessionDto>), AppError> {
    Ok(created(state.chat_service.create_session(user.id).await?))
}

#[utoipa::path(
    get,
    path = "/api/sessions",
    tag = "chat",
    security(("bearer_auth" = [])),
    params(PageParams),
    responses((status = 200, description = "The caller's sessions, most recently active first"))
)]
pub async fn sessions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Page<SessionDto>> {
    ok(state
        .chat_service
        .sessions(user.id, page.to_request(SESSION_PAGE_SIZE))
        .await?)
}

#[utoipa::path(
    get,
    path = "/api/sessions/{id}/messages",
    tag = "chat",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Session id"), PageParams),
    responses(
        (status = 200, description = "Messages in time order"),
        (status = 404, description = "Not the caller's session", body = hyu_core::ErrorResponse)
    )
)]
pub async fn messages(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(page): Query<PageParams>,
) -> ApiResult<Page<MessageDto>> {
    ok(state
        .chat_service
        .messages(user.id, id, page.to_request(MESSAGE_PAGE_SIZE))
        .await?)
}

/// Stores the user's message and returns the assistant reply.
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/messages",
    tag = "chat",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Assistant reply", body = MessageDto),
        (status = 404, description = "Not the caller's session", body = hyu_core::ErrorResponse)
    )
)]
pub async fn send(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<SendMessageRequest>,
) -> ApiResult<MessageDto> {
    ok(state.chat_service.send(user.id, id, request).await?)
}
