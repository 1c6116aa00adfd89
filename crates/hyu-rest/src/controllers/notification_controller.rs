//! In-app notifications.

use crate::{
    extractors::AuthenticatedUser,
    responses::{no_content, ok, ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Router,
};
use hyu_core::Slice;
use hyu_service::{CountResponse, NotificationDto, PageParams, UpdatedResponse, NOTIFICATION_PAGE_SIZE};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/unread-count", get(unread_count))
        .route("/read-all", patch(mark_all_read))
        .route("/:id/read", patch(mark_read))
}

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "notifications",
    security(("bearer_auth" = [])),
    params(PageParams),
    responses((status = 200, description = "Slice of notifications, newest first"))
)]
pub async fn list(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Slice<NotificationDto>> {
    ok(state
        .notification_service
        .list(user.id, page.to_request(NOTIFICATION_PAGE_SIZE))
        .await?)
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Unread count", body = CountResponse))
)]
pub async fn unread_count(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<CountResponse> {
    ok(state.notification_service.unread_count(user.id).await?)
}

#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    tag = "notifications",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Marked read"),
        (status = 403, description = "Not the caller's notification", body = hyu_core::ErrorResponse)
    )
)]
pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.notification_service.mark_read(user.id, id).await?;
    Ok(no_content())
}

#[utoipa::path(
    patch,
    path = "/api/notifications/read-all",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Number marked read", body = UpdatedResponse))
)]
pub async fn mark_all_read(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<UpdatedResponse> {
    ok(state.notification_service.mark_all_read(user.id).await?)
}
