//! User management for admins.

use crate::{
    extractors::{AdminUser, ValidatedJson},
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Router,
};
use hyu_core::Page;
use hyu_service::{AdminUserItem, AdminUserParams, ChangeStateRequest, MessageResponse};
use tracing::info;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search))
        .route("/:id/state", patch(change_state))
        .route("/:id/password-reset", post(issue_password_reset))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin-users",
    security(("bearer_auth" = [])),
    params(AdminUserParams),
    responses((status = 200, description = "Page of users, newest first"))
)]
pub async fn search(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<AdminUserParams>,
) -> ApiResult<Page<AdminUserItem>> {
    ok(state.admin_user_service.search(params).await?)
}

/// Suspends or reactivates an account.
#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/state",
    tag = "admin-users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    request_body = ChangeStateRequest,
    responses(
        (status = 200, description = "State changed", body = AdminUserItem),
        (status = 400, description = "Unknown state or period", body = hyu_core::ErrorResponse)
    )
)]
pub async fn change_state(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<ChangeStateRequest>,
) -> ApiResult<AdminUserItem> {
    let item = state.admin_user_service.change_state(admin.id, id, request).await?;
    info!("Admin {} set user {} to {:?}", admin.id, id, item.state);
    ok(item)
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/password-reset",
    tag = "admin-users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Reset link sent", body = MessageResponse),
        (status = 409, description = "Account not eligible or reset issued too recently", body = hyu_core::ErrorResponse)
    )
)]
pub async fn issue_password_reset(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<MessageResponse> {
    ok(state.admin_user_service.issue_password_reset(admin.id, id).await?)
}
