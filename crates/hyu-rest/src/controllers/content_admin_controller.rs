//! Healing-content CMS controller (admin only).

use crate::{
    extractors::{AdminUser, ValidatedJson},
    responses::{created, no_content, ok, ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use hyu_core::Page;
use hyu_service::{ContentListParams, ContentResponse, CreateContentRequest, UpdateContentRequest};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search).post(create))
        .route("/:id", get(get_one).put(update).delete(delete))
        .route("/:id/visibility", patch(set_visibility))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VisibilityParams {
    /// `PUBLIC` or `PRIVATE`.
    pub value: String,
}

#[utoipa::path(
    post,
    path = "/api/admin/cms-contents",
    tag = "admin-contents",
    security(("bearer_auth" = [])),
    request_body = CreateContentRequest,
    responses((status = 201, description = "Content created", body = ContentResponse))
)]
pub async fn create(
    State(state): State<AppState>,
    admin: AdminUser,
    ValidatedJson(request): ValidatedJson<CreateContentRequest>,
) -> Result<(StatusCode, Json<ContentResponse>), AppError> {
    Ok(created(state.content_service.create(admin.id, request).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/cms-contents/{id}",
    tag = "admin-contents",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Content id")),
    responses((status = 200, description = "Content, deleted or not", body = ContentResponse))
)]
pub async fn get_one(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<ContentResponse> {
    ok(state.content_service.get(id).await?)
}

#[utoipa::path(
    get,
    path = "/api/admin/cms-contents",
    tag = "admin-contents",
    security(("bearer_auth" = [])),
    params(ContentListParams),
    responses((status = 200, description = "Page of contents"))
)]
pub async fn search(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<ContentListParams>,
) -> ApiResult<Page<ContentResponse>> {
    ok(state.content_service.search(params).await?)
}

#[utoipa::path(
    put,
    path = "/api/admin/cms-contents/{id}",
    tag = "admin-contents",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Content id")),
    request_body = UpdateContentRequest,
    responses((status = 200, description = "Content updated", body = ContentResponse))
)]
pub async fn update(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateContentRequest>,
) -> ApiResult<ContentResponse> {
    ok(state.content_service.update(admin.id, id, request).await?)
}

#[utoipa::path(
    patch,
    path = "/api/admin/cms-contents/{id}/visibility",
    tag = "admin-contents",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Content id"), VisibilityParams),
    responses(
        (status = 200, description = "Visibility changed", body = ContentResponse),
        (status = 400, description = "Unknown visibility", body = hyu_core::ErrorResponse)
    )
)]
pub async fn set_visibility(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Query(params): Query<VisibilityParams>,
) -> ApiResult<ContentResponse> {
    ok(state.content_service.set_visibility(admin.id, id, &params.value).await?)
}

#[utoipa::path(
    delete,
    path = "/api/admin/cms-contents/{id}",
    tag = "admin-contents",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Content id")),
    responses((status = 204, description = "Soft deleted"))
)]
pub async fn delete(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.content_service.delete(admin.id, id).await?;
    info!("Admin {} deleted content {}", admin.id, id);
    Ok(no_content())
}
