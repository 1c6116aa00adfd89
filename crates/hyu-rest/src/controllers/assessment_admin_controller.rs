//! Assessment CMS controller (admin only).

use crate::{
    extractors::{AdminUser, ValidatedJson},
    responses::{created, no_content, ok, ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use hyu_core::{Page, PageRequest};
use hyu_service::{
    AssessmentResponse, CreateAssessmentRequest, PageParams, QuestionRequest, QuestionResponse, RangeRequest,
    RangeResponse, UpdateAssessmentRequest,
};
use tracing::info;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/all", get(list_all))
        .route("/:id", get(get_one).put(update).delete(delete))
        .route("/:id/any", get(get_any))
        .route("/:id/restore", post(restore))
        .route("/:id/questions", get(questions))
        .route("/:id/questions/replace", post(replace_questions))
        .route("/:id/ranges", get(ranges))
        .route("/:id/ranges/replace", post(replace_ranges))
}

#[utoipa::path(
    post,
    path = "/api/admin/assessments",
    tag = "admin-assessments",
    security(("bearer_auth" = [])),
    request_body = CreateAssessmentRequest,
    responses(
        (status = 201, description = "Assessment created", body = AssessmentResponse),
        (status = 409, description = "Duplicate code", body = hyu_core::ErrorResponse)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    admin: AdminUser,
    ValidatedJson(request): ValidatedJson<CreateAssessmentRequest>,
) -> Result<(StatusCode, Json<AssessmentResponse>), AppError> {
    let response = state.assessment_admin_service.create(request).await?;
    info!("Admin {} created assessment {}", admin.id, response.code);
    Ok(created(response))
}

#[utoipa::path(
    put,
    path = "/api/admin/assessments/{id}",
    tag = "admin-assessments",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Assessment id")),
    request_body = UpdateAssessmentRequest,
    responses((status = 200, description = "Assessment updated", body = AssessmentResponse))
)]
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateAssessmentRequest>,
) -> ApiResult<AssessmentResponse> {
    ok(state.assessment_admin_service.update(id, request).await?)
}

/// Paged list excluding deleted rows.
#[utoipa::path(
    get,
    path = "/api/admin/assessments",
    tag = "admin-assessments",
    security(("bearer_auth" = [])),
    params(PageParams),
    responses((status = 200, description = "Page of assessments"))
)]
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Page<AssessmentResponse>> {
    ok(state
        .assessment_admin_service
        .list(page.to_request(PageRequest::DEFAULT_SIZE))
        .await?)
}

/// Paged list including deleted rows.
#[utoipa::path(
    get,
    path = "/api/admin/assessments/all",
    tag = "admin-assessments",
    security(("bearer_auth" = [])),
    params(PageParams),
    responses((status = 200, description = "Page of assessments"))
)]
pub async fn list_all(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Page<AssessmentResponse>> {
    ok(state
        .assessment_admin_service
        .list_all(page.to_request(PageRequest::DEFAULT_SIZE))
        .await?)
}

#[utoipa::path(
    get,
    path = "/api/admin/assessments/{id}",
    tag = "admin-assessments",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Assessment id")),
    responses(
        (status = 200, description = "Assessment", body = AssessmentResponse),
        (status = 404, description = "Missing or deleted", body = hyu_core::ErrorResponse)
    )
)]
pub async fn get_one(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<AssessmentResponse> {
    ok(state.assessment_admin_service.get(id).await?)
}

#[utoipa::path(
    get,
    path = "/api/admin/assessments/{id}/any",
    tag = "admin-assessments",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Assessment id")),
    responses((status = 200, description = "Assessment, deleted or not", body = AssessmentResponse))
)]
pub async fn get_any(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<AssessmentResponse> {
    ok(state.assessment_admin_service.get_any(id).await?)
}

#[utoipa::path(
    delete,
    path = "/api/admin/assessments/{id}",
    tag = "admin-assessments",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Assessment id")),
    responses((status = 204, description = "Archived and marked deleted"))
)]
pub async fn delete(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.assessment_admin_service.delete(id).await?;
    info!("Admin {} deleted assessment {}", admin.id, id);
    Ok(no_content())
}

#[utoipa::path(
    post,
    path = "/api/admin/assessments/{id}/restore",
    tag = "admin-assessments",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Assessment id")),
    responses((status = 200, description = "Restored as active", body = AssessmentResponse))
)]
pub async fn restore(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<AssessmentResponse> {
    ok(state.assessment_admin_service.restore(id).await?)
}

#[utoipa::path(
    get,
    path = "/api/admin/assessments/{id}/questions",
    tag = "admin-assessments",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Assessment id")),
    responses((status = 200, description = "Questions by orderNo", body = [QuestionResponse]))
)]
pub async fn questions(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Vec<QuestionResponse>> {
    ok(state.assessment_admin_service.questions(id).await?)
}

#[utoipa::path(
    post,
    path = "/api/admin/assessments/{id}/questions/replace",
    tag = "admin-assessments",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Assessment id")),
    request_body = [QuestionRequest],
    responses(
        (status = 200, description = "Stored questions", body = [QuestionResponse]),
        (status = 400, description = "Empty list, bad or duplicate orderNo, blank text", body = hyu_core::ErrorResponse)
    )
)]
pub async fn replace_questions(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(questions): Json<Vec<QuestionRequest>>,
) -> ApiResult<Vec<QuestionResponse>> {
    ok(state.assessment_admin_service.replace_questions(id, questions).await?)
}

#[utoipa::path(
    get,
    path = "/api/admin/assessments/{id}/ranges",
    tag = "admin-assessments",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Assessment id")),
    responses((status = 200, description = "Score bands by min", body = [RangeResponse]))
)]
pub async fn ranges(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Vec<RangeResponse>> {
    ok(state.assessment_admin_service.ranges(id).await?)
}

#[utoipa::path(
    post,
    path = "/api/admin/assessments/{id}/ranges/replace",
    tag = "admin-assessments",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Assessment id")),
    request_body = [RangeRequest],
    responses(
        (status = 200, description = "Stored bands", body = [RangeResponse]),
        (status = 400, description = "Inverted or overlapping ranges", body = hyu_core::ErrorResponse)
    )
)]
pub async fn replace_ranges(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(ranges): Json<Vec<RangeRequest>>,
) -> ApiResult<Vec<RangeResponse>> {
    ok(state.assessment_admin_service.replace_ranges(id, ranges).await?)
}
