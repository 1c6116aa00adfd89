//! Content reports: filing by users and moderation by admins.

use crate::{
    extractors::{AdminUser, AuthenticatedUser, ValidatedJson},
    responses::{created, ok, ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use hyu_core::Page;
use hyu_service::{
    BulkReviewRequest, CreateReportRequest, ReportCreatedResponse, ReportDetailResponse, ReportListItem,
    ReportListParams, ReviewRequest, UpdatedResponse,
};

/// `/api/reports`
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create))
}

/// `/api/admin/reports`
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(search))
        .route("/bulk", patch(bulk_review))
        .route("/:id", get(detail).patch(review))
}

#[utoipa::path(
    post,
    path = "/api/reports",
    tag = "reports",
    security(("bearer_auth" = [])),
    request_body = CreateReportRequest,
    responses(
        (status = 201, description = "Report filed", body = ReportCreatedResponse),
        (status = 409, description = "Same target reported within 24h", body = hyu_core::ErrorResponse)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateReportRequest>,
) -> Result<(StatusCode, Json<ReportCreatedResponse>), AppError> {
    Ok(created(state.report_service.create(user.id, request).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/reports",
    tag = "admin-reports",
    security(("bearer_auth" = [])),
    params(ReportListParams),
    responses((status = 200, description = "Page of reports, newest first"))
)]
pub async fn search(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<ReportListParams>,
) -> ApiResult<Page<ReportListItem>> {
    ok(state.report_service.search(params).await?)
}

#[utoipa::path(
    get,
    path = "/api/admin/reports/{id}",
    tag = "admin-reports",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report detail", body = ReportDetailResponse),
        (status = 404, description = "Unknown report", body = hyu_core::ErrorResponse)
    )
)]
pub async fn detail(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<ReportDetailResponse> {
    ok(state.report_service.detail(id).await?)
}

#[utoipa::path(
    patch,
    path = "/api/admin/reports/{id}",
    tag = "admin-reports",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Report id")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Report reviewed", body = ReportDetailResponse),
        (status = 400, description = "Invalid status or note", body = hyu_core::ErrorResponse)
    )
)]
pub async fn review(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Json(request): Json<ReviewRequest>,
) -> ApiResult<ReportDetailResponse> {
    ok(state.report_service.review(admin.id, id, request).await?)
}

#[utoipa::path(
    patch,
    path = "/api/admin/reports/bulk",
    tag = "admin-reports",
    security(("bearer_auth" = [])),
    request_body = BulkReviewRequest,
    responses((status = 200, description = "Number of reports updated", body = UpdatedResponse))
)]
pub async fn bulk_review(
    State(state): State<AppState>,
    admin: AdminUser,
    ValidatedJson(request): ValidatedJson<BulkReviewRequest>,
) -> ApiResult<UpdatedResponse> {
    ok(state.report_service.bulk_review(admin.id, request).await?)
}
