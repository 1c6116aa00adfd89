//! Personal goals and their daily check-ins.

use crate::{
    extractors::{AuthenticatedUser, ValidatedJson},
    responses::{created, no_content, ok, ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::NaiveDate;
use hyu_core::Slice;
use hyu_service::{
    CreateGoalRequest, GoalCheckinResponse, GoalResponse, PageParams, UpdateGoalRequest, GOAL_PAGE_SIZE,
};
use serde::Deserialize;
use utoipa::IntoParams;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).put(update).delete(delete))
        .route("/:id/alert", patch(set_alert))
        .route("/:id/checkin", post(check_in).delete(uncheck))
        .route("/:id/checkins", get(checkins))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AlertParams {
    pub enabled: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CheckinRangeParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[utoipa::path(
    post,
    path = "/api/goals",
    tag = "goals",
    security(("bearer_auth" = [])),
    request_body = CreateGoalRequest,
    responses(
        (status = 201, description = "Goal created", body = GoalResponse),
        (status = 400, description = "End date before start date", body = hyu_core::ErrorResponse)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateGoalRequest>,
) -> Result<(StatusCode, Json<GoalResponse>), AppError> {
    Ok(created(state.goal_service.create(user.id, request).await?))
}

/// Goals due today first, then checked ones, then those out of period.
#[utoipa::path(
    get,
    path = "/api/goals",
    tag = "goals",
    security(("bearer_auth" = [])),
    params(PageParams),
    responses((status = 200, description = "Slice of goals"))
)]
pub async fn list(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Slice<GoalResponse>> {
    ok(state.goal_service.list(user.id, page.to_request(GOAL_PAGE_SIZE)).await?)
}

#[utoipa::path(
    get,
    path = "/api/goals/{id}",
    tag = "goals",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Goal id")),
    responses(
        (status = 200, description = "Goal", body = GoalResponse),
        (status = 404, description = "Not the caller's goal", body = hyu_core::ErrorResponse)
    )
)]
pub async fn get_one(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> ApiResult<GoalResponse> {
    ok(state.goal_service.get(user.id, id).await?)
}

#[utoipa::path(
    put,
    path = "/api/goals/{id}",
    tag = "goals",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Goal id")),
    request_body = UpdateGoalRequest,
    responses((status = 200, description = "Goal updated", body = GoalResponse))
)]
pub async fn update(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateGoalRequest>,
) -> ApiResult<GoalResponse> {
    ok(state.goal_service.update(user.id, id, request).await?)
}

#[utoipa::path(
    delete,
    path = "/api/goals/{id}",
    tag = "goals",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Goal id")),
    responses((status = 204, description = "Goal deleted"))
)]
pub async fn delete(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.goal_service.delete(user.id, id).await?;
    Ok(no_content())
}

#[utoipa::path(
    patch,
    path = "/api/goals/{id}/alert",
    tag = "goals",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Goal id"), AlertParams),
    responses((status = 200, description = "Alert flag changed", body = GoalResponse))
)]
pub async fn set_alert(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Query(params): Query<AlertParams>,
) -> ApiResult<GoalResponse> {
    ok(state.goal_service.set_alert(user.id, id, params.enabled).await?)
}

#[utoipa::path(
    post,
    path = "/api/goals/{id}/checkin",
    tag = "goals",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Goal id")),
    responses(
        (status = 200, description = "Checked for today", body = GoalCheckinResponse),
        (status = 400, description = "Today is outside the goal period", body = hyu_core::ErrorResponse)
    )
)]
pub async fn check_in(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> ApiResult<GoalCheckinResponse> {
    ok(state.goal_service.check_in(user.id, id).await?)
}

#[utoipa::path(
    delete,
    path = "/api/goals/{id}/checkin",
    tag = "goals",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Goal id")),
    responses((status = 204, description = "Today's check-in removed"))
)]
pub async fn uncheck(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.goal_service.uncheck(user.id, id).await?;
    Ok(no_content())
}

#[utoipa::path(
    get,
    path = "/api/goals/{id}/checkins",
    tag = "goals",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Goal id"), CheckinRangeParams),
    responses((status = 200, description = "Checked dates", body = [NaiveDate]))
)]
pub async fn checkins(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Query(range): Query<CheckinRangeParams>,
) -> ApiResult<Vec<NaiveDate>> {
    ok(state.goal_service.checkins(user.id, id, range.from, range.to).await?)
}
