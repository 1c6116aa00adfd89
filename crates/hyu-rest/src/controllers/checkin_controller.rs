//! Daily check-in controller.

use crate::{
    extractors::AuthenticatedUser,
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use hyu_service::{CheckinRequest, CheckinResponse, CheckinStatsResponse, DayRangeParams, TodayResponse};
use serde::Deserialize;
use utoipa::IntoParams;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(check_in))
        .route("/today", get(today))
        .route("/stats", get(stats))
        .route("/stats/month", get(month_stats))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthParams {
    /// `YYYY-MM`; the current KST month when absent.
    pub month: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/checkins/today",
    tag = "checkins",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Today's check-in state", body = TodayResponse))
)]
pub async fn today(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<TodayResponse> {
    ok(state.checkin_service.today(user.id).await?)
}

#[utoipa::path(
    post,
    path = "/api/checkins",
    tag = "checkins",
    security(("bearer_auth" = [])),
    request_body = CheckinRequest,
    responses((status = 200, description = "Check-in stored; created is false on repeat", body = CheckinResponse))
)]
pub async fn check_in(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CheckinRequest>,
) -> ApiResult<CheckinResponse> {
    ok(state.checkin_service.check_in(user.id, request).await?)
}

#[utoipa::path(
    get,
    path = "/api/checkins/stats",
    tag = "checkins",
    security(("bearer_auth" = [])),
    params(DayRangeParams),
    responses(
        (status = 200, description = "Per-day check-ins over the range", body = CheckinStatsResponse),
        (status = 400, description = "from is after to", body = hyu_core::ErrorResponse)
    )
)]
pub async fn stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(range): Query<DayRangeParams>,
) -> ApiResult<CheckinStatsResponse> {
    ok(state.checkin_service.stats(user.id, range.from, range.to).await?)
}

#[utoipa::path(
    get,
    path = "/api/checkins/stats/month",
    tag = "checkins",
    security(("bearer_auth" = [])),
    params(MonthParams),
    responses(
        (status = 200, description = "Per-day check-ins over the month", body = CheckinStatsResponse),
        (status = 400, description = "Bad month format", body = hyu_core::ErrorResponse)
    )
)]
pub async fn month_stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<MonthParams>,
) -> ApiResult<CheckinStatsResponse> {
    ok(state.checkin_service.month_stats(user.id, params.month).await?)
}
