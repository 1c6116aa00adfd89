//! KPI dashboards and manual recomputation (admin only).

use crate::{
    extractors::AdminUser,
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use hyu_service::{
    CohortRangeParams, DailyMetricsResponse, DayRangeParams, MessageResponse, MonthRangeParams,
    MonthlyMetricsResponse, RetentionMatrixRow, RetentionResponse, RiskTimelinePoint, SummaryResponse,
    YearRangeParams, YearlyMetricsResponse,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/daily", get(daily))
        .route("/monthly", get(monthly))
        .route("/yearly", get(yearly))
        .route("/risk-timeline", get(risk_timeline))
        .route("/retention", get(retention))
        .route("/retention/matrix", get(retention_matrix))
        .route("/summary", get(summary))
        .route("/recompute/daily", post(recompute_daily))
        .route("/recompute/monthly", post(recompute_monthly))
        .route("/recompute/yearly", post(recompute_yearly))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DayParams {
    pub day: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MonthStartParams {
    /// Any day of the month to recompute.
    pub month_start: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct YearParams {
    pub year: i32,
}

#[utoipa::path(
    get,
    path = "/api/admin/metrics/daily",
    tag = "admin-metrics",
    security(("bearer_auth" = [])),
    params(DayRangeParams),
    responses((status = 200, description = "Daily rollups", body = [DailyMetricsResponse]))
)]
pub async fn daily(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(range): Query<DayRangeParams>,
) -> ApiResult<Vec<DailyMetricsResponse>> {
    ok(state.metrics_service.daily(range.from, range.to).await?)
}

#[utoipa::path(
    get,
    path = "/api/admin/metrics/monthly",
    tag = "admin-metrics",
    security(("bearer_auth" = [])),
    params(MonthRangeParams),
    responses((status = 200, description = "Monthly rollups", body = [MonthlyMetricsResponse]))
)]
pub async fn monthly(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(range): Query<MonthRangeParams>,
) -> ApiResult<Vec<MonthlyMetricsResponse>> {
    ok(state.metrics_service.monthly(range.from_month, range.to_month).await?)
}

#[utoipa::path(
    get,
    path = "/api/admin/metrics/yearly",
    tag = "admin-metrics",
    security(("bearer_auth" = [])),
    params(YearRangeParams),
    responses((status = 200, description = "Yearly rollups", body = [YearlyMetricsResponse]))
)]
pub async fn yearly(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(range): Query<YearRangeParams>,
) -> ApiResult<Vec<YearlyMetricsResponse>> {
    ok(state.metrics_service.yearly(range.from_year, range.to_year).await?)
}

#[utoipa::path(
    get,
    path = "/api/admin/metrics/risk-timeline",
    tag = "admin-metrics",
    security(("bearer_auth" = [])),
    params(DayRangeParams),
    responses((status = 200, description = "High-risk events per day", body = [RiskTimelinePoint]))
)]
pub async fn risk_timeline(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(range): Query<DayRangeParams>,
) -> ApiResult<Vec<RiskTimelinePoint>> {
    ok(state.metrics_service.risk_timeline(range.from, range.to).await?)
}

#[utoipa::path(
    get,
    path = "/api/admin/metrics/retention",
    tag = "admin-metrics",
    security(("bearer_auth" = [])),
    params(CohortRangeParams),
    responses((status = 200, description = "Retention rows by cohort and window", body = [RetentionResponse]))
)]
pub async fn retention(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(range): Query<CohortRangeParams>,
) -> ApiResult<Vec<RetentionResponse>> {
    ok(state.metrics_service.retention(range.cohort_from, range.cohort_to).await?)
}

#[utoipa::path(
    get,
    path = "/api/admin/metrics/retention/matrix",
    tag = "admin-metrics",
    security(("bearer_auth" = [])),
    params(CohortRangeParams),
    responses((status = 200, description = "One row per cohort", body = [RetentionMatrixRow]))
)]
pub async fn retention_matrix(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(range): Query<CohortRangeParams>,
) -> ApiResult<Vec<RetentionMatrixRow>> {
    ok(state
        .metrics_service
        .retention_matrix(range.cohort_from, range.cohort_to)
        .await?)
}

#[utoipa::path(
    get,
    path = "/api/admin/metrics/summary",
    tag = "admin-metrics",
    security(("bearer_auth" = [])),
    params(DayRangeParams),
    responses((status = 200, description = "Risk and engagement totals", body = SummaryResponse))
)]
pub async fn summary(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(range): Query<DayRangeParams>,
) -> ApiResult<SummaryResponse> {
    ok(state.metrics_service.summary(range.from, range.to).await?)
}

#[utoipa::path(
    post,
    path = "/api/admin/metrics/recompute/daily",
    tag = "admin-metrics",
    security(("bearer_auth" = [])),
    params(DayParams),
    responses((status = 200, description = "Daily rollup and retention recomputed", body = MessageResponse))
)]
pub async fn recompute_daily(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(params): Query<DayParams>,
) -> ApiResult<MessageResponse> {
    info!("Admin {} requested daily recompute for {}", admin.id, params.day);
    ok(state.metrics_service.recompute_daily(params.day).await?)
}

#[utoipa::path(
    post,
    path = "/api/admin/metrics/recompute/monthly",
    tag = "admin-metrics",
    security(("bearer_auth" = [])),
    params(MonthStartParams),
    responses((status = 200, description = "Monthly rollup recomputed", body = MessageResponse))
)]
pub async fn recompute_monthly(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(params): Query<MonthStartParams>,
) -> ApiResult<MessageResponse> {
    info!("Admin {} requested monthly recompute for {}", admin.id, params.month_start);
    ok(state.metrics_service.recompute_monthly(params.month_start).await?)
}

#[utoipa::path(
    post,
    path = "/api/admin/metrics/recompute/yearly",
    tag = "admin-metrics",
    security(("bearer_auth" = [])),
    params(YearParams),
    responses((status = 200, description = "Yearly rollup recomputed", body = MessageResponse))
)]
pub async fn recompute_yearly(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(params): Query<YearParams>,
) -> ApiResult<MessageResponse> {
    info!("Admin {} requested yearly recompute for {}", admin.id, params.year);
    ok(state.metrics_service.recompute_yearly(params.year).await?)
}
