//! Scheduler inspection and manual job control (admin only).

use crate::{
    extractors::AdminUser,
    responses::{ok, ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use hyu_core::HyuError;
use hyu_jobs::{ScheduledJobInfo, Scheduler};
use hyu_service::MessageResponse;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/:name", patch(toggle))
        .route("/:name/run", post(run))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub name: String,
    pub cron: String,
    pub enabled: bool,
    pub next_run: Option<DateTime<Utc>>,
}

impl From<ScheduledJobInfo> for JobResponse {
    fn from(info: ScheduledJobInfo) -> Self {
        Self {
            name: info.name,
            cron: info.cron,
            enabled: info.enabled,
            next_run: info.next_run,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerResponse {
    pub running: bool,
    /// Runs started since boot, successful or not.
    pub jobs_executed: u64,
    pub jobs_failed: u64,
    pub jobs: Vec<JobResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleJobRequest {
    pub enabled: bool,
}

fn scheduler(state: &AppState) -> Result<&Arc<Scheduler>, AppError> {
    state
        .scheduler
        .as_ref()
        .ok_or_else(|| AppError(HyuError::conflict("Scheduler is disabled")))
}

fn job_info(scheduler: &Scheduler, name: &str) -> Result<JobResponse, AppError> {
    scheduler
        .list_jobs()
        .into_iter()
        .find(|job| job.name == name)
        .map(JobResponse::from)
        .ok_or_else(|| AppError(HyuError::not_found("Job", name)))
}

#[utoipa::path(
    get,
    path = "/api/admin/jobs",
    tag = "admin-jobs",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Scheduler counters and registered jobs", body = SchedulerResponse),
        (status = 409, description = "Scheduler is disabled")
    )
)]
pub async fn list(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<SchedulerResponse> {
    let scheduler = scheduler(&state)?;
    let stats = scheduler.stats();
    ok(SchedulerResponse {
        running: stats.running,
        jobs_executed: stats.jobs_executed,
        jobs_failed: stats.jobs_failed,
        jobs: scheduler.list_jobs().into_iter().map(JobResponse::from).collect(),
    })
}

#[utoipa::path(
    patch,
    path = "/api/admin/jobs/{name}",
    tag = "admin-jobs",
    security(("bearer_auth" = [])),
    params(("name" = String, Path, description = "Job name")),
    request_body = ToggleJobRequest,
    responses(
        (status = 200, description = "Job paused or resumed", body = JobResponse),
        (status = 404, description = "Unknown job")
    )
)]
pub async fn toggle(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(name): Path<String>,
    Json(request): Json<ToggleJobRequest>,
) -> ApiResult<JobResponse> {
    let scheduler = scheduler(&state)?;
    let found = if request.enabled {
        scheduler.enable_job(&name)
    } else {
        scheduler.disable_job(&name)
    };
    if !found {
        return Err(AppError(HyuError::not_found("Job", &name)));
    }
    info!("Admin {} set job {} enabled={}", admin.id, name, request.enabled);
    ok(job_info(scheduler, &name)?)
}

#[utoipa::path(
    post,
    path = "/api/admin/jobs/{name}/run",
    tag = "admin-jobs",
    security(("bearer_auth" = [])),
    params(("name" = String, Path, description = "Job name")),
    responses(
        (status = 200, description = "Job ran to completion", body = MessageResponse),
        (status = 404, description = "Unknown job"),
        (status = 500, description = "Job failed")
    )
)]
pub async fn run(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(name): Path<String>,
) -> ApiResult<MessageResponse> {
    let scheduler = scheduler(&state)?;
    info!("Admin {} triggered job {}", admin.id, name);
    scheduler.trigger_job(&name).await.map_err(HyuError::from)?;
    ok(MessageResponse::new(format!("{name} completed")))
}
