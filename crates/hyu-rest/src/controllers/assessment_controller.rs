//! Assessment flow for users and guests.

use crate::{
    extractors::{AuthenticatedUser, GuestKey, OptionalUser},
    responses::{created, no_content, ok, ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use hyu_core::{Page, PageRequest};
use hyu_service::{
    AnswerRequest, AssessmentResponse, HistoryItem, PageParams, QuestionSetResponse, Respondent, SubmitRequest,
    SubmitResponse,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/by-code/:code", get(by_code))
        .route("/:id/questions", get(questions))
        .route("/:id/answers", patch(answer))
        .route("/:id/submit", post(submit))
        .route("/:id/results/latest", get(latest_result))
        .route("/:id/results", get(history))
}

fn respondent(user: &OptionalUser, guest_key: Option<String>) -> Respondent {
    Respondent {
        user_id: user.id(),
        header_guest_key: guest_key,
    }
}

#[utoipa::path(
    get,
    path = "/api/assessments",
    tag = "assessments",
    params(PageParams),
    responses((status = 200, description = "Page of active assessments"))
)]
pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> ApiResult<Page<AssessmentResponse>> {
    ok(state
        .assessment_service
        .list(page.to_request(PageRequest::DEFAULT_SIZE))
        .await?)
}

#[utoipa::path(
    get,
    path = "/api/assessments/by-code/{code}",
    tag = "assessments",
    params(("code" = String, Path, description = "Assessment code")),
    responses(
        (status = 200, description = "Active assessment", body = AssessmentResponse),
        (status = 404, description = "Unknown or inactive", body = hyu_core::ErrorResponse)
    )
)]
pub async fn by_code(State(state): State<AppState>, Path(code): Path<String>) -> ApiResult<AssessmentResponse> {
    ok(state.assessment_service.by_code(&code).await?)
}

#[utoipa::path(
    get,
    path = "/api/assessments/{id}/questions",
    tag = "assessments",
    params(("id" = i64, Path, description = "Assessment id")),
    responses((status = 200, description = "Questions of an active assessment", body = QuestionSetResponse))
)]
pub async fn questions(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<QuestionSetResponse> {
    ok(state.assessment_service.questions(id).await?)
}

/// Saves one answer into the caller's draft.
#[utoipa::path(
    patch,
    path = "/api/assessments/{id}/answers",
    tag = "assessments",
    params(
        ("id" = i64, Path, description = "Assessment id"),
        ("X-Guest-Key" = Option<String>, Header, description = "Guest identity when not logged in")
    ),
    request_body = AnswerRequest,
    responses(
        (status = 204, description = "Answer saved"),
        (status = 400, description = "Bad value, foreign question or no identity", body = hyu_core::ErrorResponse),
        (status = 403, description = "Submission owned by someone else", body = hyu_core::ErrorResponse),
        (status = 409, description = "Submission already submitted", body = hyu_core::ErrorResponse)
    )
)]
pub async fn answer(
    State(state): State<AppState>,
    user: OptionalUser,
    GuestKey(guest_key): GuestKey,
    Path(id): Path<i64>,
    Json(request): Json<AnswerRequest>,
) -> Result<StatusCode, AppError> {
    state
        .assessment_service
        .answer(id, respondent(&user, guest_key), request)
        .await?;
    Ok(no_content())
}

#[utoipa::path(
    post,
    path = "/api/assessments/{id}/submit",
    tag = "assessments",
    params(
        ("id" = i64, Path, description = "Assessment id"),
        ("X-Guest-Key" = Option<String>, Header, description = "Guest identity when not logged in")
    ),
    request_body = SubmitRequest,
    responses(
        (status = 201, description = "Scored result", body = SubmitResponse),
        (status = 400, description = "Incomplete answers or undefined band", body = hyu_core::ErrorResponse)
    )
)]
pub async fn submit(
    State(state): State<AppState>,
    user: OptionalUser,
    GuestKey(guest_key): GuestKey,
    Path(id): Path<i64>,
    Json(request): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let response = state
        .assessment_service
        .submit(id, respondent(&user, guest_key), request)
        .await?;
    Ok(created(response))
}

#[utoipa::path(
    get,
    path = "/api/assessments/{id}/results/latest",
    tag = "assessments",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Assessment id")),
    responses(
        (status = 200, description = "Latest submitted result", body = SubmitResponse),
        (status = 404, description = "No submitted result", body = hyu_core::ErrorResponse)
    )
)]
pub async fn latest_result(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> ApiResult<SubmitResponse> {
    ok(state.assessment_service.latest_result(id, user.id).await?)
}

#[utoipa::path(
    get,
    path = "/api/assessments/{id}/results",
    tag = "assessments",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Assessment id"), PageParams),
    responses((status = 200, description = "Submitted results, newest first"))
)]
pub async fn history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Query(page): Query<PageParams>,
) -> ApiResult<Page<HistoryItem>> {
    ok(state
        .assessment_service
        .history(id, user.id, page.to_request(PageRequest::DEFAULT_SIZE))
        .await?)
}
