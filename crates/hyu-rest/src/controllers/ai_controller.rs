//! Pass-through calls to the external AI service.

use crate::{
    extractors::{AuthenticatedUser, ValidatedJson},
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{extract::State, routing::post, Router};
use hyu_service::{AnalyzeSmokeRequest, ChatSmokeRequest};
use serde_json::Value;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/smoke", post(chat_smoke))
        .route("/analyze-smoke", post(analyze_smoke))
}

#[utoipa::path(
    post,
    path = "/api/ai/smoke",
    tag = "ai",
    security(("bearer_auth" = [])),
    request_body = ChatSmokeRequest,
    responses(
        (status = 200, description = "Upstream JSON"),
        (status = 502, description = "AI service failed", body = hyu_core::ErrorResponse)
    )
)]
pub async fn chat_smoke(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<ChatSmokeRequest>,
) -> ApiResult<Value> {
    ok(state.ai_service.chat_smoke(user.id, request).await?)
}

#[utoipa::path(
    post,
    path = "/api/ai/analyze-smoke",
    tag = "ai",
    security(("bearer_auth" = [])),
    request_body = AnalyzeSmokeRequest,
    responses(
        (status = 200, description = "Upstream JSON"),
        (status = 502, description = "AI service failed", body = hyu_core::ErrorResponse)
    )
)]
pub async fn analyze_smoke(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<AnalyzeSmokeRequest>,
) -> ApiResult<Value> {
    ok(state.ai_service.analyze_smoke(user.id, request).await?)
}
