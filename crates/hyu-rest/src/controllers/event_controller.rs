//! KPI event ingestion.

use crate::{
    extractors::{IdempotencyKey, OptionalUser, ValidatedJson},
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{extract::State, routing::post, Router};
use hyu_service::{EventAck, EventRequest};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(ingest))
}

/// Records a client event; a repeated idempotency key returns the stored id.
#[utoipa::path(
    post,
    path = "/api/events",
    tag = "events",
    security(("bearer_auth" = [])),
    params(("X-Idempotency-Key" = Option<String>, Header, description = "Deduplication key")),
    request_body = EventRequest,
    responses(
        (status = 200, description = "Event stored or deduplicated", body = EventAck),
        (status = 400, description = "Missing name, missing risk level or bad eventTime", body = hyu_core::ErrorResponse)
    )
)]
pub async fn ingest(
    State(state): State<AppState>,
    user: OptionalUser,
    IdempotencyKey(key): IdempotencyKey,
    ValidatedJson(request): ValidatedJson<EventRequest>,
) -> ApiResult<EventAck> {
    ok(state.event_service.ingest(request, key, user.id()).await?)
}
