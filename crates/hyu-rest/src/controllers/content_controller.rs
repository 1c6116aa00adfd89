//! Public healing-content feed.

use crate::{
    extractors::AuthenticatedUser,
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use hyu_service::{FeedItem, FeedParams, FeedResponse};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(feed)).route("/:id", get(get_one))
}

/// Cursor-paged feed of published public content, newest first.
#[utoipa::path(
    get,
    path = "/api/contents",
    tag = "contents",
    security(("bearer_auth" = [])),
    params(FeedParams),
    responses(
        (status = 200, description = "Feed page", body = FeedResponse),
        (status = 400, description = "Invalid cursor", body = hyu_core::ErrorResponse)
    )
)]
pub async fn feed(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(params): Query<FeedParams>,
) -> ApiResult<FeedResponse> {
    ok(state.content_service.feed(params).await?)
}

#[utoipa::path(
    get,
    path = "/api/contents/{id}",
    tag = "contents",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Content id")),
    responses(
        (status = 200, description = "Published content", body = FeedItem),
        (status = 404, description = "Missing, private, scheduled or deleted", body = hyu_core::ErrorResponse)
    )
)]
pub async fn get_one(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> ApiResult<FeedItem> {
    ok(state.content_service.get_public(id).await?)
}
