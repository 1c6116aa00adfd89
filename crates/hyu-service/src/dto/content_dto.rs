//! CMS content and feed DTOs.

use chrono::{DateTime, Utc};
use hyu_domain::{CmsContent, ContentCategory, MediaType, Visibility};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateContentRequest {
    pub category: ContentCategory,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    pub text: Option<String>,

    pub media_type: MediaType,

    #[validate(range(min = 0, message = "Duration must not be negative"))]
    pub duration: Option<i32>,

    #[validate(length(max = 500))]
    pub thumbnail_url: Option<String>,

    pub visibility: Option<Visibility>,

    #[validate(length(max = 100))]
    pub group_key: Option<String>,

    pub published_at: Option<DateTime<Utc>>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContentRequest {
    pub category: Option<ContentCategory>,

    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    pub text: Option<String>,

    pub media_type: Option<MediaType>,

    #[validate(range(min = 0))]
    pub duration: Option<i32>,

    #[validate(length(max = 500))]
    pub thumbnail_url: Option<String>,

    pub visibility: Option<Visibility>,

    #[validate(length(max = 100))]
    pub group_key: Option<String>,

    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ContentListParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub visibility: Option<String>,
    #[serde(default)]
    pub include_deleted: bool,
    pub group_key: Option<String>,
    pub page: Option<usize>,
    pub size: Option<usize>,
    /// `createdAt|publishedAt|title`, optionally followed by `,asc|desc`.
    pub sort: Option<String>,
}

/// Admin view of a content row, including deletion state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    pub id: i64,
    pub category: ContentCategory,
    pub title: String,
    pub text: Option<String>,
    pub media_type: MediaType,
    pub duration: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub visibility: Visibility,
    pub group_key: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<i64>,
}

impl From<CmsContent> for ContentResponse {
    fn from(c: CmsContent) -> Self {
        Self {
            id: c.id,
            category: c.category,
            title: c.title,
            text: c.text,
            media_type: c.media_type,
            duration: c.duration,
            thumbnail_url: c.thumbnail_url,
            visibility: c.visibility,
            group_key: c.group_key,
            published_at: c.published_at,
            created_at: c.created_at,
            updated_at: c.updated_at,
            created_by: c.created_by,
            updated_by: c.updated_by,
            deleted: c.deleted,
            deleted_at: c.deleted_at,
            deleted_by: c.deleted_by,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FeedParams {
    pub cursor: Option<String>,
    pub category: Option<String>,
    pub group_key: Option<String>,
    pub q: Option<String>,
    pub size: Option<usize>,
}

/// Public view of a content row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: i64,
    pub category: ContentCategory,
    pub title: String,
    pub text: Option<String>,
    pub media_type: MediaType,
    pub duration: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub group_key: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<CmsContent> for FeedItem {
    fn from(c: CmsContent) -> Self {
        Self {
            id: c.id,
            category: c.category,
            title: c.title,
            text: c.text,
            media_type: c.media_type,
            duration: c.duration,
            thumbnail_url: c.thumbnail_url,
            group_key: c.group_key,
            published_at: c.published_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub items: Vec<FeedItem>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}
