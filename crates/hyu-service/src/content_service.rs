//! Healing contents: CMS management and the public keyset feed.

use crate::dto::{
    parse_filter, ContentListParams, ContentResponse, CreateContentRequest, FeedItem, FeedParams, FeedResponse,
    UpdateContentRequest,
};
use async_trait::async_trait;
use hyu_core::text::blank_to_none;
use hyu_core::{FeedCursor, HyuError, HyuResult, Interface, Page, PageRequest, SharedClock, ValidateExt};
use hyu_domain::{CmsContent, ContentCategory, ContentDraft, Visibility};
use hyu_repository::{ContentRepository, ContentSearch, ContentSort, FeedQuery};
use shaku::Component;
use std::sync::Arc;
use tracing::{debug, info};

pub const CONTENT_ADMIN_PAGE_SIZE: usize = 12;
pub const FEED_PAGE_SIZE: usize = 12;
pub const FEED_MAX_SIZE: usize = 50;

#[async_trait]
pub trait ContentService: Interface + Send + Sync {
    async fn create(&self, admin_id: i64, request: CreateContentRequest) -> HyuResult<ContentResponse>;

    /// Admin lookup, deleted rows included.
    async fn get(&self, id: i64) -> HyuResult<ContentResponse>;

    async fn search(&self, params: ContentListParams) -> HyuResult<Page<ContentResponse>>;

    async fn update(&self, admin_id: i64, id: i64, request: UpdateContentRequest) -> HyuResult<ContentResponse>;

    async fn set_visibility(&self, admin_id: i64, id: i64, value: &str) -> HyuResult<ContentResponse>;

    async fn delete(&self, admin_id: i64, id: i64) -> HyuResult<()>;

    /// One page of published public contents, newest first.
    async fn feed(&self, params: FeedParams) -> HyuResult<FeedResponse>;

    /// A single content as the feed would show it.
    async fn get_public(&self, id: i64) -> HyuResult<FeedItem>;
}

#[derive(Component)]
#[shaku(interface = ContentService)]
pub struct ContentServiceImpl {
    #[shaku(inject)]
    contents: Arc<dyn ContentRepository>,
    clock: SharedClock,
}

impl ContentServiceImpl {
    pub fn new(contents: Arc<dyn ContentRepository>, clock: SharedClock) -> Self {
        Self { contents, clock }
    }

    async fn load(&self, id: i64) -> HyuResult<CmsContent> {
        self.contents
            .find_by_id(id)
            .await?
            .ok_or_else(|| HyuError::not_found("Content", id))
    }

    async fn save(&self, admin_id: i64, mut content: CmsContent) -> HyuResult<CmsContent> {
        content.stamp_publication(self.clock.now());
        content.updated_by = Some(admin_id);
        self.contents.update(&content).await
    }
}

#[async_trait]
impl ContentService for ContentServiceImpl {
    async fn create(&self, admin_id: i64, request: CreateContentRequest) -> HyuResult<ContentResponse> {
        request.validate_request()?;
        debug!("Creating content '{}'", request.title);

        let content = self
            .contents
            .create(ContentDraft {
                category: request.category,
                title: request.title.trim().to_string(),
                text: request.text,
                media_type: request.media_type,
                duration: request.duration,
                thumbnail_url: blank_to_none(request.thumbnail_url.as_deref()),
                visibility: request.visibility.unwrap_or_default(),
                group_key: blank_to_none(request.group_key.as_deref()),
                published_at: Some(request.published_at.unwrap_or_else(|| self.clock.now())),
                created_by: Some(admin_id),
            })
            .await?;

        info!("Content created: {} by admin {}", content.id, admin_id);
        Ok(content.into())
    }

    async fn get(&self, id: i64) -> HyuResult<ContentResponse> {
        Ok(self.load(id).await?.into())
    }

    async fn search(&self, params: ContentListParams) -> HyuResult<Page<ContentResponse>> {
        let search = ContentSearch {
            q: blank_to_none(params.q.as_deref()),
            category: parse_filter(params.category.as_deref())?,
            visibility: parse_filter(params.visibility.as_deref())?,
            include_deleted: params.include_deleted,
            group_key: blank_to_none(params.group_key.as_deref()),
            sort: ContentSort::parse(params.sort.as_deref()),
        };
        let page = PageRequest::with_default(params.page, params.size, CONTENT_ADMIN_PAGE_SIZE);
        Ok(self.contents.search(&search, page).await?.map(ContentResponse::from))
    }

    async fn update(&self, admin_id: i64, id: i64, request: UpdateContentRequest) -> HyuResult<ContentResponse> {
        request.validate_request()?;
        let mut content = self.load(id).await?;

        if let Some(category) = request.category {
            content.category = category;
        }
        if let Some(title) = request.title {
            content.title = title.trim().to_string();
        }
        if request.text.is_some() {
            content.text = request.text;
        }
        if let Some(media_type) = request.media_type {
            content.media_type = media_type;
        }
        if request.duration.is_some() {
            content.duration = request.duration;
        }
        if request.thumbnail_url.is_some() {
            content.thumbnail_url = blank_to_none(request.thumbnail_url.as_deref());
        }
        if let Some(visibility) = request.visibility {
            content.visibility = visibility;
        }
        if request.group_key.is_some() {
            content.group_key = blank_to_none(request.group_key.as_deref());
        }
        if request.published_at.is_some() {
            content.published_at = request.published_at;
        }

        let updated = self.save(admin_id, content).await?;
        info!("Content updated: {} by admin {}", id, admin_id);
        Ok(updated.into())
    }

    async fn set_visibility(&self, admin_id: i64, id: i64, value: &str) -> HyuResult<ContentResponse> {
        let visibility: Visibility = value.trim().parse()?;
        let mut content = self.load(id).await?;
        content.visibility = visibility;

        let updated = self.save(admin_id, content).await?;
        info!("Content {} is now {}", id, visibility);
        Ok(updated.into())
    }

    async fn delete(&self, admin_id: i64, id: i64) -> HyuResult<()> {
        let mut content = self.load(id).await?;
        if content.deleted {
            return Ok(());
        }
        content.deleted = true;
        content.deleted_at = Some(self.clock.now());
        content.deleted_by = Some(admin_id);
        content.updated_by = Some(admin_id);
        self.contents.update(&content).await?;
        info!("Content soft-deleted: {} by admin {}", id, admin_id);
        Ok(())
    }

    async fn feed(&self, params: FeedParams) -> HyuResult<FeedResponse> {
        let size = params.size.unwrap_or(FEED_PAGE_SIZE).clamp(1, FEED_MAX_SIZE);
        let after = blank_to_none(params.cursor.as_deref())
            .map(|c| FeedCursor::decode(&c))
            .transpose()?;
        let query = FeedQuery {
            category: parse_filter::<ContentCategory>(params.category.as_deref())?,
            group_key: blank_to_none(params.group_key.as_deref()),
            q: blank_to_none(params.q.as_deref()),
            after,
            now: self.clock.now(),
            limit: size + 1,
        };

        let mut rows = self.contents.feed(&query).await?;
        let has_more = rows.len() > size;
        rows.truncate(size);
        let next_cursor = if has_more {
            rows.last().map(|c| FeedCursor::new(c.feed_timestamp(), c.id).encode())
        } else {
            None
        };

        Ok(FeedResponse {
            items: rows.into_iter().map(FeedItem::from).collect(),
            next_cursor,
            has_more,
        })
    }

    async fn get_public(&self, id: i64) -> HyuResult<FeedItem> {
        let now = self.clock.now();
        self.contents
            .find_by_id(id)
            .await?
            .filter(|c| c.is_visible_at(now))
            .map(FeedItem::from)
            .ok_or_else(|| HyuError::not_found("Content", id))
    }
}

impl std::fmt::Debug for ContentServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentServiceImpl").finish_non_exhaustive()
    }
}
