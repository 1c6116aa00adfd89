//! MySQL CMS content repository with the keyset-paginated feed.

use super::{convert_all, like_pattern, parse_column};
use crate::query::{ContentSearch, FeedQuery};
use crate::{traits::ContentRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyu_core::{HyuError, HyuResult, Page, PageRequest};
use hyu_domain::{CmsContent, ContentDraft};
use shaku::Component;
use sqlx::{FromRow, MySql, QueryBuilder};
use std::sync::Arc;
use tracing::debug;

const CONTENT_COLUMNS: &str = "id, category, title, text, media_type, duration, thumbnail_url, visibility, \
     group_key, published_at, created_at, updated_at, created_by, updated_by, deleted, deleted_at, deleted_by";

#[derive(Component, Clone)]
#[shaku(interface = ContentRepository)]
pub struct MySqlContentRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlContentRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }

    fn push_search_filters(builder: &mut QueryBuilder<'_, MySql>, search: &ContentSearch) {
        builder.push(" WHERE 1 = 1");
        if !search.include_deleted {
            builder.push(" AND deleted = FALSE");
        }
        if let Some(q) = &search.q {
            let pattern = like_pattern(&q.to_lowercase());
            builder
                .push(" AND (LOWER(title) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR LOWER(text) LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(category) = search.category {
            builder.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(visibility) = search.visibility {
            builder.push(" AND visibility = ").push_bind(visibility.as_str());
        }
        if let Some(group_key) = &search.group_key {
            builder.push(" AND group_key = ").push_bind(group_key.clone());
        }
    }
}

#[derive(Debug, FromRow)]
struct ContentRow {
    id: i64,
    category: String,
    title: String,
    text: Option<String>,
    media_type: String,
    duration: Option<i32>,
    thumbnail_url: Option<String>,
    visibility: String,
    group_key: Option<String>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_by: Option<i64>,
    updated_by: Option<i64>,
    deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<i64>,
}

impl TryFrom<ContentRow> for CmsContent {
    type Error = HyuError;

    fn try_from(row: ContentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            category: parse_column("category", &row.category)?,
            title: row.title,
            text: row.text,
            media_type: parse_column("media_type", &row.media_type)?,
            duration: row.duration,
            thumbnail_url: row.thumbnail_url,
            visibility: parse_column("visibility", &row.visibility)?,
            group_key: row.group_key,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            created_by: row.created_by,
            updated_by: row.updated_by,
            deleted: row.deleted,
            deleted_at: row.deleted_at,
            deleted_by: row.deleted_by,
        })
    }
}

#[async_trait]
impl ContentRepository for MySqlContentRepository {
    async fn create(&self, draft: ContentDraft) -> HyuResult<CmsContent> {
        debug!("Creating CMS content: {}", draft.title);

        let result = sqlx::query(
            r#"
            INSERT INTO cms_contents
                (category, title, text, media_type, duration, thumbnail_url, visibility,
                 group_key, published_at, created_by, updated_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(draft.category.as_str())
        .bind(&draft.title)
        .bind(&draft.text)
        .bind(draft.media_type.as_str())
        .bind(draft.duration)
        .bind(&draft.thumbnail_url)
        .bind(draft.visibility.as_str())
        .bind(&draft.group_key)
        .bind(draft.published_at)
        .bind(draft.created_by)
        .bind(draft.created_by)
        .execute(self.pool.inner())
        .await?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|_| HyuError::Internal("Content id out of range".to_string()))?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| HyuError::Internal("Failed to fetch inserted content".to_string()))
    }

    async fn update(&self, content: &CmsContent) -> HyuResult<CmsContent> {
        debug!("Updating CMS content: {}", content.id);

        sqlx::query(
            r#"
            UPDATE cms_contents
            SET category = ?, title = ?, text = ?, media_type = ?, duration = ?, thumbnail_url = ?,
                visibility = ?, group_key = ?, published_at = ?, updated_by = ?,
                deleted = ?, deleted_at = ?, deleted_by = ?
            WHERE id = ?
            "#,
        )
        .bind(content.category.as_str())
        .bind(&content.title)
        .bind(&content.text)
        .bind(content.media_type.as_str())
        .bind(content.duration)
        .bind(&content.thumbnail_url)
        .bind(content.visibility.as_str())
        .bind(&content.group_key)
        .bind(content.published_at)
        .bind(content.updated_by)
        .bind(content.deleted)
        .bind(content.deleted_at)
        .bind(content.deleted_by)
        .bind(content.id)
        .execute(self.pool.inner())
        .await?;

        self.find_by_id(content.id)
            .await?
            .ok_or_else(|| HyuError::not_found("Content", content.id))
    }

    async fn find_by_id(&self, id: i64) -> HyuResult<Option<CmsContent>> {
        let sql = format!("SELECT {CONTENT_COLUMNS} FROM cms_contents WHERE id = ?");
        let row = sqlx::query_as::<_, ContentRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.inner())
            .await?;
        row.map(CmsContent::try_from).transpose()
    }

    async fn search(&self, search: &ContentSearch, page: PageRequest) -> HyuResult<Page<CmsContent>> {
        debug!("Searching CMS contents: {:?}", search);

        let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM cms_contents");
        Self::push_search_filters(&mut count, search);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool.inner()).await?;

        let mut select = QueryBuilder::<MySql>::new(format!("SELECT {CONTENT_COLUMNS} FROM cms_contents"));
        Self::push_search_filters(&mut select, search);
        let direction = if search.sort.descending { "DESC" } else { "ASC" };
        select
            .push(format!(
                " ORDER BY {} {direction}, id {direction} LIMIT ",
                search.sort.field.column()
            ))
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let rows = select.build_query_as::<ContentRow>().fetch_all(self.pool.inner()).await?;

        Ok(Page::new(convert_all(rows)?, page.page, page.size, total as u64))
    }

    async fn feed(&self, query: &FeedQuery) -> HyuResult<Vec<CmsContent>> {
        debug!("Loading feed page after {:?}", query.after);

        let mut builder = QueryBuilder::<MySql>::new(format!(
            "SELECT {CONTENT_COLUMNS} FROM cms_contents \
             WHERE deleted = FALSE AND visibility = 'PUBLIC' AND (published_at IS NULL OR published_at <= "
        ));
        builder.push_bind(query.now).push(")");

        if let Some(category) = query.category {
            builder.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(group_key) = &query.group_key {
            builder.push(" AND group_key = ").push_bind(group_key.clone());
        }
        if let Some(q) = &query.q {
            let pattern = like_pattern(&q.to_lowercase());
            builder
                .push(" AND (LOWER(title) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR LOWER(text) LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(cursor) = query.after {
            builder
                .push(" AND (COALESCE(published_at, created_at) < ")
                .push_bind(cursor.timestamp)
                .push(" OR (COALESCE(published_at, created_at) = ")
                .push_bind(cursor.timestamp)
                .push(" AND id < ")
                .push_bind(cursor.id)
                .push("))");
        }
        builder
            .push(" ORDER BY COALESCE(published_at, created_at) DESC, id DESC LIMIT ")
            .push_bind(query.limit as i64);

        let rows = builder.build_query_as::<ContentRow>().fetch_all(self.pool.inner()).await?;
        convert_all(rows)
    }
}

impl std::fmt::Debug for MySqlContentRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlContentRepository").finish_non_exhaustive()
    }
}
