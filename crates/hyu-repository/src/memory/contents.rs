use super::{contains_ci, paginate};
use crate::query::{ContentSearch, ContentSortField, FeedQuery};
use crate::traits::ContentRepository;
use async_trait::async_trait;
use hyu_core::{HyuError, HyuResult, Page, PageRequest, SharedClock};
use hyu_domain::{CmsContent, ContentDraft};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    rows: BTreeMap<i64, CmsContent>,
}

/// CMS items with the same feed ordering as the SQL query.
#[derive(Debug, Default)]
pub struct InMemoryContentRepository {
    state: Mutex<State>,
    clock: SharedClock,
}

impl InMemoryContentRepository {
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            state: Mutex::default(),
            clock,
        }
    }
}

fn matches_text(content: &CmsContent, q: &str) -> bool {
    contains_ci(&content.title, q) || content.text.as_deref().is_some_and(|t| contains_ci(t, q))
}

fn compare_by(field: ContentSortField, a: &CmsContent, b: &CmsContent) -> Ordering {
    match field {
        ContentSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        ContentSortField::PublishedAt => a.published_at.cmp(&b.published_at),
        ContentSortField::Title => a.title.cmp(&b.title),
    }
    .then(a.id.cmp(&b.id))
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn create(&self, draft: ContentDraft) -> HyuResult<CmsContent> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.next_id += 1;
        let content = CmsContent {
            id: state.next_id,
            category: draft.category,
            title: draft.title,
            text: draft.text,
            media_type: draft.media_type,
            duration: draft.duration,
            thumbnail_url: draft.thumbnail_url,
            visibility: draft.visibility,
            group_key: draft.group_key,
            published_at: draft.published_at,
            created_at: now,
            updated_at: now,
            created_by: draft.created_by,
            updated_by: draft.created_by,
            deleted: false,
            deleted_at: None,
            deleted_by: None,
        };
        state.rows.insert(content.id, content.clone());
        Ok(content)
    }

    async fn update(&self, content: &CmsContent) -> HyuResult<CmsContent> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        let stored = state
            .rows
            .get_mut(&content.id)
            .ok_or_else(|| HyuError::not_found("Content", content.id))?;
        *stored = CmsContent {
            created_at: stored.created_at,
            created_by: stored.created_by,
            updated_at: now,
            ..content.clone()
        };
        Ok(stored.clone())
    }

    async fn find_by_id(&self, id: i64) -> HyuResult<Option<CmsContent>> {
        Ok(self.state.lock().rows.get(&id).cloned())
    }

    async fn search(&self, search: &ContentSearch, page: PageRequest) -> HyuResult<Page<CmsContent>> {
        let mut rows: Vec<CmsContent> = self
            .state
            .lock()
            .rows
            .values()
            .filter(|c| {
                (search.include_deleted || !c.deleted)
                    && search.q.as_deref().map_or(true, |q| matches_text(c, q))
                    && search.category.map_or(true, |cat| c.category == cat)
                    && search.visibility.map_or(true, |v| c.visibility == v)
                    && search.group_key.as_deref().map_or(true, |g| c.group_key.as_deref() == Some(g))
            })
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            let ord = compare_by(search.sort.field, a, b);
            if search.sort.descending {
                ord.reverse()
            } else {
                ord
            }
        });
        Ok(paginate(rows, page))
    }

    async fn feed(&self, query: &FeedQuery) -> HyuResult<Vec<CmsContent>> {
        let mut rows: Vec<CmsContent> = self
            .state
            .lock()
            .rows
            .values()
            .filter(|c| {
                c.is_visible_at(query.now)
                    && query.category.map_or(true, |cat| c.category == cat)
                    && query.group_key.as_deref().map_or(true, |g| c.group_key.as_deref() == Some(g))
                    && query.q.as_deref().map_or(true, |q| matches_text(c, q))
                    && query.after.map_or(true, |cursor| {
                        let ts = c.feed_timestamp();
                        ts < cursor.timestamp || (ts == cursor.timestamp && c.id < cursor.id)
                    })
            })
            .cloned()
            .collect();

        rows.sort_by(|a, b| b.feed_timestamp().cmp(&a.feed_timestamp()).then(b.id.cmp(&a.id)));
        rows.truncate(query.limit);
        Ok(rows)
    }
}
