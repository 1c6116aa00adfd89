//! Search filters shared by the MySQL and in-memory repositories.

use chrono::{DateTime, Utc};
use hyu_core::FeedCursor;
use hyu_domain::{
    ContentCategory, ReportReason, ReportStatus, ReportTargetType, RiskLevel, Role, UserState, Visibility,
};

/// Admin user search. Date bounds are a half-open UTC interval.
#[derive(Debug, Clone, Default)]
pub struct UserSearch {
    /// Substring of email, nickname or name.
    pub q: Option<String>,
    pub role: Option<Role>,
    pub state: Option<UserState>,
    pub risk_level: Option<RiskLevel>,
    pub joined_from: Option<DateTime<Utc>>,
    pub joined_until: Option<DateTime<Utc>>,
}

/// Which assessments a listing includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentScope {
    /// Everything, deleted rows included.
    All,
    /// Rows that are not soft-deleted.
    NotDeleted,
    /// Active and not deleted.
    Available,
}

/// Sortable CMS columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentSortField {
    #[default]
    CreatedAt,
    PublishedAt,
    Title,
}

impl ContentSortField {
    pub(crate) const fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::PublishedAt => "published_at",
            Self::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentSort {
    pub field: ContentSortField,
    pub descending: bool,
}

impl Default for ContentSort {
    fn default() -> Self {
        Self {
            field: ContentSortField::CreatedAt,
            descending: true,
        }
    }
}

impl ContentSort {
    /// Parses `field[,asc|desc]`. Unknown fields fall back to `createdAt`.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::default();
        };
        let (field, dir) = value.split_once(',').unwrap_or((value, "desc"));
        let field = match field.trim() {
            "publishedAt" => ContentSortField::PublishedAt,
            "title" => ContentSortField::Title,
            _ => ContentSortField::CreatedAt,
        };
        Self {
            field,
            descending: !dir.trim().eq_ignore_ascii_case("asc"),
        }
    }
}

/// Admin CMS search.
#[derive(Debug, Clone, Default)]
pub struct ContentSearch {
    /// Case-insensitive substring of title or text.
    pub q: Option<String>,
    pub category: Option<ContentCategory>,
    pub visibility: Option<Visibility>,
    pub include_deleted: bool,
    pub group_key: Option<String>,
    pub sort: ContentSort,
}

/// One page of the public feed.
#[derive(Debug, Clone)]
pub struct FeedQuery {
    pub category: Option<ContentCategory>,
    pub group_key: Option<String>,
    pub q: Option<String>,
    /// Position after which rows are returned.
    pub after: Option<FeedCursor>,
    pub now: DateTime<Utc>,
    /// Rows to fetch, one more than the page size.
    pub limit: usize,
}

/// Admin report search. Date bounds are a half-open UTC interval.
#[derive(Debug, Clone, Default)]
pub struct ReportSearch {
    /// Substring of the description.
    pub q: Option<String>,
    pub status: Option<ReportStatus>,
    pub reason: Option<ReportReason>,
    pub target_type: Option<ReportTargetType>,
    pub target_id: Option<i64>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_sort_parse() {
        assert_eq!(ContentSort::parse(None), ContentSort::default());
        let sort = ContentSort::parse(Some("title,asc"));
        assert_eq!(sort.field, ContentSortField::Title);
        assert!(!sort.descending);

        let sort = ContentSort::parse(Some("publishedAt"));
        assert_eq!(sort.field, ContentSortField::PublishedAt);
        assert!(sort.descending);

        assert_eq!(ContentSort::parse(Some("bogus,asc")).field, ContentSortField::CreatedAt);
    }
}
