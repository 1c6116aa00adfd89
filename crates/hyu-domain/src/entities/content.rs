//! Healing content managed through the CMS and served in the user feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

db_enum! {
    pub enum ContentCategory {
        Music => "MUSIC",
        Meditation => "MEDITATION",
        MoodBoost => "MOOD_BOOST",
    }
}

db_enum! {
    pub enum MediaType {
        Audio => "AUDIO",
        Video => "VIDEO",
        Text => "TEXT",
        Link => "LINK",
    }
}

db_enum! {
    #[derive(Default)]
    pub enum Visibility {
        #[default]
        Public => "PUBLIC",
        Private => "PRIVATE",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmsContent {
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

impl CmsContent {
    /// Sort key used by the feed: publication time, falling back to creation.
    #[must_use]
    pub fn feed_timestamp(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }

    /// Whether an end user may see this item at `now`.
    #[must_use]
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        !self.deleted
            && self.visibility == Visibility::Public
            && self.published_at.map_or(true, |at| at <= now)
    }

    /// Public items always carry a publication time.
    pub fn stamp_publication(&mut self, now: DateTime<Utc>) {
        if self.visibility == Visibility::Public && self.published_at.is_none() {
            self.published_at = Some(now);
        }
    }
}

/// Fields of a new CMS item.
#[derive(Debug, Clone)]
pub struct ContentDraft {
    pub category: ContentCategory,
    pub title: String,
    pub text: Option<String>,
    pub media_type: MediaType,
    pub duration: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub visibility: Visibility,
    pub group_key: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn content() -> CmsContent {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        CmsContent {
            id: 1,
            category: ContentCategory::Music,
            title: "Rain".to_string(),
            text: None,
            media_type: MediaType::Audio,
            duration: Some(180),
            thumbnail_url: None,
            visibility: Visibility::Public,
            group_key: None,
            published_at: None,
            created_at: at,
            updated_at: at,
            created_by: None,
            updated_by: None,
            deleted: false,
            deleted_at: None,
            deleted_by: None,
        }
    }

    #[test]
    fn test_feed_timestamp_falls_back_to_created() {
        let mut c = content();
        assert_eq!(c.feed_timestamp(), c.created_at);
        let published = c.created_at + Duration::days(1);
        c.published_at = Some(published);
        assert_eq!(c.feed_timestamp(), published);
    }

    #[test]
    fn test_visibility_rules() {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let mut c = content();
        assert!(c.is_visible_at(now));
        c.published_at = Some(now + Duration::hours(1));
        assert!(!c.is_visible_at(now));
        c.published_at = Some(now);
        c.visibility = Visibility::Private;
        assert!(!c.is_visible_at(now));
    }

    #[test]
    fn test_stamp_publication_only_for_public() {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let mut c = content();
        c.visibility = Visibility::Private;
        c.stamp_publication(now);
        assert!(c.published_at.is_none());
        c.visibility = Visibility::Public;
        c.stamp_publication(now);
        assert_eq!(c.published_at, Some(now));
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("mood_boost".parse::<ContentCategory>().unwrap(), ContentCategory::MoodBoost);
    }
}
