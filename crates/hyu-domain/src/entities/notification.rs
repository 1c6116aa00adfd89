//! In-app notifications.

use super::weekly_summary::{WeeklySummary, WEEKLY_SUMMARY_TITLE};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Title of the evening reminder for unchecked goals.
pub const MISSED_DAILY_TITLE: &str = "오늘 목표를 체크하지 않았어요";

db_enum! {
    pub enum NotificationType {
        MissedDaily => "MISSED_DAILY",
        WeeklySummary => "WEEKLY_SUMMARY",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub goal_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub body: Option<String>,
    pub event_date: NaiveDate,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: i64,
    pub goal_id: Option<i64>,
    pub kind: NotificationType,
    pub title: String,
    pub body: Option<String>,
    pub event_date: NaiveDate,
}

impl NewNotification {
    /// Evening reminder for a goal that was not checked on `day`.
    #[must_use]
    pub fn missed_daily(user_id: i64, goal_id: i64, goal_title: &str, day: NaiveDate) -> Self {
        Self {
            user_id,
            goal_id: Some(goal_id),
            kind: NotificationType::MissedDaily,
            title: MISSED_DAILY_TITLE.to_string(),
            body: Some(format!("'{goal_title}' 목표를 아직 체크하지 않았어요.")),
            event_date: day,
        }
    }

    /// In-app copy of a stored weekly summary.
    #[must_use]
    pub fn weekly_summary(summary: &WeeklySummary) -> Self {
        Self {
            user_id: summary.user_id,
            goal_id: None,
            kind: NotificationType::WeeklySummary,
            title: WEEKLY_SUMMARY_TITLE.to_string(),
            body: Some(summary.content.clone()),
            event_date: summary.week_start,
        }
    }
}
