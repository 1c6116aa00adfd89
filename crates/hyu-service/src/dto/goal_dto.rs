//! Goal and notification DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use hyu_core::rules::not_blank;
use hyu_domain::{Goal, Notification, NotificationType};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalRequest {
    #[validate(
        custom(function = "not_blank", message = "Title must not be blank"),
        length(max = 100, message = "Title cannot exceed 100 characters")
    )]
    pub title: String,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,

    pub alert_enabled: Option<bool>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalRequest {
    #[validate(
        custom(function = "not_blank", message = "Title must not be blank"),
        length(max = 100, message = "Title cannot exceed 100 characters")
    )]
    pub title: Option<String>,

    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,

    pub alert_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoalResponse {
    pub id: i64,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub alert_enabled: bool,
    pub checked_today: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GoalResponse {
    #[must_use]
    pub fn new(goal: Goal, checked_today: bool) -> Self {
        Self {
            id: goal.id,
            title: goal.title,
            start_date: goal.start_date,
            end_date: goal.end_date,
            alert_enabled: goal.alert_enabled,
            checked_today,
            created_at: goal.created_at,
            updated_at: goal.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoalCheckinResponse {
    pub goal_id: i64,
    pub date: NaiveDate,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    pub id: i64,
    pub goal_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub body: Option<String>,
    pub event_date: NaiveDate,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationDto {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            goal_id: n.goal_id,
            kind: n.kind,
            title: n.title,
            body: n.body,
            event_date: n.event_date,
            read: n.read,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CountResponse {
    pub count: i64,
}
