//! MySQL notification repository.

use super::parse_column;
use crate::{traits::NotificationRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hyu_core::{HyuError, HyuResult, PageRequest, Slice};
use hyu_domain::{NewNotification, Notification};
use shaku::Component;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

const NOTIFICATION_COLUMNS: &str = "id, user_id, goal_id, type, title, body, event_date, is_read, created_at";

#[derive(Component, Clone)]
#[shaku(interface = NotificationRepository)]
pub struct MySqlNotificationRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlNotificationRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: i64,
    user_id: i64,
    goal_id: Option<i64>,
    #[sqlx(rename = "type")]
    kind: String,
    title: String,
    body: Option<String>,
    event_date: NaiveDate,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = HyuError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            goal_id: row.goal_id,
            kind: parse_column("type", &row.kind)?,
            title: row.title,
            body: row.body,
            event_date: row.event_date,
            read: row.is_read,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl NotificationRepository for MySqlNotificationRepository {
    async fn insert_if_absent(&self, notification: NewNotification, at: DateTime<Utc>) -> HyuResult<Option<Notification>> {
        let result = sqlx::query(
            r#"
            INSERT IGNORE INTO notifications (user_id, goal_id, type, title, body, event_date, is_read, created_at)
            VALUES (?, ?, ?, ?, ?, ?, FALSE, ?)
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.goal_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(notification.event_date)
        .bind(at)
        .execute(self.pool.inner())
        .await?;

        if result.rows_affected() == 0 {
            debug!(
                "Notification for user {} on {} already exists",
                notification.user_id, notification.event_date
            );
            return Ok(None);
        }

        let id = i64::try_from(result.last_insert_id())
            .map_err(|_| HyuError::Internal("Notification id out of range".to_string()))?;
        Ok(Some(Notification {
            id,
            user_id: notification.user_id,
            goal_id: notification.goal_id,
            kind: notification.kind,
            title: notification.title,
            body: notification.body,
            event_date: notification.event_date,
            read: false,
            created_at: at,
        }))
    }

    async fn list(&self, user_id: i64, page: PageRequest) -> HyuResult<Slice<Notification>> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = ? \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(user_id)
            .bind(page.limit() as i64 + 1)
            .bind(page.offset() as i64)
            .fetch_all(self.pool.inner())
            .await?;

        let items = rows
            .into_iter()
            .map(Notification::try_from)
            .collect::<HyuResult<Vec<_>>>()?;
        Ok(Slice::from_overfetch(items, page))
    }

    async fn unread_count(&self, user_id: i64) -> HyuResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = FALSE")
            .bind(user_id)
            .fetch_one(self.pool.inner())
            .await?;
        Ok(count)
    }

    async fn find_by_id(&self, id: i64) -> HyuResult<Option<Notification>> {
        let sql = format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?");
        let row = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.inner())
            .await?;
        row.map(Notification::try_from).transpose()
    }

    async fn mark_read(&self, id: i64) -> HyuResult<()> {
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = ?")
            .bind(id)
            .execute(self.pool.inner())
            .await?;
        Ok(())
    }

    async fn mark_all_read(&self, user_id: i64, limit: usize) -> HyuResult<u64> {
        debug!("Marking up to {} notifications read for user {}", limit, user_id);

        let result = sqlx::query(
            r#"
            UPDATE notifications SET is_read = TRUE
            WHERE user_id = ? AND is_read = FALSE
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .execute(self.pool.inner())
        .await?;
        Ok(result.rows_affected())
    }
}

impl std::fmt::Debug for MySqlNotificationRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlNotificationRepository").finish_non_exhaustive()
    }
}
