//! MySQL weekly summary repository.

use crate::{traits::WeeklySummaryRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hyu_core::{HyuError, HyuResult};
use hyu_domain::{NewWeeklySummary, WeeklySummary};
use shaku::Component;
use std::sync::Arc;
use tracing::debug;

#[derive(Component, Clone)]
#[shaku(interface = WeeklySummaryRepository)]
pub struct MySqlWeeklySummaryRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlWeeklySummaryRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WeeklySummaryRepository for MySqlWeeklySummaryRepository {
    async fn exists(&self, user_id: i64, week_start: NaiveDate) -> HyuResult<bool> {
        let found: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM weekly_summaries WHERE user_id = ? AND week_start = ?")
                .bind(user_id)
                .bind(week_start)
                .fetch_optional(self.pool.inner())
                .await?;
        Ok(found.is_some())
    }

    async fn insert(&self, summary: NewWeeklySummary, at: DateTime<Utc>) -> HyuResult<WeeklySummary> {
        debug!("Storing weekly summary of user {} for {}", summary.user_id, summary.week_start);

        let result = sqlx::query(
            r#"
            INSERT INTO weekly_summaries (user_id, week_start, week_end, content, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(summary.user_id)
        .bind(summary.week_start)
        .bind(summary.week_end)
        .bind(&summary.content)
        .bind(at)
        .execute(self.pool.inner())
        .await?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|_| HyuError::internal("Weekly summary id out of range"))?;
        Ok(WeeklySummary {
            id,
            user_id: summary.user_id,
            week_start: summary.week_start,
            week_end: summary.week_end,
            content: summary.content,
            created_at: at,
        })
    }
}

impl std::fmt::Debug for MySqlWeeklySummaryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlWeeklySummaryRepository").finish_non_exhaustive()
    }
}
