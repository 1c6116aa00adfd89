//! MySQL goal repository.

use crate::{traits::GoalRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hyu_core::{HyuError, HyuResult};
use hyu_domain::{Goal, GoalDraft};
use shaku::Component;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

const GOAL_COLUMNS: &str =
    "g.id, g.user_id, g.title, g.start_date, g.end_date, g.alert_enabled, g.deleted, g.created_at, g.updated_at";

#[derive(Component, Clone)]
#[shaku(interface = GoalRepository)]
pub struct MySqlGoalRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlGoalRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GoalRow {
    id: i64,
    user_id: i64,
    title: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    alert_enabled: bool,
    deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<GoalRow> for Goal {
    fn from(row: GoalRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            start_date: row.start_date,
            end_date: row.end_date,
            alert_enabled: row.alert_enabled,
            deleted: row.deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl GoalRepository for MySqlGoalRepository {
    async fn create(&self, user_id: i64, draft: GoalDraft, at: DateTime<Utc>) -> HyuResult<Goal> {
        debug!("Creating goal for user {}: {}", user_id, draft.title);

        let result = sqlx::query(
            r#"
            INSERT INTO goals (user_id, title, start_date, end_date, alert_enabled, deleted, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, FALSE, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&draft.title)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(draft.alert_enabled)
        .bind(at)
        .bind(at)
        .execute(self.pool.inner())
        .await?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|_| HyuError::Internal("Goal id out of range".to_string()))?;
        Ok(Goal {
            id,
            user_id,
            title: draft.title,
            start_date: draft.start_date,
            end_date: draft.end_date,
            alert_enabled: draft.alert_enabled,
            deleted: false,
            created_at: at,
            updated_at: at,
        })
    }

    async fn find_owned(&self, id: i64, user_id: i64) -> HyuResult<Option<Goal>> {
        let sql = format!("SELECT {GOAL_COLUMNS} FROM goals g WHERE g.id = ? AND g.user_id = ? AND g.deleted = FALSE");
        let row = sqlx::query_as::<_, GoalRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool.inner())
            .await?;
        Ok(row.map(Goal::from))
    }

    async fn update(&self, goal: &Goal) -> HyuResult<()> {
        debug!("Updating goal {}", goal.id);

        sqlx::query(
            r#"
            UPDATE goals
            SET title = ?, start_date = ?, end_date = ?, alert_enabled = ?, deleted = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&goal.title)
        .bind(goal.start_date)
        .bind(goal.end_date)
        .bind(goal.alert_enabled)
        .bind(goal.deleted)
        .bind(goal.updated_at)
        .bind(goal.id)
        .execute(self.pool.inner())
        .await?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: i64) -> HyuResult<Vec<Goal>> {
        let sql = format!("SELECT {GOAL_COLUMNS} FROM goals g WHERE g.user_id = ? AND g.deleted = FALSE");
        let rows = sqlx::query_as::<_, GoalRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool.inner())
            .await?;
        Ok(rows.into_iter().map(Goal::from).collect())
    }

    async fn checked_goal_ids(&self, user_id: i64, day: NaiveDate) -> HyuResult<Vec<i64>> {
        let ids = sqlx::query_scalar(
            r#"
            SELECT c.goal_id
            FROM goal_checkins c
            JOIN goals g ON g.id = c.goal_id
            WHERE g.user_id = ? AND c.checkin_date = ?
            "#,
        )
        .bind(user_id)
        .bind(day)
        .fetch_all(self.pool.inner())
        .await?;
        Ok(ids)
    }

    async fn add_checkin(&self, goal_id: i64, day: NaiveDate) -> HyuResult<bool> {
        let result = sqlx::query("INSERT IGNORE INTO goal_checkins (goal_id, checkin_date) VALUES (?, ?)")
            .bind(goal_id)
            .bind(day)
            .execute(self.pool.inner())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_checkin(&self, goal_id: i64, day: NaiveDate) -> HyuResult<bool> {
        let result = sqlx::query("DELETE FROM goal_checkins WHERE goal_id = ? AND checkin_date = ?")
            .bind(goal_id)
            .bind(day)
            .execute(self.pool.inner())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn checkin_dates(&self, goal_id: i64, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<NaiveDate>> {
        let dates = sqlx::query_scalar(
            r#"
            SELECT checkin_date FROM goal_checkins
            WHERE goal_id = ? AND checkin_date BETWEEN ? AND ?
            ORDER BY checkin_date
            "#,
        )
        .bind(goal_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.pool.inner())
        .await?;
        Ok(dates)
    }

    async fn find_missed(&self, day: NaiveDate) -> HyuResult<Vec<Goal>> {
        debug!("Finding goals missed on {}", day);

        let sql = format!(
            "SELECT {GOAL_COLUMNS} FROM goals g \
             WHERE g.deleted = FALSE AND g.alert_enabled = TRUE AND g.start_date <= ? AND g.end_date >= ? \
             AND NOT EXISTS (SELECT 1 FROM goal_checkins c WHERE c.goal_id = g.id AND c.checkin_date = ?) \
             ORDER BY g.id"
        );
        let rows = sqlx::query_as::<_, GoalRow>(&sql)
            .bind(day)
            .bind(day)
            .bind(day)
            .fetch_all(self.pool.inner())
            .await?;
        Ok(rows.into_iter().map(Goal::from).collect())
    }
}

impl std::fmt::Debug for MySqlGoalRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlGoalRepository").finish_non_exhaustive()
    }
}
