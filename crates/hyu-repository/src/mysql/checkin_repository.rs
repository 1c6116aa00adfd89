//! MySQL daily check-in repository.

use crate::{traits::CheckinRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hyu_core::HyuResult;
use hyu_domain::{Checkin, CheckinValues};
use shaku::Component;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

#[derive(Component, Clone)]
#[shaku(interface = CheckinRepository)]
pub struct MySqlCheckinRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlCheckinRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CheckinRow {
    id: i64,
    user_id: i64,
    checkin_date: NaiveDate,
    mood: Option<i16>,
    energy: Option<i16>,
    stress: Option<i16>,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CheckinRow> for Checkin {
    fn from(row: CheckinRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            checkin_date: row.checkin_date,
            mood: row.mood,
            energy: row.energy,
            stress: row.stress,
            note: row.note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl CheckinRepository for MySqlCheckinRepository {
    async fn find(&self, user_id: i64, date: NaiveDate) -> HyuResult<Option<Checkin>> {
        let row = sqlx::query_as::<_, CheckinRow>(
            r#"
            SELECT id, user_id, checkin_date, mood, energy, stress, note, created_at, updated_at
            FROM daily_checkins
            WHERE user_id = ? AND checkin_date = ?
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(Checkin::from))
    }

    async fn upsert(&self, user_id: i64, date: NaiveDate, values: &CheckinValues) -> HyuResult<bool> {
        debug!("Upserting check-in for user {} on {}", user_id, date);

        let existed = self.find(user_id, date).await?.is_some();
        sqlx::query(
            r#"
            INSERT INTO daily_checkins (user_id, checkin_date, mood, energy, stress, note)
            VALUES (?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                mood = VALUES(mood), energy = VALUES(energy),
                stress = VALUES(stress), note = VALUES(note),
                updated_at = CURRENT_TIMESTAMP(6)
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(values.mood)
        .bind(values.energy)
        .bind(values.stress)
        .bind(&values.note)
        .execute(self.pool.inner())
        .await?;

        Ok(!existed)
    }

    async fn dates_between(&self, user_id: i64, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<NaiveDate>> {
        let dates = sqlx::query_scalar::<_, NaiveDate>(
            r#"
            SELECT checkin_date FROM daily_checkins
            WHERE user_id = ? AND checkin_date BETWEEN ? AND ?
            ORDER BY checkin_date
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.pool.inner())
        .await?;

        Ok(dates)
    }
}

impl std::fmt::Debug for MySqlCheckinRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlCheckinRepository").finish_non_exhaustive()
    }
}
