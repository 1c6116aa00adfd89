//! MySQL KPI aggregation and rollup storage.
//!
//! Aggregates read the `events` and `users` tables over half-open UTC
//! intervals. Rollup rows are keyed by period and overwritten on recompute.

use super::parse_column;
use crate::{traits::MetricsRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hyu_core::{HyuError, HyuResult};
use hyu_domain::{
    names, DailyMetrics, MetricsSummary, MonthlyMetrics, PeriodCounts, RetentionRow, YearlyMetrics, STATUS_OK,
};
use shaku::Component;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

#[derive(Component, Clone)]
#[shaku(interface = MetricsRepository)]
pub struct MySqlMetricsRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlMetricsRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }

    async fn distinct_users(&self, event_name: Option<&str>, from: DateTime<Utc>, until: DateTime<Utc>) -> HyuResult<i64> {
        let count: i64 = match event_name {
            Some(name) => {
                sqlx::query_scalar(
                    r#"
                    SELECT COUNT(DISTINCT user_id) FROM events
                    WHERE status = ? AND event_name = ? AND event_time >= ? AND event_time < ?
                    "#,
                )
                .bind(STATUS_OK)
                .bind(name)
                .bind(from)
                .bind(until)
                .fetch_one(self.pool.inner())
                .await?
            }
            None => {
                sqlx::query_scalar(
                    r#"
                    SELECT COUNT(DISTINCT user_id) FROM events
                    WHERE status = ? AND event_time >= ? AND event_time < ?
                    "#,
                )
                .bind(STATUS_OK)
                .bind(from)
                .bind(until)
                .fetch_one(self.pool.inner())
                .await?
            }
        };
        Ok(count)
    }

    async fn count_events(&self, event_name: &str, from: DateTime<Utc>, until: DateTime<Utc>) -> HyuResult<i64> {
        let count = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM events
            WHERE status = ? AND event_name = ? AND event_time >= ? AND event_time < ?
            "#,
        )
        .bind(STATUS_OK)
        .bind(event_name)
        .bind(from)
        .bind(until)
        .fetch_one(self.pool.inner())
        .await?;
        Ok(count)
    }

    async fn count_high_risk(&self, source: Option<&str>, from: DateTime<Utc>, until: DateTime<Utc>) -> HyuResult<i64> {
        let mut sql = String::from(
            "SELECT COUNT(*) FROM events \
             WHERE status = ? AND event_name = ? AND level = 'high_risk' AND event_time >= ? AND event_time < ?",
        );
        if source.is_some() {
            sql.push_str(" AND JSON_UNQUOTE(JSON_EXTRACT(meta, '$.source')) = ?");
        }

        let mut query = sqlx::query_scalar(&sql)
            .bind(STATUS_OK)
            .bind(names::RISK_DETECTED)
            .bind(from)
            .bind(until);
        if let Some(source) = source {
            query = query.bind(source);
        }
        Ok(query.fetch_one(self.pool.inner()).await?)
    }
}

/// Column set shared by the three rollup tables.
#[derive(Debug, FromRow)]
struct CountsRow {
    active_users: i64,
    new_signups: i64,
    ai_active_users: i64,
    mild_event_count: i64,
    moderate_event_count: i64,
    risk_event_count: i64,
    high_risk_event_count: i64,
    checkin_count: i64,
    computed_at: DateTime<Utc>,
}

impl CountsRow {
    const fn counts(&self) -> PeriodCounts {
        PeriodCounts {
            active_users: self.active_users,
            new_signups: self.new_signups,
            ai_active_users: self.ai_active_users,
            mild_event_count: self.mild_event_count,
            moderate_event_count: self.moderate_event_count,
            risk_event_count: self.risk_event_count,
            high_risk_event_count: self.high_risk_event_count,
            checkin_count: self.checkin_count,
        }
    }
}

#[derive(Debug, FromRow)]
struct DailyRow {
    day: NaiveDate,
    #[sqlx(flatten)]
    counts: CountsRow,
}

#[derive(Debug, FromRow)]
struct MonthlyRow {
    month_start: NaiveDate,
    #[sqlx(flatten)]
    counts: CountsRow,
}

#[derive(Debug, FromRow)]
struct YearlyRow {
    year: i32,
    #[sqlx(flatten)]
    counts: CountsRow,
}

#[derive(Debug, FromRow)]
struct RetentionDbRow {
    cohort_day: NaiveDate,
    window_name: String,
    users_total: i64,
    users_returned: i64,
    rate: f64,
}

impl TryFrom<RetentionDbRow> for RetentionRow {
    type Error = HyuError;

    fn try_from(row: RetentionDbRow) -> Result<Self, Self::Error> {
        Ok(Self {
            cohort_day: row.cohort_day,
            window: parse_column("window_name", &row.window_name)?,
            users_total: row.users_total,
            users_returned: row.users_returned,
            rate: row.rate,
        })
    }
}

const COUNT_COLUMNS: &str = "new_signups, ai_active_users, mild_event_count, moderate_event_count, \
     risk_event_count, high_risk_event_count, checkin_count, computed_at";

/// Writes one rollup row; `key_column` and `active_column` differ per table.
macro_rules! upsert_rollup {
    ($pool:expr, $table:literal, $key_column:literal, $active_column:literal, $key:expr, $counts:expr, $at:expr) => {{
        let counts: &PeriodCounts = $counts;
        sqlx::query(concat!(
            "INSERT INTO ", $table, " (", $key_column, ", ", $active_column, ", new_signups, ai_active_users, ",
            "mild_event_count, moderate_event_count, risk_event_count, high_risk_event_count, checkin_count, computed_at) ",
            "VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) ",
            "ON DUPLICATE KEY UPDATE ", $active_column, " = VALUES(", $active_column, "), ",
            "new_signups = VALUES(new_signups), ai_active_users = VALUES(ai_active_users), ",
            "mild_event_count = VALUES(mild_event_count), moderate_event_count = VALUES(moderate_event_count), ",
            "risk_event_count = VALUES(risk_event_count), high_risk_event_count = VALUES(high_risk_event_count), ",
            "checkin_count = VALUES(checkin_count), computed_at = VALUES(computed_at)"
        ))
        .bind($key)
        .bind(counts.active_users)
        .bind(counts.new_signups)
        .bind(counts.ai_active_users)
        .bind(counts.mild_event_count)
        .bind(counts.moderate_event_count)
        .bind(counts.risk_event_count)
        .bind(counts.high_risk_event_count)
        .bind(counts.checkin_count)
        .bind($at)
        .execute($pool)
        .await?;
    }};
}

#[async_trait]
impl MetricsRepository for MySqlMetricsRepository {
    async fn aggregate(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> HyuResult<PeriodCounts> {
        debug!("Aggregating metrics over [{}, {})", from, until);

        let new_signups: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE created_at >= ? AND created_at < ?")
            .bind(from)
            .bind(until)
            .fetch_one(self.pool.inner())
            .await?;

        let risk_rows: Vec<(Option<String>, i64)> = sqlx::query_as(
            r#"
            SELECT level, COUNT(*) FROM events
            WHERE status = ? AND event_name = ? AND event_time >= ? AND event_time < ?
            GROUP BY level
            "#,
        )
        .bind(STATUS_OK)
        .bind(names::RISK_DETECTED)
        .bind(from)
        .bind(until)
        .fetch_all(self.pool.inner())
        .await?;

        let mut counts = PeriodCounts {
            active_users: self.distinct_users(None, from, until).await?,
            new_signups,
            ai_active_users: self.distinct_users(Some(names::AI_CHAT_USER_MESSAGE), from, until).await?,
            checkin_count: self.count_events(names::SELF_ASSESSMENT_COMPLETED, from, until).await?,
            ..PeriodCounts::default()
        };
        for (level, count) in risk_rows {
            if let Some(level) = level {
                counts.set_risk_count(&level.to_lowercase(), count);
            }
        }
        Ok(counts)
    }

    async fn cohort_return(
        &self,
        cohort: (DateTime<Utc>, DateTime<Utc>),
        target: (DateTime<Utc>, DateTime<Utc>),
    ) -> HyuResult<(i64, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE created_at >= ? AND created_at < ?")
            .bind(cohort.0)
            .bind(cohort.1)
            .fetch_one(self.pool.inner())
            .await?;

        let returned: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT e.user_id) FROM events e
            WHERE e.status = ? AND e.event_time >= ? AND e.event_time < ?
              AND e.user_id IN (SELECT u.id FROM users u WHERE u.created_at >= ? AND u.created_at < ?)
            "#,
        )
        .bind(STATUS_OK)
        .bind(target.0)
        .bind(target.1)
        .bind(cohort.0)
        .bind(cohort.1)
        .fetch_one(self.pool.inner())
        .await?;

        Ok((total, returned))
    }

    async fn upsert_daily(&self, row: &DailyMetrics) -> HyuResult<()> {
        debug!("Storing daily metrics for {}", row.day);
        upsert_rollup!(self.pool.inner(), "metrics_daily", "day", "dau", row.day, &row.counts, row.computed_at);
        Ok(())
    }

    async fn upsert_monthly(&self, row: &MonthlyMetrics) -> HyuResult<()> {
        debug!("Storing monthly metrics for {}", row.month);
        upsert_rollup!(
            self.pool.inner(),
            "metrics_monthly",
            "month_start",
            "mau",
            row.month,
            &row.counts,
            row.computed_at
        );
        Ok(())
    }

    async fn upsert_yearly(&self, row: &YearlyMetrics) -> HyuResult<()> {
        debug!("Storing yearly metrics for {}", row.year);
        upsert_rollup!(self.pool.inner(), "metrics_yearly", "year", "yau", row.year, &row.counts, row.computed_at);
        Ok(())
    }

    async fn upsert_retention(&self, row: &RetentionRow) -> HyuResult<()> {
        sqlx::query(
            r#"
            INSERT INTO metrics_retention (cohort_day, window_name, users_total, users_returned, rate, computed_at)
            VALUES (?, ?, ?, ?, ?, UTC_TIMESTAMP(6))
            ON DUPLICATE KEY UPDATE
                users_total = VALUES(users_total),
                users_returned = VALUES(users_returned),
                rate = VALUES(rate),
                computed_at = VALUES(computed_at)
            "#,
        )
        .bind(row.cohort_day)
        .bind(row.window.as_str())
        .bind(row.users_total)
        .bind(row.users_returned)
        .bind(row.rate)
        .execute(self.pool.inner())
        .await?;
        Ok(())
    }

    async fn daily_between(&self, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<DailyMetrics>> {
        let sql = format!(
            "SELECT day, dau AS active_users, {COUNT_COLUMNS} FROM metrics_daily \
             WHERE day BETWEEN ? AND ? ORDER BY day"
        );
        let rows = sqlx::query_as::<_, DailyRow>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(self.pool.inner())
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| DailyMetrics {
                day: r.day,
                counts: r.counts.counts(),
                computed_at: r.counts.computed_at,
            })
            .collect())
    }

    async fn monthly_between(&self, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<MonthlyMetrics>> {
        let sql = format!(
            "SELECT month_start, mau AS active_users, {COUNT_COLUMNS} FROM metrics_monthly \
             WHERE month_start BETWEEN ? AND ? ORDER BY month_start"
        );
        let rows = sqlx::query_as::<_, MonthlyRow>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(self.pool.inner())
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| MonthlyMetrics {
                month: r.month_start,
                counts: r.counts.counts(),
                computed_at: r.counts.computed_at,
            })
            .collect())
    }

    async fn yearly_between(&self, from: i32, to: i32) -> HyuResult<Vec<YearlyMetrics>> {
        let sql = format!(
            "SELECT year, yau AS active_users, {COUNT_COLUMNS} FROM metrics_yearly \
             WHERE year BETWEEN ? AND ? ORDER BY year"
        );
        let rows = sqlx::query_as::<_, YearlyRow>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(self.pool.inner())
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| YearlyMetrics {
                year: r.year,
                counts: r.counts.counts(),
                computed_at: r.counts.computed_at,
            })
            .collect())
    }

    async fn retention_between(&self, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<RetentionRow>> {
        let rows = sqlx::query_as::<_, RetentionDbRow>(
            r#"
            SELECT cohort_day, window_name, users_total, users_returned, rate
            FROM metrics_retention
            WHERE cohort_day BETWEEN ? AND ?
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(self.pool.inner())
        .await?;

        rows.into_iter().map(RetentionRow::try_from).collect()
    }

    async fn summary(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> HyuResult<MetricsSummary> {
        debug!("Computing metrics summary over [{}, {})", from, until);

        Ok(MetricsSummary {
            high_risk_total: self.count_high_risk(None, from, until).await?,
            high_risk_from_chat: self.count_high_risk(Some("chat"), from, until).await?,
            high_risk_from_assessment: self.count_high_risk(Some("assessment"), from, until).await?,
            ai_active_users: self.distinct_users(Some(names::AI_CHAT_USER_MESSAGE), from, until).await?,
            self_assessment_users: self
                .distinct_users(Some(names::SELF_ASSESSMENT_COMPLETED), from, until)
                .await?,
        })
    }
}

impl std::fmt::Debug for MySqlMetricsRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlMetricsRepository").finish_non_exhaustive()
    }
}
