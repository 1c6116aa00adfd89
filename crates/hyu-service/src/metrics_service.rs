//! KPI rollups and the admin reporting views over them.
//!
//! Every period is a KST calendar range converted to a half-open UTC
//! interval. Rollups are idempotent upserts, so re-running a period simply
//! refreshes its row.

use crate::dto::{
    DailyMetricsResponse, MessageResponse, MonthlyMetricsResponse, RetentionMatrixRow, RetentionResponse,
    RiskTimelinePoint, SummaryResponse, YearlyMetricsResponse,
};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use hyu_core::{
    first_day_of_month, kst_day_range_utc, kst_range_utc, kst_start_of_day, HyuError, HyuResult, Interface,
    SharedClock,
};
use hyu_domain::{retention_rate, DailyMetrics, MonthlyMetrics, RetentionRow, RetentionWindow, YearlyMetrics};
use hyu_repository::MetricsRepository;
use shaku::Component;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Days re-aggregated by the nightly run, counted back from yesterday.
pub const RECOMPUTE_LOOKBACK_DAYS: i64 = 3;

const WINDOWS: [RetentionWindow; 3] = [RetentionWindow::D1, RetentionWindow::D7, RetentionWindow::D30];

#[async_trait]
pub trait MetricsService: Interface + Send + Sync {
    /// Rolls up one KST day and the retention rows targeting it.
    async fn recompute_daily(&self, day: NaiveDate) -> HyuResult<MessageResponse>;

    /// Rolls up the month containing `month_start`.
    async fn recompute_monthly(&self, month_start: NaiveDate) -> HyuResult<MessageResponse>;

    async fn recompute_yearly(&self, year: i32) -> HyuResult<MessageResponse>;

    /// Nightly run: the last three days, this and last month, this and last year.
    async fn run_scheduled(&self) -> HyuResult<()>;

    async fn daily(&self, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<DailyMetricsResponse>>;

    async fn monthly(&self, from_month: NaiveDate, to_month: NaiveDate) -> HyuResult<Vec<MonthlyMetricsResponse>>;

    async fn yearly(&self, from_year: i32, to_year: i32) -> HyuResult<Vec<YearlyMetricsResponse>>;

    async fn risk_timeline(&self, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<RiskTimelinePoint>>;

    /// Rows ordered by cohort day, then D1, D7, D30.
    async fn retention(&self, cohort_from: NaiveDate, cohort_to: NaiveDate) -> HyuResult<Vec<RetentionResponse>>;

    async fn retention_matrix(&self, cohort_from: NaiveDate, cohort_to: NaiveDate)
        -> HyuResult<Vec<RetentionMatrixRow>>;

    async fn summary(&self, from: NaiveDate, to: NaiveDate) -> HyuResult<SummaryResponse>;
}

#[derive(Component)]
#[shaku(interface = MetricsService)]
pub struct MetricsServiceImpl {
    #[shaku(inject)]
    metrics: Arc<dyn MetricsRepository>,
    clock: SharedClock,
}

fn ensure_ordered<T: PartialOrd + std::fmt::Display>(from: T, to: T) -> HyuResult<()> {
    if from > to {
        return Err(HyuError::bad_request(format!("from ({from}) must not be after to ({to})")));
    }
    Ok(())
}

fn month_range_utc(month_start: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = first_day_of_month(month_start);
    let next = start.checked_add_months(Months::new(1)).unwrap_or(start);
    (kst_start_of_day(start), kst_start_of_day(next))
}

fn year_range_utc(year: i32) -> HyuResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let next = NaiveDate::from_ymd_opt(year + 1, 1, 1);
    match (start, next) {
        (Some(start), Some(next)) => Ok((kst_start_of_day(start), kst_start_of_day(next))),
        _ => Err(HyuError::bad_request(format!("year out of range: {year}"))),
    }
}

impl MetricsServiceImpl {
    pub fn new(metrics: Arc<dyn MetricsRepository>, clock: SharedClock) -> Self {
        Self { metrics, clock }
    }

    async fn rollup_day(&self, day: NaiveDate) -> HyuResult<()> {
        let (from, until) = kst_day_range_utc(day);
        let counts = self.metrics.aggregate(from, until).await?;
        self.metrics
            .upsert_daily(&DailyMetrics {
                day,
                counts,
                computed_at: self.clock.now(),
            })
            .await?;
        debug!("Daily metrics for {}: {} active users", day, counts.active_users);
        Ok(())
    }

    async fn rollup_retention(&self, target: NaiveDate) -> HyuResult<()> {
        let target_range = kst_day_range_utc(target);
        for window in WINDOWS {
            let days = i64::try_from(window.days()).unwrap_or(i64::MAX);
            let Some(cohort_day) = target.checked_sub_signed(Duration::days(days)) else {
                continue;
            };
            let (total, returned) = self
                .metrics
                .cohort_return(kst_day_range_utc(cohort_day), target_range)
                .await?;
            self.metrics
                .upsert_retention(&RetentionRow {
                    cohort_day,
                    window,
                    users_total: total,
                    users_returned: returned,
                    rate: retention_rate(returned, total),
                })
                .await?;
        }
        Ok(())
    }

    async fn rollup_month(&self, month_start: NaiveDate) -> HyuResult<()> {
        let month = first_day_of_month(month_start);
        let (from, until) = month_range_utc(month);
        let counts = self.metrics.aggregate(from, until).await?;
        self.metrics
            .upsert_monthly(&MonthlyMetrics {
                month,
                counts,
                computed_at: self.clock.now(),
            })
            .await
    }

    async fn rollup_year(&self, year: i32) -> HyuResult<()> {
        let (from, until) = year_range_utc(year)?;
        let counts = self.metrics.aggregate(from, until).await?;
        self.metrics
            .upsert_yearly(&YearlyMetrics {
                year,
                counts,
                computed_at: self.clock.now(),
            })
            .await
    }
}

#[async_trait]
impl MetricsService for MetricsServiceImpl {
    async fn recompute_daily(&self, day: NaiveDate) -> HyuResult<MessageResponse> {
        self.rollup_day(day).await?;
        self.rollup_retention(day).await?;
        Ok(MessageResponse::new(format!("Daily recompute done for {day}")))
    }

    async fn recompute_monthly(&self, month_start: NaiveDate) -> HyuResult<MessageResponse> {
        self.rollup_month(month_start).await?;
        Ok(MessageResponse::new(format!("Monthly recompute done for {month_start}")))
    }

    async fn recompute_yearly(&self, year: i32) -> HyuResult<MessageResponse> {
        self.rollup_year(year).await?;
        Ok(MessageResponse::new(format!("Yearly recompute done for {year}")))
    }

    async fn run_scheduled(&self) -> HyuResult<()> {
        let today = self.clock.today();

        for back in 1..=RECOMPUTE_LOOKBACK_DAYS {
            let day = today - Duration::days(back);
            self.rollup_day(day).await?;
            self.rollup_retention(day).await?;
        }

        let this_month = first_day_of_month(today);
        self.rollup_month(this_month).await?;
        if let Some(previous) = this_month.checked_sub_months(Months::new(1)) {
            self.rollup_month(previous).await?;
        }

        self.rollup_year(today.year()).await?;
        self.rollup_year(today.year() - 1).await?;

        info!("Metrics rollup finished for {}", today);
        Ok(())
    }

    async fn daily(&self, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<DailyMetricsResponse>> {
        ensure_ordered(from, to)?;
        Ok(self
            .metrics
            .daily_between(from, to)
            .await?
            .into_iter()
            .map(DailyMetricsResponse::from)
            .collect())
    }

    async fn monthly(&self, from_month: NaiveDate, to_month: NaiveDate) -> HyuResult<Vec<MonthlyMetricsResponse>> {
        let (from, to) = (first_day_of_month(from_month), first_day_of_month(to_month));
        ensure_ordered(from, to)?;
        Ok(self
            .metrics
            .monthly_between(from, to)
            .await?
            .into_iter()
            .map(MonthlyMetricsResponse::from)
            .collect())
    }

    async fn yearly(&self, from_year: i32, to_year: i32) -> HyuResult<Vec<YearlyMetricsResponse>> {
        ensure_ordered(from_year, to_year)?;
        Ok(self
            .metrics
            .yearly_between(from_year, to_year)
            .await?
            .into_iter()
            .map(YearlyMetricsResponse::from)
            .collect())
    }

    async fn risk_timeline(&self, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<RiskTimelinePoint>> {
        ensure_ordered(from, to)?;
        Ok(self
            .metrics
            .daily_between(from, to)
            .await?
            .into_iter()
            .map(|row| RiskTimelinePoint {
                day: row.day,
                high_risk_event_count: row.counts.high_risk_event_count,
            })
            .collect())
    }

    async fn retention(&self, cohort_from: NaiveDate, cohort_to: NaiveDate) -> HyuResult<Vec<RetentionResponse>> {
        ensure_ordered(cohort_from, cohort_to)?;
        let mut rows = self.metrics.retention_between(cohort_from, cohort_to).await?;
        rows.sort_by_key(|r| (r.cohort_day, r.window.rank()));
        Ok(rows.into_iter().map(RetentionResponse::from).collect())
    }

    async fn retention_matrix(
        &self,
        cohort_from: NaiveDate,
        cohort_to: NaiveDate,
    ) -> HyuResult<Vec<RetentionMatrixRow>> {
        ensure_ordered(cohort_from, cohort_to)?;
        let mut matrix: BTreeMap<NaiveDate, RetentionMatrixRow> = BTreeMap::new();

        for row in self.metrics.retention_between(cohort_from, cohort_to).await? {
            let entry = matrix.entry(row.cohort_day).or_insert_with(|| RetentionMatrixRow {
                cohort_day: row.cohort_day,
                ..RetentionMatrixRow::default()
            });
            entry.users_total = entry.users_total.max(row.users_total);
            match row.window {
                RetentionWindow::D1 => {
                    entry.d1_returned = row.users_returned;
                    entry.d1_rate = row.rate;
                }
                RetentionWindow::D7 => {
                    entry.d7_returned = row.users_returned;
                    entry.d7_rate = row.rate;
                }
                RetentionWindow::D30 => {
                    entry.d30_returned = row.users_returned;
                    entry.d30_rate = row.rate;
                }
            }
        }

        Ok(matrix.into_values().collect())
    }

    async fn summary(&self, from: NaiveDate, to: NaiveDate) -> HyuResult<SummaryResponse> {
        ensure_ordered(from, to)?;
        let (start, until) = kst_range_utc(from, to);
        Ok(self.metrics.summary(start, until).await?.into())
    }
}

impl std::fmt::Debug for MetricsServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsServiceImpl").finish_non_exhaustive()
    }
}
