//! Event ingestion and KPI report DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use hyu_core::rules::not_blank;
use hyu_domain::{DailyMetrics, MetricsSummary, MonthlyMetrics, PeriodCounts, RetentionRow, RetentionWindow, YearlyMetrics};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Client-reported analytics event.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub user_id: Option<i64>,

    #[validate(
        custom(function = "not_blank", message = "eventName is required"),
        length(max = 64)
    )]
    pub event_name: String,

    /// ISO-8601 with an offset or `Z`; defaults to now.
    pub event_time: Option<String>,

    #[validate(length(max = 16))]
    pub status: Option<String>,

    #[validate(length(max = 16))]
    pub level: Option<String>,

    #[validate(length(max = 64))]
    pub session_id: Option<String>,

    #[schema(value_type = Option<Object>)]
    pub meta: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventAck {
    pub ok: bool,
    pub id: i64,
    pub dedup: bool,
}

/// Rollup counters shared by every period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountsDto {
    pub new_signups: i64,
    pub ai_active_users: i64,
    pub mild_event_count: i64,
    pub moderate_event_count: i64,
    pub risk_event_count: i64,
    pub high_risk_event_count: i64,
    pub checkin_count: i64,
}

impl From<PeriodCounts> for CountsDto {
    fn from(c: PeriodCounts) -> Self {
        Self {
            new_signups: c.new_signups,
            ai_active_users: c.ai_active_users,
            mild_event_count: c.mild_event_count,
            moderate_event_count: c.moderate_event_count,
            risk_event_count: c.risk_event_count,
            high_risk_event_count: c.high_risk_event_count,
            checkin_count: c.checkin_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetricsResponse {
    pub day: NaiveDate,
    pub daily_active_users: i64,
    #[serde(flatten)]
    pub counts: CountsDto,
    pub computed_at: DateTime<Utc>,
}

impl From<DailyMetrics> for DailyMetricsResponse {
    fn from(m: DailyMetrics) -> Self {
        Self {
            day: m.day,
            daily_active_users: m.counts.active_users,
            counts: m.counts.into(),
            computed_at: m.computed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyMetricsResponse {
    /// First day of the month.
    pub month: NaiveDate,
    pub monthly_active_users: i64,
    #[serde(flatten)]
    pub counts: CountsDto,
    pub computed_at: DateTime<Utc>,
}

impl From<MonthlyMetrics> for MonthlyMetricsResponse {
    fn from(m: MonthlyMetrics) -> Self {
        Self {
            month: m.month,
            monthly_active_users: m.counts.active_users,
            counts: m.counts.into(),
            computed_at: m.computed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct YearlyMetricsResponse {
    pub year: i32,
    pub yearly_active_users: i64,
    #[serde(flatten)]
    pub counts: CountsDto,
    pub computed_at: DateTime<Utc>,
}

impl From<YearlyMetrics> for YearlyMetricsResponse {
    fn from(m: YearlyMetrics) -> Self {
        Self {
            year: m.year,
            yearly_active_users: m.counts.active_users,
            counts: m.counts.into(),
            computed_at: m.computed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskTimelinePoint {
    pub day: NaiveDate,
    pub high_risk_event_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetentionResponse {
    pub cohort_day: NaiveDate,
    pub window: RetentionWindow,
    pub users_total: i64,
    pub users_returned: i64,
    pub rate: f64,
}

impl From<RetentionRow> for RetentionResponse {
    fn from(r: RetentionRow) -> Self {
        Self {
            cohort_day: r.cohort_day,
            window: r.window,
            users_total: r.users_total,
            users_returned: r.users_returned,
            rate: r.rate,
        }
    }
}

/// One cohort with every window pivoted into a single row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetentionMatrixRow {
    pub cohort_day: NaiveDate,
    pub users_total: i64,
    pub d1_returned: i64,
    pub d1_rate: f64,
    pub d7_returned: i64,
    pub d7_rate: f64,
    pub d30_returned: i64,
    pub d30_rate: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub high_risk_total: i64,
    pub high_risk_from_chat: i64,
    pub high_risk_from_assessment: i64,
    pub ai_active_users: i64,
    pub self_assessment_users: i64,
}

impl From<MetricsSummary> for SummaryResponse {
    fn from(s: MetricsSummary) -> Self {
        Self {
            high_risk_total: s.high_risk_total,
            high_risk_from_chat: s.high_risk_from_chat,
            high_risk_from_assessment: s.high_risk_from_assessment,
            ai_active_users: s.ai_active_users,
            self_assessment_users: s.self_assessment_users,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DayRangeParams {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MonthRangeParams {
    /// Any day of the first month.
    pub from_month: NaiveDate,
    /// Any day of the last month.
    pub to_month: NaiveDate,
}

#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct YearRangeParams {
    pub from_year: i32,
    pub to_year: i32,
}

#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CohortRangeParams {
    pub cohort_from: NaiveDate,
    pub cohort_to: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_daily_response_flattens_counts() {
        let row = DailyMetrics {
            day: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            counts: PeriodCounts {
                active_users: 12,
                high_risk_event_count: 2,
                ..PeriodCounts::default()
            },
            computed_at: Utc.with_ymd_and_hms(2024, 5, 2, 0, 15, 0).unwrap(),
        };
        let json = serde_json::to_value(DailyMetricsResponse::from(row)).unwrap();
        assert_eq!(json["dailyActiveUsers"], 12);
        assert_eq!(json["highRiskEventCount"], 2);
        assert_eq!(json["day"], "2024-05-01");
    }
}
