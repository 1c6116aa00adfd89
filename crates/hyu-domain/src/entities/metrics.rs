//! KPI rollup rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

db_enum! {
    /// Retention window measured from a signup cohort.
    pub enum RetentionWindow {
        D1 => "D1",
        D7 => "D7",
        D30 => "D30",
    }
}

impl RetentionWindow {
    #[must_use]
    pub const fn days(&self) -> u64 {
        match self {
            Self::D1 => 1,
            Self::D7 => 7,
            Self::D30 => 30,
        }
    }

    /// Sort position: D1, D7, D30.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::D1 => 0,
            Self::D7 => 1,
            Self::D30 => 2,
        }
    }
}

/// Aggregates computed for any period (day, month or year).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodCounts {
    pub active_users: i64,
    pub new_signups: i64,
    pub ai_active_users: i64,
    pub mild_event_count: i64,
    pub moderate_event_count: i64,
    pub risk_event_count: i64,
    pub high_risk_event_count: i64,
    pub checkin_count: i64,
}

impl PeriodCounts {
    /// Stores one `risk_detected` bucket by its event level.
    pub fn set_risk_count(&mut self, level: &str, count: i64) {
        match level {
            "mild" => self.mild_event_count = count,
            "moderate" => self.moderate_event_count = count,
            "risk" => self.risk_event_count = count,
            "high_risk" => self.high_risk_event_count = count,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetrics {
    pub day: NaiveDate,
    pub counts: PeriodCounts,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyMetrics {
    /// First day of the month.
    pub month: NaiveDate,
    pub counts: PeriodCounts,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyMetrics {
    pub year: i32,
    pub counts: PeriodCounts,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionRow {
    pub cohort_day: NaiveDate,
    pub window: RetentionWindow,
    pub users_total: i64,
    pub users_returned: i64,
    pub rate: f64,
}

/// High-risk signal breakdown and engagement over a date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub high_risk_total: i64,
    pub high_risk_from_chat: i64,
    pub high_risk_from_assessment: i64,
    pub ai_active_users: i64,
    pub self_assessment_users: i64,
}

/// Percentage of returned users, rounded half-up to two decimals.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn retention_rate(returned: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    // integer arithmetic in hundredths of a percent keeps the rounding exact
    let scaled = returned * 10_000;
    let hundredths = (scaled + total / 2) / total;
    hundredths as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retention_rate_rounding() {
        assert!((retention_rate(1, 3) - 33.33).abs() < f64::EPSILON);
        assert!((retention_rate(2, 3) - 66.67).abs() < f64::EPSILON);
        assert!((retention_rate(1, 8) - 12.5).abs() < f64::EPSILON);
        assert!((retention_rate(5, 5) - 100.0).abs() < f64::EPSILON);
        assert!(retention_rate(3, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_risk_bucket_assignment() {
        let mut counts = PeriodCounts::default();
        counts.set_risk_count("high_risk", 4);
        counts.set_risk_count("mild", 2);
        counts.set_risk_count("unknown", 9);
        assert_eq!(counts.high_risk_event_count, 4);
        assert_eq!(counts.mild_event_count, 2);
        assert_eq!(counts.risk_event_count, 0);
    }

    #[test]
    fn test_window_parse() {
        assert_eq!("d7".parse::<RetentionWindow>().unwrap(), RetentionWindow::D7);
        assert_eq!(RetentionWindow::D30.days(), 30);
    }
}
