//! Monday recap of the previous week's check-ins.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const WEEKLY_SUMMARY_TITLE: &str = "주간 요약";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub id: i64,
    pub user_id: i64,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWeeklySummary {
    pub user_id: i64,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub content: String,
}

impl NewWeeklySummary {
    #[must_use]
    pub fn new(user_id: i64, week_start: NaiveDate, checked_days: usize) -> Self {
        let week_end = week_start + Duration::days(6);
        Self {
            user_id,
            week_start,
            week_end,
            content: format!("지난주 출석: {checked_days}/7일. 계속 화이팅이에요! ({week_start} ~ {week_end})"),
        }
    }
}

/// Monday to Sunday of the week before the one containing `today`.
#[must_use]
pub fn previous_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let this_monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let start = this_monday - Duration::weeks(1);
    (start, start + Duration::days(6))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    #[test]
    fn test_previous_week_is_monday_to_sunday() {
        // 2024-05-13 is a Monday
        assert_eq!(previous_week(d(5, 13)), (d(5, 6), d(5, 12)));
        assert_eq!(previous_week(d(5, 19)), (d(5, 6), d(5, 12)));
        assert_eq!(previous_week(d(5, 1)), (d(4, 22), d(4, 28)));
    }

    #[test]
    fn test_summary_content() {
        let summary = NewWeeklySummary::new(3, d(5, 6), 5);
        assert_eq!(summary.week_end, d(5, 12));
        assert_eq!(summary.content, "지난주 출석: 5/7일. 계속 화이팅이에요! (2024-05-06 ~ 2024-05-12)");
    }
}
