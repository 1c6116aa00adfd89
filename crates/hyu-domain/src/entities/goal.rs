//! Personal goals with daily check-ins.

use chrono::{DateTime, NaiveDate, Utc};
use hyu_core::{HyuError, HyuResult};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub alert_enabled: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    #[must_use]
    pub fn in_period(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }

    /// Listing bucket: 0 still to do today, 1 done today, 2 outside its period.
    #[must_use]
    pub fn bucket(&self, today: NaiveDate, checked_today: bool) -> u8 {
        match (self.in_period(today), checked_today) {
            (true, false) => 0,
            (true, true) => 1,
            (false, _) => 2,
        }
    }

    /// # Errors
    ///
    /// Bad request when `day` is outside the goal period.
    pub fn ensure_checkable(&self, day: NaiveDate) -> HyuResult<()> {
        if self.in_period(day) {
            Ok(())
        } else {
            Err(HyuError::bad_request("out of period"))
        }
    }
}

/// Validates a goal period.
///
/// # Errors
///
/// Bad request when the end precedes the start.
pub fn validate_period(start: NaiveDate, end: NaiveDate) -> HyuResult<()> {
    if end < start {
        return Err(HyuError::bad_request("endDate must not be before startDate"));
    }
    Ok(())
}

/// Listing order: bucket, then end date ascending, newest first, id descending.
#[must_use]
pub fn compare_for_listing(a: (&Goal, u8), b: (&Goal, u8)) -> Ordering {
    let key = |(g, bucket): (&Goal, u8)| (bucket, g.end_date, Reverse(g.created_at), Reverse(g.id));
    key(a).cmp(&key(b))
}

#[derive(Debug, Clone)]
pub struct GoalDraft {
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub alert_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalCheckin {
    pub id: i64,
    pub goal_id: i64,
    pub checkin_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn goal(id: i64, start: u32, end: u32) -> Goal {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::minutes(id);
        Goal {
            id,
            user_id: 1,
            title: format!("goal {id}"),
            start_date: d(start),
            end_date: d(end),
            alert_enabled: true,
            deleted: false,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_bucket() {
        let g = goal(1, 1, 10);
        assert_eq!(g.bucket(d(5), false), 0);
        assert_eq!(g.bucket(d(5), true), 1);
        assert_eq!(g.bucket(d(11), false), 2);
    }

    #[test]
    fn test_listing_order() {
        let todo_late = goal(1, 1, 20);
        let todo_soon = goal(2, 1, 10);
        let done = goal(3, 1, 8);
        let ended = goal(4, 1, 3);
        let today = d(5);

        let mut items = vec![
            (&ended, ended.bucket(today, false)),
            (&done, done.bucket(today, true)),
            (&todo_late, todo_late.bucket(today, false)),
            (&todo_soon, todo_soon.bucket(today, false)),
        ];
        items.sort_by(|a, b| compare_for_listing(*a, *b));
        let ids: Vec<i64> = items.iter().map(|(g, _)| g.id).collect();
        assert_eq!(ids, vec![2, 1, 3, 4]);
    }

    #[test]
    fn test_checkable_period() {
        let g = goal(1, 3, 4);
        assert!(g.ensure_checkable(d(3)).is_ok());
        assert_eq!(g.ensure_checkable(d(5)).unwrap_err().to_string(), "out of period");
        assert!(validate_period(d(4), d(3)).is_err());
    }
}
