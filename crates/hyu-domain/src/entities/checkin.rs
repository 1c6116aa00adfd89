//! Daily mood check-in.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Lowest accepted mood/energy/stress score.
pub const SCORE_MIN: i16 = 1;
/// Highest accepted mood/energy/stress score.
pub const SCORE_MAX: i16 = 5;
/// Maximum stored note length, in characters.
pub const NOTE_MAX_CHARS: usize = 200;

/// One user's check-in for one KST day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkin {
    pub id: i64,
    pub user_id: i64,
    pub checkin_date: NaiveDate,
    pub mood: Option<i16>,
    pub energy: Option<i16>,
    pub stress: Option<i16>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values written by a check-in upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckinValues {
    pub mood: Option<i16>,
    pub energy: Option<i16>,
    pub stress: Option<i16>,
    pub note: Option<String>,
}

/// Clamps a score into the 1..=5 scale.
#[must_use]
pub fn clamp_score(value: Option<i32>) -> Option<i16> {
    value.map(|v| {
        let clamped = v.clamp(i32::from(SCORE_MIN), i32::from(SCORE_MAX));
        i16::try_from(clamped).unwrap_or(SCORE_MIN)
    })
}

/// Counts consecutive checked days ending at `today`.
///
/// Returns 0 when `today` itself is not checked.
#[must_use]
pub fn compute_streak(today: NaiveDate, checked: &BTreeSet<NaiveDate>) -> u32 {
    let mut streak = 0;
    let mut cursor = today;
    while checked.contains(&cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(Some(0)), Some(1));
        assert_eq!(clamp_score(Some(3)), Some(3));
        assert_eq!(clamp_score(Some(42)), Some(5));
        assert_eq!(clamp_score(None), None);
    }

    #[test]
    fn test_streak_counts_back_from_today() {
        let checked: BTreeSet<_> = [d(7), d(8), d(9), d(10)].into_iter().collect();
        assert_eq!(compute_streak(d(10), &checked), 4);
    }

    #[test]
    fn test_streak_breaks_on_gap() {
        let checked: BTreeSet<_> = [d(5), d(6), d(8), d(9)].into_iter().collect();
        assert_eq!(compute_streak(d(9), &checked), 2);
    }

    #[test]
    fn test_streak_zero_when_today_unchecked() {
        let checked: BTreeSet<_> = [d(8), d(9)].into_iter().collect();
        assert_eq!(compute_streak(d(10), &checked), 0);
    }

    #[test]
    fn test_streak_crosses_month_boundary() {
        let feb_end = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let checked: BTreeSet<_> = [feb_end, d(1)].into_iter().collect();
        assert_eq!(compute_streak(d(1), &checked), 2);
    }
}
