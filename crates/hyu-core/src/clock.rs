//! Business clock.
//!
//! Every notion of "today" in Hyu is a calendar date in Korea Standard Time.
//! KST has no daylight saving, so a fixed `+09:00` offset is exact.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Offset of Korea Standard Time from UTC, in seconds.
pub const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Returns the KST fixed offset.
#[must_use]
pub fn kst() -> FixedOffset {
    FixedOffset::east_opt(KST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Current instant in KST.
    fn now_kst(&self) -> DateTime<FixedOffset> {
        self.now().with_timezone(&kst())
    }

    /// Current KST calendar date.
    fn today(&self) -> NaiveDate {
        self.now_kst().date_naive()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Freezes the clock at the given KST wall time.
    #[must_use]
    pub fn at_kst(date: NaiveDate, hour: u32, minute: u32) -> Self {
        let local = date.and_hms_opt(hour, minute, 0).unwrap_or_default();
        Self(kst_to_utc(local))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Shared handle to a [`Clock`]. Defaults to the system clock.
#[derive(Clone)]
pub struct SharedClock(Arc<dyn Clock>);

impl SharedClock {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self(clock)
    }

    #[must_use]
    pub fn fixed(instant: DateTime<Utc>) -> Self {
        Self(Arc::new(FixedClock(instant)))
    }
}

impl Default for SharedClock {
    fn default() -> Self {
        Self(Arc::new(SystemClock))
    }
}

impl Deref for SharedClock {
    type Target = dyn Clock;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl fmt::Debug for SharedClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedClock").field(&self.0.now()).finish()
    }
}

/// Interprets a naive KST wall time as a UTC instant.
#[must_use]
pub fn kst_to_utc(local: chrono::NaiveDateTime) -> DateTime<Utc> {
    kst()
        .from_local_datetime(&local)
        .single()
        .map_or_else(|| local.and_utc(), |dt| dt.with_timezone(&Utc))
}

/// Start of a KST day as a UTC instant.
#[must_use]
pub fn kst_start_of_day(date: NaiveDate) -> DateTime<Utc> {
    kst_to_utc(date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// Half-open UTC interval `[start, end)` covering the KST dates `from..=to`.
#[must_use]
pub fn kst_range_utc(from: NaiveDate, to: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let end = to.succ_opt().unwrap_or(to);
    (kst_start_of_day(from), kst_start_of_day(end))
}

/// Half-open UTC interval covering one KST day.
#[must_use]
pub fn kst_day_range_utc(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    kst_range_utc(day, day)
}

/// First day of the month containing `date`.
#[must_use]
pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month containing `date`.
#[must_use]
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let first = first_day_of_month(date);
    first
        .checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_today_rolls_over_at_kst_midnight() {
        // 15:30 UTC is 00:30 the next day in Seoul
        let instant = Utc.with_ymd_and_hms(2024, 5, 31, 15, 30, 0).unwrap();
        let clock = FixedClock(instant);
        assert_eq!(clock.today(), date(2024, 6, 1));
        assert_eq!(clock.now_kst().hour(), 0);
    }

    #[test]
    fn test_fixed_clock_at_kst() {
        let clock = FixedClock::at_kst(date(2024, 1, 10), 21, 0);
        assert_eq!(clock.now(), Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap());
        assert_eq!(clock.today(), date(2024, 1, 10));
    }

    #[test]
    fn test_day_range_is_half_open_in_utc() {
        let (start, end) = kst_day_range_utc(date(2024, 3, 1));
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 29, 15, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap());
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(first_day_of_month(date(2024, 2, 17)), date(2024, 2, 1));
        assert_eq!(last_day_of_month(date(2024, 2, 17)), date(2024, 2, 29));
        assert_eq!(last_day_of_month(date(2023, 12, 5)), date(2023, 12, 31));
    }

    #[test]
    fn test_shared_clock_fixed() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = SharedClock::fixed(instant);
        assert_eq!(clock.now(), instant);
    }
}
