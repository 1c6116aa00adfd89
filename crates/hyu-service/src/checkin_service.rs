//! Daily mood check-ins and streaks.

use crate::dto::{CheckinRequest, CheckinResponse, CheckinStatsResponse, TodayResponse};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use hyu_core::text::{blank_to_none, truncate_chars};
use hyu_core::{first_day_of_month, last_day_of_month, HyuError, HyuResult, Interface, SharedClock};
use hyu_domain::{clamp_score, compute_streak, CheckinValues, NOTE_MAX_CHARS};
use hyu_repository::CheckinRepository;
use shaku::Component;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Days fetched per step while counting a streak backwards.
const STREAK_WINDOW_DAYS: u64 = 62;

/// Longest range `stats` will expand into per-day flags.
pub const MAX_STATS_SPAN_DAYS: i64 = 366;

#[async_trait]
pub trait CheckinService: Interface + Send + Sync {
    async fn today(&self, user_id: i64) -> HyuResult<TodayResponse>;

    /// Creates or updates today's row.
    async fn check_in(&self, user_id: i64, request: CheckinRequest) -> HyuResult<CheckinResponse>;

    /// Flags for every day in `from..=to`, at most
    /// [`MAX_STATS_SPAN_DAYS`] days.
    async fn stats(&self, user_id: i64, from: NaiveDate, to: NaiveDate) -> HyuResult<CheckinStatsResponse>;

    /// Stats for a `YYYY-MM` month, the current KST month when absent.
    async fn month_stats(&self, user_id: i64, month: Option<String>) -> HyuResult<CheckinStatsResponse>;
}

#[derive(Component)]
#[shaku(interface = CheckinService)]
pub struct CheckinServiceImpl {
    #[shaku(inject)]
    checkins: Arc<dyn CheckinRepository>,
    clock: SharedClock,
}

impl CheckinServiceImpl {
    pub fn new(checkins: Arc<dyn CheckinRepository>, clock: SharedClock) -> Self {
        Self { checkins, clock }
    }

    async fn streak(&self, user_id: i64, today: NaiveDate) -> HyuResult<u32> {
        let mut from = today;
        loop {
            let Some(start) = from.checked_sub_days(Days::new(STREAK_WINDOW_DAYS)) else {
                break;
            };
            from = start;
            let checked: BTreeSet<NaiveDate> = self
                .checkins
                .dates_between(user_id, from, today)
                .await?
                .into_iter()
                .collect();
            let streak = compute_streak(today, &checked);
            let span = (today - from).num_days() + 1;
            if i64::from(streak) < span {
                return Ok(streak);
            }
        }
        Ok(0)
    }
}

fn parse_month(value: &str) -> HyuResult<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
        .map_err(|_| HyuError::bad_request("month must be YYYY-MM"))
}

#[async_trait]
impl CheckinService for CheckinServiceImpl {
    async fn today(&self, user_id: i64) -> HyuResult<TodayResponse> {
        let today = self.clock.today();
        let checked = self.checkins.find(user_id, today).await?.is_some();
        let streak = self.streak(user_id, today).await?;
        Ok(TodayResponse {
            checked,
            should_prompt: !checked,
            date: today,
            streak,
        })
    }

    async fn check_in(&self, user_id: i64, request: CheckinRequest) -> HyuResult<CheckinResponse> {
        let today = self.clock.today();
        debug!("Check-in for user {} on {}", user_id, today);

        let values = CheckinValues {
            mood: clamp_score(request.mood),
            energy: clamp_score(request.energy),
            stress: clamp_score(request.stress),
            note: blank_to_none(request.note.as_deref()).map(|n| truncate_chars(&n, NOTE_MAX_CHARS)),
        };
        let created = self.checkins.upsert(user_id, today, &values).await?;
        let streak = self.streak(user_id, today).await?;

        if created {
            info!("User {} checked in for {} (streak {})", user_id, today, streak);
        }
        Ok(CheckinResponse {
            created,
            date: today,
            streak,
        })
    }

    async fn stats(&self, user_id: i64, from: NaiveDate, to: NaiveDate) -> HyuResult<CheckinStatsResponse> {
        if from > to {
            return Err(HyuError::bad_request("from must not be after to"));
        }
        if (to - from).num_days() + 1 > MAX_STATS_SPAN_DAYS {
            return Err(HyuError::bad_request(format!(
                "range must span at most {MAX_STATS_SPAN_DAYS} days"
            )));
        }
        let checked: BTreeSet<NaiveDate> = self
            .checkins
            .dates_between(user_id, from, to)
            .await?
            .into_iter()
            .collect();

        let days: BTreeMap<NaiveDate, bool> = from
            .iter_days()
            .take_while(|d| *d <= to)
            .map(|d| (d, checked.contains(&d)))
            .collect();
        let checked_days = days.values().filter(|c| **c).count();

        Ok(CheckinStatsResponse {
            streak: self.streak(user_id, self.clock.today()).await?,
            total_days: u32::try_from(days.len()).unwrap_or(u32::MAX),
            checked_days: u32::try_from(checked_days).unwrap_or(u32::MAX),
            days,
        })
    }

    async fn month_stats(&self, user_id: i64, month: Option<String>) -> HyuResult<CheckinStatsResponse> {
        let first = match month.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(value) => parse_month(value)?,
            None => first_day_of_month(self.clock.today()),
        };
        self.stats(user_id, first, last_day_of_month(first)).await
    }
}

impl std::fmt::Debug for CheckinServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckinServiceImpl").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{clock_at_kst, date};
    use hyu_repository::memory::InMemoryCheckinRepository;

    fn service(today: NaiveDate) -> (Arc<InMemoryCheckinRepository>, CheckinServiceImpl) {
        let clock = clock_at_kst(today, 9);
        let repo = Arc::new(InMemoryCheckinRepository::new(clock.clone()));
        (repo.clone(), CheckinServiceImpl::new(repo, clock))
    }

    async fn mark(repo: &InMemoryCheckinRepository, day: NaiveDate) {
        repo.upsert(1, day, &CheckinValues::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_today_prompts_until_checked() {
        let today = date(2024, 5, 15);
        let (repo, service) = service(today);
        mark(&repo, date(2024, 5, 14)).await;

        let before = service.today(1).await.unwrap();
        assert!(!before.checked);
        assert!(before.should_prompt);
        assert_eq!(before.streak, 0);

        let response = service.check_in(1, CheckinRequest::default()).await.unwrap();
        assert!(response.created);
        assert_eq!(response.streak, 2);

        let after = service.today(1).await.unwrap();
        assert!(after.checked);
        assert!(!after.should_prompt);
    }

    #[tokio::test]
    async fn test_check_in_normalises_values() {
        let today = date(2024, 5, 15);
        let (repo, service) = service(today);

        service
            .check_in(
                1,
                CheckinRequest {
                    mood: Some(9),
                    energy: Some(0),
                    stress: None,
                    note: Some(format!("  {}  ", "가".repeat(250))),
                },
            )
            .await
            .unwrap();

        let stored = repo.find(1, today).await.unwrap().unwrap();
        assert_eq!(stored.mood, Some(5));
        assert_eq!(stored.energy, Some(1));
        assert_eq!(stored.stress, None);
        assert_eq!(stored.note.unwrap().chars().count(), NOTE_MAX_CHARS);
    }

    #[tokio::test]
    async fn test_second_check_in_updates() {
        let today = date(2024, 5, 15);
        let (repo, service) = service(today);

        let first = service
            .check_in(
                1,
                CheckinRequest {
                    mood: Some(2),
                    note: Some("tired".to_string()),
                    ..CheckinRequest::default()
                },
            )
            .await
            .unwrap();
        assert!(first.created);

        let second = service
            .check_in(
                1,
                CheckinRequest {
                    mood: Some(4),
                    note: Some("   ".to_string()),
                    ..CheckinRequest::default()
                },
            )
            .await
            .unwrap();
        assert!(!second.created);
        assert_eq!(second.streak, 1);

        let stored = repo.find(1, today).await.unwrap().unwrap();
        assert_eq!(stored.mood, Some(4));
        assert_eq!(stored.note, None);
    }

    #[tokio::test]
    async fn test_streak_spans_several_windows() {
        let today = date(2024, 5, 15);
        let (repo, service) = service(today);
        let mut day = today;
        for _ in 0..100 {
            mark(&repo, day).await;
            day = day.pred_opt().unwrap();
        }
        assert_eq!(service.today(1).await.unwrap().streak, 100);
    }

    #[tokio::test]
    async fn test_stats_over_range() {
        let today = date(2024, 5, 15);
        let (repo, service) = service(today);
        mark(&repo, date(2024, 5, 2)).await;
        mark(&repo, date(2024, 5, 4)).await;

        let stats = service.stats(1, date(2024, 5, 1), date(2024, 5, 5)).await.unwrap();
        assert_eq!(stats.total_days, 5);
        assert_eq!(stats.checked_days, 2);
        assert_eq!(
            stats.days.into_iter().collect::<Vec<_>>(),
            vec![
                (date(2024, 5, 1), false),
                (date(2024, 5, 2), true),
                (date(2024, 5, 3), false),
                (date(2024, 5, 4), true),
                (date(2024, 5, 5), false),
            ]
        );

        let err = service.stats(1, date(2024, 5, 5), date(2024, 5, 1)).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_stats_span_is_capped() {
        let (_, service) = service(date(2024, 5, 15));

        let leap_year = service.stats(1, date(2024, 1, 1), date(2024, 12, 31)).await.unwrap();
        assert_eq!(leap_year.total_days, 366);

        let err = service.stats(1, date(2024, 1, 1), date(2025, 1, 1)).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "range must span at most 366 days");

        let err = service.stats(1, NaiveDate::MIN, NaiveDate::MAX).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_month_stats() {
        let today = date(2024, 2, 10);
        let (_, service) = service(today);

        let current = service.month_stats(1, None).await.unwrap();
        assert_eq!(current.total_days, 29);

        let april = service.month_stats(1, Some("2024-04".to_string())).await.unwrap();
        assert_eq!(april.total_days, 30);

        let err = service.month_stats(1, Some("2024/04".to_string())).await.unwrap_err();
        assert_eq!(err.to_string(), "month must be YYYY-MM");
    }
}
