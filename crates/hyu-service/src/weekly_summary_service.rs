//! Monday recap of last week's check-ins for users who opted in.

use crate::clients::NotificationSender;
use async_trait::async_trait;
use chrono::NaiveDate;
use hyu_core::{HyuResult, Interface, SharedClock};
use hyu_domain::{previous_week, NewNotification, NewWeeklySummary};
use hyu_repository::{CheckinRepository, NotificationRepository, ProfileRepository, WeeklySummaryRepository};
use shaku::Component;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[async_trait]
pub trait WeeklySummaryService: Interface + Send + Sync {
    /// Summarises the week before `today` for every subscriber that has
    /// no summary for it yet. A failure for one user does not stop the
    /// others. Returns how many summaries were written.
    async fn send_weekly_summaries(&self, today: NaiveDate) -> HyuResult<usize>;
}

#[derive(Component)]
#[shaku(interface = WeeklySummaryService)]
pub struct WeeklySummaryServiceImpl {
    #[shaku(inject)]
    profiles: Arc<dyn ProfileRepository>,
    #[shaku(inject)]
    checkins: Arc<dyn CheckinRepository>,
    #[shaku(inject)]
    summaries: Arc<dyn WeeklySummaryRepository>,
    #[shaku(inject)]
    notifications: Arc<dyn NotificationRepository>,
    #[shaku(inject)]
    sender: Arc<dyn NotificationSender>,
    clock: SharedClock,
}

impl WeeklySummaryServiceImpl {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        checkins: Arc<dyn CheckinRepository>,
        summaries: Arc<dyn WeeklySummaryRepository>,
        notifications: Arc<dyn NotificationRepository>,
        sender: Arc<dyn NotificationSender>,
        clock: SharedClock,
    ) -> Self {
        Self {
            profiles,
            checkins,
            summaries,
            notifications,
            sender,
            clock,
        }
    }

    /// Returns `false` when the user already had a summary for the week.
    async fn summarise(&self, user_id: i64, week_start: NaiveDate, week_end: NaiveDate) -> HyuResult<bool> {
        if self.summaries.exists(user_id, week_start).await? {
            return Ok(false);
        }
        let checked = self.checkins.dates_between(user_id, week_start, week_end).await?.len();
        let now = self.clock.now();
        let summary = self
            .summaries
            .insert(NewWeeklySummary::new(user_id, week_start, checked), now)
            .await?;

        if let Some(notification) = self
            .notifications
            .insert_if_absent(NewNotification::weekly_summary(&summary), now)
            .await?
        {
            if let Err(e) = self.sender.send(&notification).await {
                warn!("Failed to deliver weekly summary {}: {}", notification.id, e);
            }
        }
        debug!("Weekly summary for user {}: {}/7 days", user_id, checked);
        Ok(true)
    }
}

#[async_trait]
impl WeeklySummaryService for WeeklySummaryServiceImpl {
    async fn send_weekly_summaries(&self, today: NaiveDate) -> HyuResult<usize> {
        let (week_start, week_end) = previous_week(today);
        let subscribers = self.profiles.weekly_summary_subscribers().await?;
        let mut written = 0;

        for user_id in &subscribers {
            match self.summarise(*user_id, week_start, week_end).await {
                Ok(true) => written += 1,
                Ok(false) => {}
                Err(e) => warn!("Weekly summary failed for user {} week {}: {}", user_id, week_start, e),
            }
        }

        info!(
            "Weekly summaries for {}: {} written for {} subscribers",
            week_start,
            written,
            subscribers.len()
        );
        Ok(written)
    }
}

impl std::fmt::Debug for WeeklySummaryServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeeklySummaryServiceImpl").finish_non_exhaustive()
    }
}
