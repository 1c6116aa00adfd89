//! Monday check-in recap.

use crate::error::JobResult;
use crate::job::{Job, JobContext};
use async_trait::async_trait;
use hyu_service::WeeklySummaryService;
use std::sync::Arc;
use tracing::info;

/// Writes last week's check-in summary for every user who opted in and
/// sends it as an in-app notification.
pub struct WeeklySummaryJob {
    summaries: Arc<dyn WeeklySummaryService>,
}

impl WeeklySummaryJob {
    pub const NAME: &'static str = "weekly-summary";

    #[must_use]
    pub fn new(summaries: Arc<dyn WeeklySummaryService>) -> Self {
        Self { summaries }
    }
}

#[async_trait]
impl Job for WeeklySummaryJob {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn execute(&self, ctx: JobContext) -> JobResult<()> {
        let today = ctx.kst_date();
        let written = self.summaries.send_weekly_summaries(today).await?;
        info!(run_id = %ctx.run_id, %today, written, "Weekly summaries sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use hyu_core::SharedClock;
    use hyu_domain::{CheckinValues, Profile};
    use hyu_repository::memory::{
        InMemoryCheckinRepository, InMemoryNotificationRepository, InMemoryProfileRepository,
        InMemoryWeeklySummaryRepository,
    };
    use hyu_repository::{CheckinRepository, NotificationRepository, ProfileRepository, WeeklySummaryRepository};
    use hyu_service::{LoggingNotificationSender, WeeklySummaryServiceImpl};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[tokio::test]
    async fn test_monday_run_summarises_previous_week() {
        // 09:00 KST on Monday May 13th.
        let at = Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap();
        let clock = SharedClock::fixed(at);

        let profiles = Arc::new(InMemoryProfileRepository::new());
        let mut profile = Profile::default_for(5, at);
        profile.weekly_summary = true;
        profiles.save(&profile).await.unwrap();

        let checkins = Arc::new(InMemoryCheckinRepository::new(clock.clone()));
        checkins.upsert(5, d(10), &CheckinValues::default()).await.unwrap();
        let summaries = Arc::new(InMemoryWeeklySummaryRepository::new());
        let notifications = Arc::new(InMemoryNotificationRepository::new());

        let service = Arc::new(WeeklySummaryServiceImpl::new(
            profiles,
            checkins,
            summaries.clone(),
            notifications.clone(),
            Arc::new(LoggingNotificationSender::default()),
            clock,
        ));
        let job = WeeklySummaryJob::new(service);

        job.execute(JobContext::new(WeeklySummaryJob::NAME, at)).await.unwrap();
        job.execute(JobContext::new(WeeklySummaryJob::NAME, at)).await.unwrap();

        assert!(summaries.exists(5, d(6)).await.unwrap());
        assert_eq!(summaries.all().len(), 1);
        assert!(summaries.all()[0].content.starts_with("지난주 출석: 1/7일."));
        assert_eq!(notifications.unread_count(5).await.unwrap(), 1);
    }
}
