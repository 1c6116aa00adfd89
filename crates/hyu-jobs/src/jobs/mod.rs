//! The scheduled jobs and their registration.

mod metrics_rollup;
mod missed_goal;
mod weekly_summary;

pub use metrics_rollup::MetricsRollupJob;
pub use missed_goal::MissedGoalJob;
pub use weekly_summary::WeeklySummaryJob;

use crate::error::JobResult;
use crate::scheduler::Scheduler;
use hyu_config::SchedulerConfig;
use hyu_core::SharedClock;
use hyu_service::{MetricsService, NotificationService, WeeklySummaryService};
use std::sync::Arc;

/// Services the scheduled jobs call into.
#[derive(Clone)]
pub struct SchedulerServices {
    pub notifications: Arc<dyn NotificationService>,
    pub metrics: Arc<dyn MetricsService>,
    pub weekly_summaries: Arc<dyn WeeklySummaryService>,
}

/// Builds a scheduler with every job registered under its configured
/// cron expression.
pub fn build_scheduler(config: &SchedulerConfig, clock: SharedClock, services: SchedulerServices) -> JobResult<Scheduler> {
    let scheduler = Scheduler::new(clock);
    scheduler.schedule(
        &config.missed_goal_cron,
        Arc::new(MissedGoalJob::new(services.notifications)),
    )?;
    scheduler.schedule(&config.metrics_cron, Arc::new(MetricsRollupJob::new(services.metrics)))?;
    scheduler.schedule(
        &config.weekly_summary_cron,
        Arc::new(WeeklySummaryJob::new(services.weekly_summaries)),
    )?;
    Ok(scheduler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JobError;
    use chrono::{TimeZone, Utc};
    use hyu_repository::memory::{
        InMemoryCheckinRepository, InMemoryEventRepository, InMemoryGoalRepository, InMemoryMetricsRepository,
        InMemoryNotificationRepository, InMemoryProfileRepository, InMemoryUserRepository,
        InMemoryWeeklySummaryRepository,
    };
    use hyu_service::{LoggingNotificationSender, MetricsServiceImpl, NotificationServiceImpl, WeeklySummaryServiceImpl};

    fn services(clock: &SharedClock) -> SchedulerServices {
        let notification_repo = Arc::new(InMemoryNotificationRepository::new());
        let notifications = NotificationServiceImpl::new(
            notification_repo.clone(),
            Arc::new(InMemoryGoalRepository::new()),
            Arc::new(LoggingNotificationSender::default()),
            clock.clone(),
        );
        let weekly_summaries = WeeklySummaryServiceImpl::new(
            Arc::new(InMemoryProfileRepository::new()),
            Arc::new(InMemoryCheckinRepository::new(clock.clone())),
            Arc::new(InMemoryWeeklySummaryRepository::new()),
            notification_repo,
            Arc::new(LoggingNotificationSender::default()),
            clock.clone(),
        );
        let metrics = MetricsServiceImpl::new(
            Arc::new(InMemoryMetricsRepository::new(
                Arc::new(InMemoryEventRepository::new()),
                Arc::new(InMemoryUserRepository::new(clock.clone())),
            )),
            clock.clone(),
        );
        SchedulerServices {
            notifications: Arc::new(notifications),
            metrics: Arc::new(metrics),
            weekly_summaries: Arc::new(weekly_summaries),
        }
    }

    #[test]
    fn test_default_schedule() {
        let clock = SharedClock::fixed(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        let scheduler = build_scheduler(&SchedulerConfig::default(), clock.clone(), services(&clock)).unwrap();

        let jobs = scheduler.list_jobs();
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[0].name, MetricsRollupJob::NAME);
        assert_eq!(jobs[0].next_run, Some(Utc.with_ymd_and_hms(2024, 5, 1, 15, 15, 0).unwrap()));
        assert_eq!(jobs[1].name, MissedGoalJob::NAME);
        assert_eq!(jobs[1].next_run, Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()));
        // 2024-05-01 is a Wednesday; next Monday 09:00 KST is May 6th 00:00 UTC.
        assert_eq!(jobs[2].name, WeeklySummaryJob::NAME);
        assert_eq!(jobs[2].next_run, Some(Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_bad_cron_fails_the_build() {
        let clock = SharedClock::default();
        let config = SchedulerConfig {
            metrics_cron: "nightly".to_string(),
            ..SchedulerConfig::default()
        };
        let err = build_scheduler(&config, clock.clone(), services(&clock)).err().unwrap();
        assert!(matches!(err, JobError::Configuration(_)));
    }
}
