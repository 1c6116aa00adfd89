//! Nightly reminder for goals left unchecked.

use crate::error::JobResult;
use crate::job::{Job, JobContext};
use async_trait::async_trait;
use hyu_service::NotificationService;
use std::sync::Arc;
use tracing::info;

/// Creates a `MISSED_DAILY` notification for each alert-enabled goal that
/// is active on the run's KST date and was not checked that day.
pub struct MissedGoalJob {
    notifications: Arc<dyn NotificationService>,
}

impl MissedGoalJob {
    pub const NAME: &'static str = "missed-goal-notifications";

    #[must_use]
    pub fn new(notifications: Arc<dyn NotificationService>) -> Self {
        Self { notifications }
    }
}

#[async_trait]
impl Job for MissedGoalJob {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn execute(&self, ctx: JobContext) -> JobResult<()> {
        let day = ctx.kst_date();
        let created = self.notifications.notify_missed_goals(day).await?;
        info!(run_id = %ctx.run_id, %day, created, "Missed-goal notifications created");
        Ok(())
    }
}
