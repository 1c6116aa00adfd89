//! Nightly KPI rollup.

use crate::error::JobResult;
use crate::job::{Job, JobContext};
use async_trait::async_trait;
use hyu_service::MetricsService;
use std::sync::Arc;
use tracing::info;

/// Recomputes the trailing daily rollups with retention, then the current
/// and previous month and year.
pub struct MetricsRollupJob {
    metrics: Arc<dyn MetricsService>,
}

impl MetricsRollupJob {
    pub const NAME: &'static str = "metrics-rollup";

    #[must_use]
    pub fn new(metrics: Arc<dyn MetricsService>) -> Self {
        Self { metrics }
    }
}

#[async_trait]
impl Job for MetricsRollupJob {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn execute(&self, ctx: JobContext) -> JobResult<()> {
        self.metrics.run_scheduled().await?;
        info!(run_id = %ctx.run_id, "Metrics rollup done");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use hyu_core::SharedClock;
    use hyu_repository::memory::{InMemoryEventRepository, InMemoryMetricsRepository, InMemoryUserRepository};
    use hyu_service::MetricsServiceImpl;

    #[tokio::test]
    async fn test_rolls_up_trailing_days() {
        // 00:15 KST on May 10th.
        let at = Utc.with_ymd_and_hms(2024, 5, 9, 15, 15, 0).unwrap();
        let clock = SharedClock::fixed(at);
        let repo = InMemoryMetricsRepository::new(
            Arc::new(InMemoryEventRepository::new()),
            Arc::new(InMemoryUserRepository::new(clock.clone())),
        );
        let service = Arc::new(MetricsServiceImpl::new(Arc::new(repo), clock));

        MetricsRollupJob::new(service.clone())
            .execute(JobContext::new(MetricsRollupJob::NAME, at))
            .await
            .unwrap();

        let d = |day| NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        let days: Vec<NaiveDate> = service.daily(d(1), d(10)).await.unwrap().iter().map(|r| r.day).collect();
        assert_eq!(days, vec![d(7), d(8), d(9)]);
    }
}
