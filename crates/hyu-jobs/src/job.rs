//! Job trait and execution context.

use crate::error::JobResult;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hyu_core::kst;
use uuid::Uuid;

/// Context handed to a job for one run.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Identifies this run in the logs.
    pub run_id: Uuid,
    pub job_name: String,
    /// The instant the run was due, or the trigger time for manual runs.
    pub fired_at: DateTime<Utc>,
}

impl JobContext {
    #[must_use]
    pub fn new(job_name: impl Into<String>, fired_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            job_name: job_name.into(),
            fired_at,
        }
    }

    /// KST calendar date of `fired_at`.
    #[must_use]
    pub fn kst_date(&self) -> NaiveDate {
        self.fired_at.with_timezone(&kst()).date_naive()
    }
}

/// A recurring unit of work driven by the [`Scheduler`](crate::Scheduler).
#[async_trait]
pub trait Job: Send + Sync {
    /// Stable name used for registration and logging.
    fn name(&self) -> &'static str;

    async fn execute(&self, ctx: JobContext) -> JobResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_kst_date_rolls_over_at_utc_15() {
        let before = JobContext::new("t", Utc.with_ymd_and_hms(2024, 5, 1, 14, 59, 0).unwrap());
        let after = JobContext::new("t", Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap());
        assert_eq!(before.kst_date(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(after.kst_date(), NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_ne!(before.run_id, after.run_id);
    }
}
