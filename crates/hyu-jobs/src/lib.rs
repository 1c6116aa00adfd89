//! # Hyu Jobs
//!
//! In-process cron scheduler for the nightly work of the Hyu backend:
//! - missed-goal notifications (21:00 KST by default)
//! - KPI rollups and retention (00:15 KST by default)
//!
//! Schedules are evaluated against KST wall time. A job failure is logged
//! and the next slot runs as usual.

pub mod error;
pub mod job;
pub mod jobs;
pub mod scheduler;

pub use error::{JobError, JobResult};
pub use job::{Job, JobContext};
pub use jobs::{build_scheduler, MetricsRollupJob, MissedGoalJob, SchedulerServices, WeeklySummaryJob};
pub use scheduler::{ScheduledJob, ScheduledJobInfo, Scheduler, SchedulerStats};
