//! Cron scheduler for recurring jobs.
//!
//! Cron expressions have six fields (seconds first) and are evaluated in
//! KST. The scheduler polls once per [`POLL_INTERVAL`] and runs every
//! enabled job whose next fire time has passed.

use crate::error::{JobError, JobResult};
use crate::job::{Job, JobContext};
use chrono::{DateTime, Utc};
use cron::Schedule;
use hyu_core::{kst, SharedClock};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, error, info};
use uuid::Uuid;

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Scheduled job definition.
#[derive(Clone)]
pub struct ScheduledJob {
    /// Unique name for this scheduled job.
    pub name: String,

    /// Cron expression.
    pub cron: String,

    schedule: Schedule,

    job: Arc<dyn Job>,

    /// Next fire time; `None` when the expression has no future match.
    next_run: Option<DateTime<Utc>>,

    pub enabled: bool,
}

impl std::fmt::Debug for ScheduledJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledJob")
            .field("name", &self.name)
            .field("cron", &self.cron)
            .field("enabled", &self.enabled)
            .field("next_run", &self.next_run)
            .finish()
    }
}

impl ScheduledJob {
    /// Create a new scheduled job.
    pub fn new(cron_expr: &str, job: Arc<dyn Job>) -> JobResult<Self> {
        let schedule = Schedule::from_str(cron_expr)
            .map_err(|e| JobError::Configuration(format!("Invalid cron expression '{cron_expr}': {e}")))?;

        Ok(Self {
            name: job.name().to_string(),
            cron: cron_expr.to_string(),
            schedule,
            job,
            next_run: None,
            enabled: true,
        })
    }

    /// First fire time strictly after `from`, matched against KST wall time.
    pub fn next_run_from(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule
            .after(&from.with_timezone(&kst()))
            .next()
            .map(|at| at.with_timezone(&Utc))
    }
}

/// Scheduler statistics.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStats {
    pub id: String,
    pub running: bool,
    pub scheduled_jobs: usize,
    /// Runs started, successful or not.
    pub jobs_executed: u64,
    pub jobs_failed: u64,
}

/// Information about a scheduled job.
#[derive(Debug, Clone)]
pub struct ScheduledJobInfo {
    pub name: String,
    pub cron: String,
    pub enabled: bool,
    pub next_run: Option<DateTime<Utc>>,
}

/// In-process cron scheduler.
pub struct Scheduler {
    id: String,
    clock: SharedClock,
    jobs: RwLock<HashMap<String, ScheduledJob>>,
    shutdown_tx: watch::Sender<bool>,
    running: AtomicBool,
    jobs_executed: AtomicU64,
    jobs_failed: AtomicU64,
}

impl Scheduler {
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            id: format!("scheduler-{}", Uuid::new_v4()),
            clock,
            jobs: RwLock::new(HashMap::new()),
            shutdown_tx,
            running: AtomicBool::new(false),
            jobs_executed: AtomicU64::new(0),
            jobs_failed: AtomicU64::new(0),
        }
    }

    /// Register a scheduled job, replacing any job with the same name.
    pub fn register(&self, mut job: ScheduledJob) {
        job.next_run = job.next_run_from(self.clock.now());
        info!(job_name = %job.name, cron = %job.cron, next_run = ?job.next_run, "Registered scheduled job");
        self.jobs.write().insert(job.name.clone(), job);
    }

    /// Register a job under a cron expression.
    pub fn schedule(&self, cron_expr: &str, job: Arc<dyn Job>) -> JobResult<()> {
        self.register(ScheduledJob::new(cron_expr, job)?);
        Ok(())
    }

    /// Runs the poll loop until [`stop`](Self::stop) is called.
    pub async fn start(&self) -> JobResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(JobError::Scheduler("Scheduler already running".to_string()));
        }

        info!(scheduler_id = %self.id, jobs = self.jobs.read().len(), "Starting scheduler");

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut poll = interval(POLL_INTERVAL);

        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!(scheduler_id = %self.id, "Received shutdown signal");
                        break;
                    }
                }
                _ = poll.tick() => {
                    self.run_due(self.clock.now()).await;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(scheduler_id = %self.id, "Scheduler stopped");
        Ok(())
    }

    /// Stop the scheduler.
    pub fn stop(&self) {
        info!(scheduler_id = %self.id, "Stopping scheduler...");
        self.shutdown_tx.send_replace(true);
    }

    /// Runs every enabled job due at `now` and advances its next fire time.
    /// Returns the number of jobs started.
    pub(crate) async fn run_due(&self, now: DateTime<Utc>) -> usize {
        let due: Vec<(Arc<dyn Job>, DateTime<Utc>)> = {
            let mut jobs = self.jobs.write();
            jobs.values_mut()
                .filter(|job| job.enabled)
                .filter_map(|job| {
                    let at = job.next_run.filter(|at| *at <= now)?;
                    job.next_run = job.next_run_from(now);
                    Some((job.job.clone(), at))
                })
                .collect()
        };

        for (job, at) in &due {
            self.execute(job.as_ref(), *at).await;
        }
        due.len()
    }

    async fn execute(&self, job: &dyn Job, fired_at: DateTime<Utc>) -> bool {
        let ctx = JobContext::new(job.name(), fired_at);
        let run_id = ctx.run_id;
        debug!(job_name = job.name(), %run_id, "Running scheduled job");

        self.jobs_executed.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();
        match job.execute(ctx).await {
            Ok(()) => {
                info!(
                    job_name = job.name(),
                    %run_id,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Scheduled job finished"
                );
                true
            }
            Err(e) => {
                self.jobs_failed.fetch_add(1, Ordering::Relaxed);
                error!(job_name = job.name(), %run_id, error = %e, "Scheduled job failed");
                false
            }
        }
    }

    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            id: self.id.clone(),
            running: self.running.load(Ordering::SeqCst),
            scheduled_jobs: self.jobs.read().len(),
            jobs_executed: self.jobs_executed.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
        }
    }

    /// List all registered scheduled jobs, ordered by name.
    #[must_use]
    pub fn list_jobs(&self) -> Vec<ScheduledJobInfo> {
        let mut infos: Vec<ScheduledJobInfo> = self
            .jobs
            .read()
            .values()
            .map(|job| ScheduledJobInfo {
                name: job.name.clone(),
                cron: job.cron.clone(),
                enabled: job.enabled,
                next_run: job.next_run,
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Resumes a paused job. Returns `false` for an unknown name.
    pub fn enable_job(&self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    /// Pauses a job; manual triggers still run it.
    pub fn disable_job(&self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        match self.jobs.write().get_mut(name) {
            Some(job) => {
                job.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Run a registered job immediately, outside its schedule.
    pub async fn trigger_job(&self, name: &str) -> JobResult<()> {
        let job = self
            .jobs
            .read()
            .get(name)
            .map(|scheduled| scheduled.job.clone())
            .ok_or_else(|| JobError::NotFound(name.to_string()))?;

        if self.execute(job.as_ref(), self.clock.now()).await {
            Ok(())
        } else {
            Err(JobError::ExecutionFailed(format!("{name} failed, see logs")))
        }
    }
}
