use super::users::InMemoryUserRepository;
use crate::traits::{EventRepository, MetricsRepository};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hyu_core::{HyuError, HyuResult};
use hyu_domain::{
    names, DailyMetrics, Event, MetricsSummary, MonthlyMetrics, NewEvent, PeriodCounts, RetentionRow,
    RetentionWindow, YearlyMetrics, STATUS_OK,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Default)]
struct EventState {
    next_id: i64,
    rows: Vec<Event>,
}

/// Event log with a unique idempotency key.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    state: Mutex<EventState>,
}

impl InMemoryEventRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn all(&self) -> Vec<Event> {
        self.state.lock().rows.clone()
    }

    /// Names of the recorded events, in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.state.lock().rows.iter().map(|e| e.event_name.clone()).collect()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn insert(&self, event: NewEvent, at: DateTime<Utc>) -> HyuResult<Event> {
        let mut state = self.state.lock();
        if let Some(key) = &event.idempotency_key {
            if state.rows.iter().any(|e| e.idempotency_key.as_ref() == Some(key)) {
                return Err(HyuError::conflict("Duplicate entry for idempotency_key"));
            }
        }
        state.next_id += 1;
        let stored = Event {
            id: state.next_id,
            user_id: event.user_id,
            event_name: event.event_name,
            event_time: event.event_time,
            status: event.status,
            level: event.level,
            session_id: event.session_id,
            idempotency_key: event.idempotency_key,
            meta: event.meta,
            created_at: at,
        };
        state.rows.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_idempotency_key(&self, key: &str) -> HyuResult<Option<Event>> {
        Ok(self
            .state
            .lock()
            .rows
            .iter()
            .find(|e| e.idempotency_key.as_deref() == Some(key))
            .cloned())
    }
}

#[derive(Debug, Default)]
struct RollupState {
    daily: BTreeMap<NaiveDate, DailyMetrics>,
    monthly: BTreeMap<NaiveDate, MonthlyMetrics>,
    yearly: BTreeMap<i32, YearlyMetrics>,
    retention: BTreeMap<(NaiveDate, u8), RetentionRow>,
}

/// Aggregates over the in-memory event and user stores.
#[derive(Debug)]
pub struct InMemoryMetricsRepository {
    events: Arc<InMemoryEventRepository>,
    users: Arc<InMemoryUserRepository>,
    rollups: Mutex<RollupState>,
}

impl InMemoryMetricsRepository {
    #[must_use]
    pub fn new(events: Arc<InMemoryEventRepository>, users: Arc<InMemoryUserRepository>) -> Self {
        Self {
            events,
            users,
            rollups: Mutex::default(),
        }
    }

    fn ok_events(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> Vec<Event> {
        self.events
            .all()
            .into_iter()
            .filter(|e| e.status == STATUS_OK && e.event_time >= from && e.event_time < until)
            .collect()
    }

    fn signups(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> HashSet<i64> {
        self.users
            .all()
            .into_iter()
            .filter(|u| u.created_at >= from && u.created_at < until)
            .map(|u| u.id)
            .collect()
    }
}

fn distinct_users<'a>(events: impl Iterator<Item = &'a Event>) -> i64 {
    let users: HashSet<i64> = events.filter_map(|e| e.user_id).collect();
    users.len() as i64
}

fn high_risk<'a>(events: &'a [Event]) -> impl Iterator<Item = &'a Event> {
    events
        .iter()
        .filter(|e| e.event_name == names::RISK_DETECTED && e.level.as_deref() == Some("high_risk"))
}

fn source_of(event: &Event) -> Option<&str> {
    event.meta.as_ref()?.get("source")?.as_str()
}

#[async_trait]
impl MetricsRepository for InMemoryMetricsRepository {
    async fn aggregate(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> HyuResult<PeriodCounts> {
        let events = self.ok_events(from, until);
        let mut counts = PeriodCounts {
            active_users: distinct_users(events.iter()),
            new_signups: self.signups(from, until).len() as i64,
            ai_active_users: distinct_users(events.iter().filter(|e| e.event_name == names::AI_CHAT_USER_MESSAGE)),
            checkin_count: events
                .iter()
                .filter(|e| e.event_name == names::SELF_ASSESSMENT_COMPLETED)
                .count() as i64,
            ..PeriodCounts::default()
        };

        let mut by_level: BTreeMap<String, i64> = BTreeMap::new();
        for event in events.iter().filter(|e| e.event_name == names::RISK_DETECTED) {
            if let Some(level) = &event.level {
                *by_level.entry(level.to_lowercase()).or_default() += 1;
            }
        }
        for (level, count) in by_level {
            counts.set_risk_count(&level, count);
        }
        Ok(counts)
    }

    async fn cohort_return(
        &self,
        cohort: (DateTime<Utc>, DateTime<Utc>),
        target: (DateTime<Utc>, DateTime<Utc>),
    ) -> HyuResult<(i64, i64)> {
        let members = self.signups(cohort.0, cohort.1);
        let returned: HashSet<i64> = self
            .ok_events(target.0, target.1)
            .into_iter()
            .filter_map(|e| e.user_id)
            .filter(|id| members.contains(id))
            .collect();
        Ok((members.len() as i64, returned.len() as i64))
    }

    async fn upsert_daily(&self, row: &DailyMetrics) -> HyuResult<()> {
        self.rollups.lock().daily.insert(row.day, row.clone());
        Ok(())
    }

    async fn upsert_monthly(&self, row: &MonthlyMetrics) -> HyuResult<()> {
        self.rollups.lock().monthly.insert(row.month, row.clone());
        Ok(())
    }

    async fn upsert_yearly(&self, row: &YearlyMetrics) -> HyuResult<()> {
        self.rollups.lock().yearly.insert(row.year, row.clone());
        Ok(())
    }

    async fn upsert_retention(&self, row: &RetentionRow) -> HyuResult<()> {
        self.rollups
            .lock()
            .retention
            .insert((row.cohort_day, row.window.rank()), row.clone());
        Ok(())
    }

    async fn daily_between(&self, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<DailyMetrics>> {
        Ok(self.rollups.lock().daily.range(from..=to).map(|(_, r)| r.clone()).collect())
    }

    async fn monthly_between(&self, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<MonthlyMetrics>> {
        Ok(self.rollups.lock().monthly.range(from..=to).map(|(_, r)| r.clone()).collect())
    }

    async fn yearly_between(&self, from: i32, to: i32) -> HyuResult<Vec<YearlyMetrics>> {
        Ok(self.rollups.lock().yearly.range(from..=to).map(|(_, r)| r.clone()).collect())
    }

    async fn retention_between(&self, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<RetentionRow>> {
        let first = RetentionWindow::D1.rank();
        let last = RetentionWindow::D30.rank();
        Ok(self
            .rollups
            .lock()
            .retention
            .range((from, first)..=(to, last))
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn summary(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> HyuResult<MetricsSummary> {
        let events = self.ok_events(from, until);
        Ok(MetricsSummary {
            high_risk_total: high_risk(&events).count() as i64,
            high_risk_from_chat: high_risk(&events).filter(|e| source_of(e) == Some("chat")).count() as i64,
            high_risk_from_assessment: high_risk(&events)
                .filter(|e| source_of(e) == Some("assessment"))
                .count() as i64,
            ai_active_users: distinct_users(events.iter().filter(|e| e.event_name == names::AI_CHAT_USER_MESSAGE)),
            self_assessment_users: distinct_users(
                events.iter().filter(|e| e.event_name == names::SELF_ASSESSMENT_COMPLETED),
            ),
        })
    }
}
