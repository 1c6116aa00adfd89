use crate::traits::WeeklySummaryRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hyu_core::{HyuError, HyuResult};
use hyu_domain::{NewWeeklySummary, WeeklySummary};
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    rows: BTreeMap<(i64, NaiveDate), WeeklySummary>,
}

/// Weekly summaries keyed by `(user, week_start)`.
#[derive(Debug, Default)]
pub struct InMemoryWeeklySummaryRepository {
    state: Mutex<State>,
}

impl InMemoryWeeklySummaryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored summary, ordered by user then week.
    #[must_use]
    pub fn all(&self) -> Vec<WeeklySummary> {
        self.state.lock().rows.values().cloned().collect()
    }
}

#[async_trait]
impl WeeklySummaryRepository for InMemoryWeeklySummaryRepository {
    async fn exists(&self, user_id: i64, week_start: NaiveDate) -> HyuResult<bool> {
        Ok(self.state.lock().rows.contains_key(&(user_id, week_start)))
    }

    async fn insert(&self, summary: NewWeeklySummary, at: DateTime<Utc>) -> HyuResult<WeeklySummary> {
        let mut state = self.state.lock();
        let key = (summary.user_id, summary.week_start);
        if state.rows.contains_key(&key) {
            return Err(HyuError::conflict("Duplicate weekly summary"));
        }

        state.next_id += 1;
        let stored = WeeklySummary {
            id: state.next_id,
            user_id: summary.user_id,
            week_start: summary.week_start,
            week_end: summary.week_end,
            content: summary.content,
            created_at: at,
        };
        state.rows.insert(key, stored.clone());
        Ok(stored)
    }
}
