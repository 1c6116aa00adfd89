use crate::traits::CheckinRepository;
use async_trait::async_trait;
use chrono::NaiveDate;
use hyu_core::{HyuResult, SharedClock};
use hyu_domain::{Checkin, CheckinValues};
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    rows: BTreeMap<(i64, NaiveDate), Checkin>,
}

/// Check-ins keyed by `(user, date)`.
#[derive(Debug, Default)]
pub struct InMemoryCheckinRepository {
    state: Mutex<State>,
    clock: SharedClock,
}

impl InMemoryCheckinRepository {
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            state: Mutex::default(),
            clock,
        }
    }
}

#[async_trait]
impl CheckinRepository for InMemoryCheckinRepository {
    async fn find(&self, user_id: i64, date: NaiveDate) -> HyuResult<Option<Checkin>> {
        Ok(self.state.lock().rows.get(&(user_id, date)).cloned())
    }

    async fn upsert(&self, user_id: i64, date: NaiveDate, values: &CheckinValues) -> HyuResult<bool> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        if let Some(row) = state.rows.get_mut(&(user_id, date)) {
            row.mood = values.mood;
            row.energy = values.energy;
            row.stress = values.stress;
            row.note.clone_from(&values.note);
            row.updated_at = now;
            return Ok(false);
        }

        state.next_id += 1;
        let row = Checkin {
            id: state.next_id,
            user_id,
            checkin_date: date,
            mood: values.mood,
            energy: values.energy,
            stress: values.stress,
            note: values.note.clone(),
            created_at: now,
            updated_at: now,
        };
        state.rows.insert((user_id, date), row);
        Ok(true)
    }

    async fn dates_between(&self, user_id: i64, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<NaiveDate>> {
        Ok(self
            .state
            .lock()
            .rows
            .range((user_id, from)..=(user_id, to))
            .map(|((_, date), _)| *date)
            .collect())
    }
}
