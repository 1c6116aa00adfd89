use crate::traits::{GoalRepository, NotificationRepository};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hyu_core::{HyuError, HyuResult, PageRequest, Slice};
use hyu_domain::{Goal, GoalDraft, NewNotification, Notification};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
struct GoalState {
    next_id: i64,
    goals: BTreeMap<i64, Goal>,
    checkins: BTreeSet<(i64, NaiveDate)>,
}

#[derive(Debug, Default)]
pub struct InMemoryGoalRepository {
    state: Mutex<GoalState>,
}

impl InMemoryGoalRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GoalRepository for InMemoryGoalRepository {
    async fn create(&self, user_id: i64, draft: GoalDraft, at: DateTime<Utc>) -> HyuResult<Goal> {
        let mut state = self.state.lock();
        state.next_id += 1;
        let goal = Goal {
            id: state.next_id,
            user_id,
            title: draft.title,
            start_date: draft.start_date,
            end_date: draft.end_date,
            alert_enabled: draft.alert_enabled,
            deleted: false,
            created_at: at,
            updated_at: at,
        };
        state.goals.insert(goal.id, goal.clone());
        Ok(goal)
    }

    async fn find_owned(&self, id: i64, user_id: i64) -> HyuResult<Option<Goal>> {
        Ok(self
            .state
            .lock()
            .goals
            .get(&id)
            .filter(|g| g.user_id == user_id && !g.deleted)
            .cloned())
    }

    async fn update(&self, goal: &Goal) -> HyuResult<()> {
        let mut state = self.state.lock();
        let stored = state.goals.get_mut(&goal.id).ok_or_else(|| HyuError::not_found("Goal", goal.id))?;
        *stored = goal.clone();
        Ok(())
    }

    async fn list_for_user(&self, user_id: i64) -> HyuResult<Vec<Goal>> {
        Ok(self
            .state
            .lock()
            .goals
            .values()
            .filter(|g| g.user_id == user_id && !g.deleted)
            .cloned()
            .collect())
    }

    async fn checked_goal_ids(&self, user_id: i64, day: NaiveDate) -> HyuResult<Vec<i64>> {
        let state = self.state.lock();
        Ok(state
            .checkins
            .iter()
            .filter(|(goal_id, date)| *date == day && state.goals.get(goal_id).is_some_and(|g| g.user_id == user_id))
            .map(|(goal_id, _)| *goal_id)
            .collect())
    }

    async fn add_checkin(&self, goal_id: i64, day: NaiveDate) -> HyuResult<bool> {
        Ok(self.state.lock().checkins.insert((goal_id, day)))
    }

    async fn remove_checkin(&self, goal_id: i64, day: NaiveDate) -> HyuResult<bool> {
        Ok(self.state.lock().checkins.remove(&(goal_id, day)))
    }

    async fn checkin_dates(&self, goal_id: i64, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<NaiveDate>> {
        Ok(self
            .state
            .lock()
            .checkins
            .range((goal_id, from)..=(goal_id, to))
            .map(|(_, date)| *date)
            .collect())
    }

    async fn find_missed(&self, day: NaiveDate) -> HyuResult<Vec<Goal>> {
        let state = self.state.lock();
        Ok(state
            .goals
            .values()
            .filter(|g| {
                !g.deleted && g.alert_enabled && g.in_period(day) && !state.checkins.contains(&(g.id, day))
            })
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
struct NotificationState {
    next_id: i64,
    rows: BTreeMap<i64, Notification>,
}

#[derive(Debug, Default)]
pub struct InMemoryNotificationRepository {
    state: Mutex<NotificationState>,
}

impl InMemoryNotificationRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn newest_first(state: &NotificationState, user_id: i64) -> Vec<Notification> {
        let mut rows: Vec<Notification> = state.rows.values().filter(|n| n.user_id == user_id).cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert_if_absent(&self, notification: NewNotification, at: DateTime<Utc>) -> HyuResult<Option<Notification>> {
        let mut state = self.state.lock();
        let exists = state.rows.values().any(|n| {
            n.user_id == notification.user_id
                && n.goal_id == notification.goal_id
                && n.kind == notification.kind
                && n.event_date == notification.event_date
        });
        if exists {
            return Ok(None);
        }

        state.next_id += 1;
        let stored = Notification {
            id: state.next_id,
            user_id: notification.user_id,
            goal_id: notification.goal_id,
            kind: notification.kind,
            title: notification.title,
            body: notification.body,
            event_date: notification.event_date,
            read: false,
            created_at: at,
        };
        state.rows.insert(stored.id, stored.clone());
        Ok(Some(stored))
    }

    async fn list(&self, user_id: i64, page: PageRequest) -> HyuResult<Slice<Notification>> {
        let rows: Vec<Notification> = Self::newest_first(&self.state.lock(), user_id)
            .into_iter()
            .skip(page.offset())
            .take(page.limit() + 1)
            .collect();
        Ok(Slice::from_overfetch(rows, page))
    }

    async fn unread_count(&self, user_id: i64) -> HyuResult<i64> {
        let count = self
            .state
            .lock()
            .rows
            .values()
            .filter(|n| n.user_id == user_id && !n.read)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn find_by_id(&self, id: i64) -> HyuResult<Option<Notification>> {
        Ok(self.state.lock().rows.get(&id).cloned())
    }

    async fn mark_read(&self, id: i64) -> HyuResult<()> {
        if let Some(n) = self.state.lock().rows.get_mut(&id) {
            n.read = true;
        }
        Ok(())
    }

    async fn mark_all_read(&self, user_id: i64, limit: usize) -> HyuResult<u64> {
        let mut state = self.state.lock();
        let ids: Vec<i64> = Self::newest_first(&state, user_id)
            .into_iter()
            .filter(|n| !n.read)
            .take(limit)
            .map(|n| n.id)
            .collect();
        for id in &ids {
            if let Some(n) = state.rows.get_mut(id) {
                n.read = true;
            }
        }
        Ok(ids.len() as u64)
    }
}
