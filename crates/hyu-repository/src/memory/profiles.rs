use crate::traits::ProfileRepository;
use async_trait::async_trait;
use hyu_core::HyuResult;
use hyu_domain::Profile;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct InMemoryProfileRepository {
    rows: Mutex<HashMap<i64, Profile>>,
}

impl InMemoryProfileRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find(&self, user_id: i64) -> HyuResult<Option<Profile>> {
        Ok(self.rows.lock().get(&user_id).cloned())
    }

    async fn save(&self, profile: &Profile) -> HyuResult<Profile> {
        let mut rows = self.rows.lock();
        let created_at = rows.get(&profile.user_id).map_or(profile.created_at, |p| p.created_at);
        let stored = Profile {
            created_at,
            ..profile.clone()
        };
        rows.insert(stored.user_id, stored.clone());
        Ok(stored)
    }

    async fn weekly_summary_subscribers(&self) -> HyuResult<Vec<i64>> {
        let mut ids: Vec<i64> = self
            .rows
            .lock()
            .values()
            .filter(|p| p.weekly_summary)
            .map(|p| p.user_id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
