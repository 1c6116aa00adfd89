use super::{contains_ci, paginate};
use crate::query::UserSearch;
use crate::traits::UserRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyu_core::{HyuError, HyuResult, Page, PageRequest, SharedClock};
use hyu_domain::{LoginRecord, NewUser, RiskLevel, RiskMode, User, UserState};
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    users: BTreeMap<i64, User>,
    logins: Vec<LoginRecord>,
}

/// User store keyed by id. Emails are unique case-insensitively.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    state: Mutex<State>,
    clock: SharedClock,
}

impl InMemoryUserRepository {
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            state: Mutex::default(),
            clock,
        }
    }

    /// Stores a fully built user, replacing any row with the same id.
    pub fn insert(&self, user: User) {
        let mut state = self.state.lock();
        state.next_id = state.next_id.max(user.id);
        state.users.insert(user.id, user);
    }

    #[must_use]
    pub fn all(&self) -> Vec<User> {
        self.state.lock().users.values().cloned().collect()
    }

    #[must_use]
    pub fn logins(&self) -> Vec<LoginRecord> {
        self.state.lock().logins.clone()
    }

    fn modify(&self, id: i64, f: impl FnOnce(&mut User)) -> HyuResult<()> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        let user = state.users.get_mut(&id).ok_or_else(|| HyuError::not_found("User", id))?;
        f(user);
        user.updated_at = now;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> HyuResult<Option<User>> {
        Ok(self.state.lock().users.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> HyuResult<Vec<User>> {
        let state = self.state.lock();
        Ok(ids.iter().filter_map(|id| state.users.get(id).cloned()).collect())
    }

    async fn find_by_email(&self, email: &str) -> HyuResult<Option<User>> {
        Ok(self
            .state
            .lock()
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn exists_by_email(&self, email: &str) -> HyuResult<bool> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn create(&self, user: NewUser) -> HyuResult<User> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        if state.users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(HyuError::conflict("Duplicate entry for email"));
        }
        state.next_id += 1;
        let created = User {
            id: state.next_id,
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            nickname: user.nickname,
            role: user.role,
            state: UserState::Active,
            suspend_until: None,
            risk_mode: None,
            risk_level: None,
            reset_token_hash: None,
            reset_expires_at: None,
            need_password_reset: false,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn search(&self, search: &UserSearch, page: PageRequest) -> HyuResult<Page<User>> {
        let mut rows: Vec<User> = self
            .state
            .lock()
            .users
            .values()
            .filter(|u| {
                search.q.as_deref().map_or(true, |q| {
                    contains_ci(&u.email, q) || contains_ci(&u.nickname, q) || contains_ci(&u.name, q)
                }) && search.role.map_or(true, |r| u.role == r)
                    && search.state.map_or(true, |s| u.state == s)
                    && search.risk_level.map_or(true, |l| u.risk_level == Some(l))
                    && search.joined_from.map_or(true, |from| u.created_at >= from)
                    && search.joined_until.map_or(true, |until| u.created_at < until)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(rows, page))
    }

    async fn update_state(
        &self,
        id: i64,
        state: UserState,
        suspend_until: Option<DateTime<Utc>>,
        risk_mode: Option<RiskMode>,
    ) -> HyuResult<()> {
        self.modify(id, |u| {
            u.state = state;
            u.suspend_until = suspend_until;
            if risk_mode.is_some() {
                u.risk_mode = risk_mode;
            }
        })
    }

    async fn update_risk_level(&self, id: i64, level: RiskLevel) -> HyuResult<()> {
        self.modify(id, |u| u.risk_level = Some(level))
    }

    async fn set_reset_token(&self, id: i64, digest: &str, expires_at: DateTime<Utc>) -> HyuResult<()> {
        self.modify(id, |u| {
            u.reset_token_hash = Some(digest.to_string());
            u.reset_expires_at = Some(expires_at);
            u.need_password_reset = true;
        })
    }

    async fn clear_reset_token(&self, id: i64) -> HyuResult<()> {
        self.modify(id, |u| {
            u.reset_token_hash = None;
            u.reset_expires_at = None;
            u.need_password_reset = false;
        })
    }

    async fn find_by_reset_digest(&self, digest: &str) -> HyuResult<Option<User>> {
        Ok(self
            .state
            .lock()
            .users
            .values()
            .find(|u| u.reset_token_hash.as_deref() == Some(digest))
            .cloned())
    }

    async fn complete_password_reset(&self, id: i64, password_hash: &str) -> HyuResult<()> {
        self.modify(id, |u| {
            u.password_hash = password_hash.to_string();
            u.reset_token_hash = None;
            u.reset_expires_at = None;
            u.need_password_reset = false;
        })
    }

    async fn record_login(&self, record: LoginRecord) -> HyuResult<()> {
        self.state.lock().logins.push(record);
        Ok(())
    }
}
