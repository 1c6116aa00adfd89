//! Process-local token store used when Redis is disabled.

use super::RefreshSession;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
struct State {
    refresh: HashMap<String, (RefreshSession, DateTime<Utc>)>,
    by_user: HashMap<i64, HashSet<String>>,
    blacklist: HashMap<String, DateTime<Utc>>,
}

/// In-memory refresh sessions and blacklist with lazy expiry.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    state: Mutex<State>,
}

impl InMemoryTokenStore {
    pub fn store(&self, digest: &str, session: RefreshSession, ttl_secs: u64, now: DateTime<Utc>) {
        let expires = now + Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX / 1000));
        let mut state = self.state.lock();
        state.by_user.entry(session.user_id).or_default().insert(digest.to_string());
        state.refresh.insert(digest.to_string(), (session, expires));
    }

    pub fn find(&self, digest: &str, now: DateTime<Utc>) -> Option<RefreshSession> {
        let mut state = self.state.lock();
        match state.refresh.get(digest) {
            Some((session, expires)) if *expires > now => Some(session.clone()),
            Some(_) => {
                Self::remove(&mut state, digest);
                None
            }
            None => None,
        }
    }

    pub fn revoke(&self, digest: &str) -> bool {
        Self::remove(&mut self.state.lock(), digest).is_some()
    }

    /// Removes a refresh session and returns it if it was still live.
    pub fn take(&self, digest: &str, now: DateTime<Utc>) -> Option<RefreshSession> {
        let (session, expires) = Self::remove(&mut self.state.lock(), digest)?;
        (expires > now).then_some(session)
    }

    pub fn revoke_all(&self, user_id: i64) -> usize {
        let mut state = self.state.lock();
        let digests = state.by_user.remove(&user_id).unwrap_or_default();
        for digest in &digests {
            state.refresh.remove(digest);
        }
        digests.len()
    }

    pub fn blacklist(&self, jti: &str, until: DateTime<Utc>) {
        self.state.lock().blacklist.insert(jti.to_string(), until);
    }

    pub fn is_blacklisted(&self, jti: &str, now: DateTime<Utc>) -> bool {
        let mut state = self.state.lock();
        state.blacklist.retain(|_, until| *until > now);
        state.blacklist.contains_key(jti)
    }

    fn remove(state: &mut State, digest: &str) -> Option<(RefreshSession, DateTime<Utc>)> {
        let entry = state.refresh.remove(digest)?;
        let user_id = entry.0.user_id;
        if let Some(set) = state.by_user.get_mut(&user_id) {
            set.remove(digest);
            if set.is_empty() {
                state.by_user.remove(&user_id);
            }
        }
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyu_domain::Role;

    fn session(user_id: i64) -> RefreshSession {
        RefreshSession {
            user_id,
            role: Role::User,
            email: format!("u{user_id}@example.com"),
        }
    }

    #[test]
    fn test_expired_sessions_are_not_found() {
        let store = InMemoryTokenStore::default();
        let now = Utc::now();
        store.store("d1", session(1), 60, now);

        assert_eq!(store.find("d1", now + Duration::seconds(59)), Some(session(1)));
        assert_eq!(store.find("d1", now + Duration::seconds(61)), None);
        assert!(!store.revoke("d1"));
    }

    #[test]
    fn test_take_consumes_once() {
        let store = InMemoryTokenStore::default();
        let now = Utc::now();
        store.store("d1", session(1), 60, now);
        store.store("d2", session(1), 60, now);

        assert_eq!(store.take("d1", now), Some(session(1)));
        assert_eq!(store.take("d1", now), None);
        assert_eq!(store.take("d2", now + Duration::seconds(61)), None);
        assert!(store.find("d2", now).is_none());
    }

    #[test]
    fn test_revoke_all_only_touches_one_user() {
        let store = InMemoryTokenStore::default();
        let now = Utc::now();
        store.store("a", session(1), 60, now);
        store.store("b", session(1), 60, now);
        store.store("c", session(2), 60, now);

        assert_eq!(store.revoke_all(1), 2);
        assert!(store.find("a", now).is_none());
        assert!(store.find("c", now).is_some());
    }

    #[test]
    fn test_blacklist_expires() {
        let store = InMemoryTokenStore::default();
        let now = Utc::now();
        store.blacklist("jti", now + Duration::seconds(10));
        assert!(store.is_blacklisted("jti", now));
        assert!(!store.is_blacklisted("jti", now + Duration::seconds(11)));
    }
}
