//! Fixtures shared by service tests.

use chrono::{DateTime, NaiveDate, Utc};
use hyu_core::{FixedClock, SharedClock};
use hyu_domain::{Role, User, UserState};
use std::sync::Arc;

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 2024-05-15 10:00 KST.
pub(crate) fn now() -> DateTime<Utc> {
    FixedClock::at_kst(date(2024, 5, 15), 10, 0).0
}

pub(crate) fn clock() -> SharedClock {
    SharedClock::fixed(now())
}

pub(crate) fn clock_at_kst(day: NaiveDate, hour: u32) -> SharedClock {
    SharedClock::new(Arc::new(FixedClock::at_kst(day, hour, 0)))
}

pub(crate) fn user(id: i64, email: &str) -> User {
    User {
        id,
        email: email.to_string(),
        password_hash: "hash".to_string(),
        name: format!("name{id}"),
        nickname: format!("nick{id}"),
        role: Role::User,
        state: UserState::Active,
        suspend_until: None,
        risk_mode: None,
        risk_level: None,
        reset_token_hash: None,
        reset_expires_at: None,
        need_password_reset: false,
        created_at: now(),
        updated_at: now(),
    }
}
