//! Product analytics events feeding the KPI rollups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Well-known event names.
pub mod names {
    pub const RISK_DETECTED: &str = "risk_detected";
    pub const SELF_ASSESSMENT_COMPLETED: &str = "self_assessment_completed";
    pub const AI_CHAT_USER_MESSAGE: &str = "ai_chat_user_message";
}

/// Status of events that count towards activity.
pub const STATUS_OK: &str = "ok";

/// Event levels reported with `risk_detected`.
pub const RISK_EVENT_LEVELS: [&str; 4] = ["mild", "moderate", "risk", "high_risk"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub user_id: Option<i64>,
    pub event_name: String,
    pub event_time: DateTime<Utc>,
    pub status: String,
    pub level: Option<String>,
    pub session_id: Option<String>,
    pub idempotency_key: Option<String>,
    pub meta: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub user_id: Option<i64>,
    pub event_name: String,
    pub event_time: DateTime<Utc>,
    pub status: String,
    pub level: Option<String>,
    pub session_id: Option<String>,
    pub idempotency_key: Option<String>,
    pub meta: Option<serde_json::Value>,
}

impl NewEvent {
    /// An `ok` event for a user at `at`.
    #[must_use]
    pub fn ok(user_id: Option<i64>, name: &str, at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            event_name: name.to_string(),
            event_time: at,
            status: STATUS_OK.to_string(),
            level: None,
            session_id: None,
            idempotency_key: None,
            meta: None,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }
}
