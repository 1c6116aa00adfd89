//! Chat sessions with the wellness assistant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a user message, in characters.
pub const MESSAGE_MAX_CHARS: usize = 4000;
/// Number of recent messages handed to the assistant as history.
pub const HISTORY_WINDOW: usize = 50;

db_enum! {
    #[derive(Default)]
    pub enum SessionStatus {
        #[default]
        Open => "OPEN",
        Closed => "CLOSED",
    }
}

db_enum! {
    pub enum MessageRole {
        System => "SYSTEM",
        User => "USER",
        Assistant => "ASSISTANT",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: i64,
    pub status: SessionStatus,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: i64,
    pub session_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
