//! Chat session and AI proxy DTOs.

use chrono::{DateTime, Utc};
use hyu_core::rules::not_blank;
use hyu_domain::{ChatMessage, ChatSession, MessageRole, SessionStatus};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub id: Uuid,
    pub status: SessionStatus,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ChatSession> for SessionDto {
    fn from(s: ChatSession) -> Self {
        Self {
            id: s.id,
            status: s.status,
            title: s.title,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: i64,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<ChatMessage> for MessageDto {
    fn from(m: ChatMessage) -> Self {
        Self {
            id: m.id,
            role: m.role,
            content: m.content,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SendMessageRequest {
    #[validate(
        custom(function = "not_blank", message = "Content must not be blank"),
        length(max = 4000, message = "Content cannot exceed 4000 characters")
    )]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatSmokeRequest {
    #[validate(custom(function = "not_blank", message = "Message must not be blank"))]
    pub message: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeSmokeRequest {
    #[validate(custom(function = "not_blank", message = "Text must not be blank"))]
    pub text: String,
    pub session_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_rejects_blank_and_oversized() {
        let blank = SendMessageRequest {
            content: "   ".to_string(),
        };
        assert!(blank.validate().is_err());

        let long = SendMessageRequest {
            content: "가".repeat(4001),
        };
        assert!(long.validate().is_err());

        let ok = SendMessageRequest {
            content: "오늘 좀 지쳤어요".to_string(),
        };
        assert!(ok.validate().is_ok());
    }
}
