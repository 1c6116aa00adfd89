//! MySQL chat session and message repository.

use super::{convert_all, parse_column};
use crate::{traits::ChatRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyu_core::{HyuError, HyuResult, Page, PageRequest};
use hyu_domain::{ChatMessage, ChatSession, MessageRole, SessionStatus};
use shaku::Component;
use sqlx::FromRow;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const SESSION_COLUMNS: &str = "id, user_id, status, title, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "m.id, m.session_id, m.role, m.content, m.created_at";

#[derive(Component, Clone)]
#[shaku(interface = ChatRepository)]
pub struct MySqlChatRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlChatRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

fn parse_uuid(value: &str) -> HyuResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| HyuError::Internal(format!("Invalid UUID in database: {e}")))
}

/// Sessions are stored with CHAR(36) ids.
#[derive(Debug, FromRow)]
struct SessionRow {
    id: String,
    user_id: i64,
    status: String,
    title: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for ChatSession {
    type Error = HyuError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&row.id)?,
            user_id: row.user_id,
            status: parse_column("status", &row.status)?,
            title: row.title,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct MessageRow {
    id: i64,
    session_id: String,
    role: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for ChatMessage {
    type Error = HyuError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            session_id: parse_uuid(&row.session_id)?,
            role: parse_column("role", &row.role)?,
            content: row.content,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ChatRepository for MySqlChatRepository {
    async fn create_session(&self, user_id: i64, title: Option<String>, at: DateTime<Utc>) -> HyuResult<ChatSession> {
        let session = ChatSession {
            id: Uuid::new_v4(),
            user_id,
            status: SessionStatus::Open,
            title,
            created_at: at,
            updated_at: at,
        };
        debug!("Creating chat session {} for user {}", session.id, user_id);

        sqlx::query(
            "INSERT INTO chat_sessions (id, user_id, status, title, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(session.id.to_string())
        .bind(session.user_id)
        .bind(session.status.as_str())
        .bind(&session.title)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(self.pool.inner())
        .await?;

        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> HyuResult<Option<ChatSession>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM chat_sessions WHERE id = ?");
        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(self.pool.inner())
            .await?;
        row.map(ChatSession::try_from).transpose()
    }

    async fn sessions_for_user(&self, user_id: i64, page: PageRequest) -> HyuResult<Page<ChatSession>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_sessions WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.pool.inner())
            .await?;

        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM chat_sessions WHERE user_id = ? ORDER BY updated_at DESC LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(user_id)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(self.pool.inner())
            .await?;

        Ok(Page::new(convert_all(rows)?, page.page, page.size, total as u64))
    }

    async fn touch_session(&self, id: Uuid, at: DateTime<Utc>) -> HyuResult<()> {
        sqlx::query("UPDATE chat_sessions SET updated_at = ? WHERE id = ?")
            .bind(at)
            .bind(id.to_string())
            .execute(self.pool.inner())
            .await?;
        Ok(())
    }

    async fn append_message(
        &self,
        session_id: Uuid,
        role: MessageRole,
        content: &str,
        at: DateTime<Utc>,
    ) -> HyuResult<ChatMessage> {
        let result = sqlx::query("INSERT INTO chat_messages (session_id, role, content, created_at) VALUES (?, ?, ?, ?)")
            .bind(session_id.to_string())
            .bind(role.as_str())
            .bind(content)
            .bind(at)
            .execute(self.pool.inner())
            .await?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|_| HyuError::Internal("Message id out of range".to_string()))?;
        Ok(ChatMessage {
            id,
            session_id,
            role,
            content: content.to_string(),
            created_at: at,
        })
    }

    async fn messages(&self, session_id: Uuid, page: PageRequest) -> HyuResult<Page<ChatMessage>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages WHERE session_id = ?")
            .bind(session_id.to_string())
            .fetch_one(self.pool.inner())
            .await?;

        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages m WHERE m.session_id = ? \
             ORDER BY m.created_at, m.id LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(session_id.to_string())
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(self.pool.inner())
            .await?;

        Ok(Page::new(convert_all(rows)?, page.page, page.size, total as u64))
    }

    async fn recent_history(&self, session_id: Uuid, limit: usize) -> HyuResult<Vec<ChatMessage>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages m WHERE m.session_id = ? AND m.role <> 'SYSTEM' \
             ORDER BY m.created_at DESC, m.id DESC LIMIT ?"
        );
        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(session_id.to_string())
            .bind(limit as i64)
            .fetch_all(self.pool.inner())
            .await?;

        let mut messages: Vec<ChatMessage> = convert_all(rows)?;
        messages.reverse();
        Ok(messages)
    }

    async fn system_message(&self, session_id: Uuid) -> HyuResult<Option<ChatMessage>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages m WHERE m.session_id = ? AND m.role = 'SYSTEM' \
             ORDER BY m.id LIMIT 1"
        );
        let row = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(session_id.to_string())
            .fetch_optional(self.pool.inner())
            .await?;
        row.map(ChatMessage::try_from).transpose()
    }

    async fn recent_for_user(&self, user_id: i64, limit: usize) -> HyuResult<Vec<ChatMessage>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages m \
             JOIN chat_sessions s ON s.id = m.session_id \
             WHERE s.user_id = ? AND m.role IN ('USER', 'ASSISTANT') \
             ORDER BY m.created_at DESC, m.id DESC LIMIT ?"
        );
        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(user_id)
            .bind(limit as i64)
            .fetch_all(self.pool.inner())
            .await?;
        convert_all(rows)
    }

    async fn session_previews(&self, user_id: i64) -> HyuResult<Vec<(ChatSession, Option<ChatMessage>)>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM chat_sessions WHERE user_id = ? ORDER BY updated_at DESC");
        let sessions: Vec<ChatSession> = convert_all(
            sqlx::query_as::<_, SessionRow>(&sql)
                .bind(user_id)
                .fetch_all(self.pool.inner())
                .await?,
        )?;

        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages m \
             JOIN (SELECT mm.session_id, MAX(mm.id) AS last_id FROM chat_messages mm \
                   JOIN chat_sessions ss ON ss.id = mm.session_id \
                   WHERE ss.user_id = ? GROUP BY mm.session_id) latest ON latest.last_id = m.id"
        );
        let latest: Vec<ChatMessage> = convert_all(
            sqlx::query_as::<_, MessageRow>(&sql)
                .bind(user_id)
                .fetch_all(self.pool.inner())
                .await?,
        )?;
        let mut by_session: HashMap<Uuid, ChatMessage> = latest.into_iter().map(|m| (m.session_id, m)).collect();

        Ok(sessions
            .into_iter()
            .map(|s| {
                let last = by_session.remove(&s.id);
                (s, last)
            })
            .collect())
    }
}

impl std::fmt::Debug for MySqlChatRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlChatRepository").finish_non_exhaustive()
    }
}
