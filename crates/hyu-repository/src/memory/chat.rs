use super::paginate;
use crate::traits::ChatRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyu_core::{HyuError, HyuResult, Page, PageRequest};
use hyu_domain::{ChatMessage, ChatSession, MessageRole, SessionStatus};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    next_message_id: i64,
    sessions: HashMap<Uuid, ChatSession>,
    /// Messages in insertion order.
    messages: Vec<ChatMessage>,
}

impl State {
    fn sessions_of(&self, user_id: i64) -> Vec<ChatSession> {
        let mut sessions: Vec<ChatSession> = self.sessions.values().filter(|s| s.user_id == user_id).cloned().collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions
    }
}

#[derive(Debug, Default)]
pub struct InMemoryChatRepository {
    state: Mutex<State>,
}

impl InMemoryChatRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn create_session(&self, user_id: i64, title: Option<String>, at: DateTime<Utc>) -> HyuResult<ChatSession> {
        let session = ChatSession {
            id: Uuid::new_v4(),
            user_id,
            status: SessionStatus::Open,
            title,
            created_at: at,
            updated_at: at,
        };
        self.state.lock().sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> HyuResult<Option<ChatSession>> {
        Ok(self.state.lock().sessions.get(&id).cloned())
    }

    async fn sessions_for_user(&self, user_id: i64, page: PageRequest) -> HyuResult<Page<ChatSession>> {
        Ok(paginate(self.state.lock().sessions_of(user_id), page))
    }

    async fn touch_session(&self, id: Uuid, at: DateTime<Utc>) -> HyuResult<()> {
        let mut state = self.state.lock();
        let session = state
            .sessions
            .get_mut(&id)
            .ok_or_else(|| HyuError::not_found("ChatSession", id))?;
        session.updated_at = at;
        Ok(())
    }

    async fn append_message(
        &self,
        session_id: Uuid,
        role: MessageRole,
        content: &str,
        at: DateTime<Utc>,
    ) -> HyuResult<ChatMessage> {
        let mut state = self.state.lock();
        state.next_message_id += 1;
        let message = ChatMessage {
            id: state.next_message_id,
            session_id,
            role,
            content: content.to_string(),
            created_at: at,
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn messages(&self, session_id: Uuid, page: PageRequest) -> HyuResult<Page<ChatMessage>> {
        let rows: Vec<ChatMessage> = self
            .state
            .lock()
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect();
        Ok(paginate(rows, page))
    }

    async fn recent_history(&self, session_id: Uuid, limit: usize) -> HyuResult<Vec<ChatMessage>> {
        let state = self.state.lock();
        let rows: Vec<&ChatMessage> = state
            .messages
            .iter()
            .filter(|m| m.session_id == session_id && m.role != MessageRole::System)
            .collect();
        let skip = rows.len().saturating_sub(limit);
        Ok(rows.into_iter().skip(skip).cloned().collect())
    }

    async fn system_message(&self, session_id: Uuid) -> HyuResult<Option<ChatMessage>> {
        Ok(self
            .state
            .lock()
            .messages
            .iter()
            .find(|m| m.session_id == session_id && m.role == MessageRole::System)
            .cloned())
    }

    async fn recent_for_user(&self, user_id: i64, limit: usize) -> HyuResult<Vec<ChatMessage>> {
        let state = self.state.lock();
        Ok(state
            .messages
            .iter()
            .rev()
            .filter(|m| {
                m.role != MessageRole::System && state.sessions.get(&m.session_id).is_some_and(|s| s.user_id == user_id)
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn session_previews(&self, user_id: i64) -> HyuResult<Vec<(ChatSession, Option<ChatMessage>)>> {
        let state = self.state.lock();
        Ok(state
            .sessions_of(user_id)
            .into_iter()
            .map(|s| {
                let last = state.messages.iter().rev().find(|m| m.session_id == s.id).cloned();
                (s, last)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn test_recent_history_skips_system_and_keeps_order() {
        let repo = InMemoryChatRepository::new();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let session = repo.create_session(1, None, at).await.unwrap();

        repo.append_message(session.id, MessageRole::System, "prompt", at).await.unwrap();
        for (i, text) in ["one", "two", "three"].iter().enumerate() {
            repo.append_message(session.id, MessageRole::User, text, at + Duration::seconds(i as i64))
                .await
                .unwrap();
        }

        let history = repo.recent_history(session.id, 2).await.unwrap();
        let texts: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["two", "three"]);
        assert_eq!(repo.system_message(session.id).await.unwrap().unwrap().content, "prompt");
    }
}
