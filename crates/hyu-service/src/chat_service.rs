//! Chat sessions with the assistant.

use crate::clients::AssistantClient;
use crate::dto::{MessageDto, SendMessageRequest, SessionDto};
use crate::event_recorder::EventRecorder;
use async_trait::async_trait;
use hyu_core::{HyuError, HyuResult, Interface, Page, PageRequest, SharedClock, ValidateExt};
use hyu_domain::{names, ChatSession, MessageRole, NewEvent, Profile, HISTORY_WINDOW};
use hyu_repository::{ChatRepository, ProfileRepository};
use shaku::Component;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub const SESSION_PAGE_SIZE: usize = 20;
pub const MESSAGE_PAGE_SIZE: usize = 50;

#[async_trait]
pub trait ChatService: Interface + Send + Sync {
    /// Opens a session seeded with a system prompt from the caller's profile.
    async fn create_session(&self, user_id: i64) -> HyuResult<SessionDto>;

    async fn sessions(&self, user_id: i64, page: PageRequest) -> HyuResult<Page<SessionDto>>;

    async fn messages(&self, user_id: i64, session_id: Uuid, page: PageRequest) -> HyuResult<Page<MessageDto>>;

    /// Stores the user's message and returns the assistant's reply.
    async fn send(&self, user_id: i64, session_id: Uuid, request: SendMessageRequest) -> HyuResult<MessageDto>;
}

#[derive(Component)]
#[shaku(interface = ChatService)]
pub struct ChatServiceImpl {
    #[shaku(inject)]
    chats: Arc<dyn ChatRepository>,
    #[shaku(inject)]
    profiles: Arc<dyn ProfileRepository>,
    #[shaku(inject)]
    assistant: Arc<dyn AssistantClient>,
    #[shaku(inject)]
    events: Arc<dyn EventRecorder>,
    clock: SharedClock,
}

impl ChatServiceImpl {
    pub fn new(
        chats: Arc<dyn ChatRepository>,
        profiles: Arc<dyn ProfileRepository>,
        assistant: Arc<dyn AssistantClient>,
        events: Arc<dyn EventRecorder>,
        clock: SharedClock,
    ) -> Self {
        Self {
            chats,
            profiles,
            assistant,
            events,
            clock,
        }
    }

    async fn owned_session(&self, user_id: i64, session_id: Uuid) -> HyuResult<ChatSession> {
        self.chats
            .find_session(session_id)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| HyuError::not_found("Session", session_id))
    }

    async fn profile(&self, user_id: i64) -> HyuResult<Profile> {
        Ok(self
            .profiles
            .find(user_id)
            .await?
            .unwrap_or_else(|| Profile::default_for(user_id, self.clock.now())))
    }
}

#[async_trait]
impl ChatService for ChatServiceImpl {
    async fn create_session(&self, user_id: i64) -> HyuResult<SessionDto> {
        let now = self.clock.now();
        let prompt = self.profile(user_id).await?.system_prompt();

        let session = self.chats.create_session(user_id, None, now).await?;
        self.chats
            .append_message(session.id, MessageRole::System, &prompt, now)
            .await?;

        info!("Chat session {} opened for user {}", session.id, user_id);
        Ok(session.into())
    }

    async fn sessions(&self, user_id: i64, page: PageRequest) -> HyuResult<Page<SessionDto>> {
        Ok(self
            .chats
            .sessions_for_user(user_id, page)
            .await?
            .map(SessionDto::from))
    }

    async fn messages(&self, user_id: i64, session_id: Uuid, page: PageRequest) -> HyuResult<Page<MessageDto>> {
        self.owned_session(user_id, session_id).await?;
        Ok(self.chats.messages(session_id, page).await?.map(MessageDto::from))
    }

    async fn send(&self, user_id: i64, session_id: Uuid, request: SendMessageRequest) -> HyuResult<MessageDto> {
        request.validate_request()?;
        let session = self.owned_session(user_id, session_id).await?;
        let content = request.content.trim();
        debug!("User {} writes to session {}", user_id, session.id);

        let now = self.clock.now();
        self.chats
            .append_message(session.id, MessageRole::User, content, now)
            .await?;
        self.events
            .record(NewEvent::ok(Some(user_id), names::AI_CHAT_USER_MESSAGE, now).with_session(session.id.to_string()))
            .await;

        let history = self.chats.recent_history(session.id, HISTORY_WINDOW).await?;
        let system = match self.chats.system_message(session.id).await? {
            Some(message) => message.content,
            None => self.profile(user_id).await?.system_prompt(),
        };
        let reply = self.assistant.reply(&system, &history, content).await?;

        let replied_at = self.clock.now();
        let stored = self
            .chats
            .append_message(session.id, MessageRole::Assistant, &reply, replied_at)
            .await?;
        self.chats.touch_session(session.id, replied_at).await?;

        Ok(stored.into())
    }
}

impl std::fmt::Debug for ChatServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatServiceImpl").finish_non_exhaustive()
    }
}
