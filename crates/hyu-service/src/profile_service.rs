//! Profiles and the caller's chat overview.

use crate::dto::{MessageDto, ProfileResponse, SessionPreview, UpdateProfileRequest};
use async_trait::async_trait;
use hyu_core::text::blank_to_none;
use hyu_core::{HyuError, HyuResult, Interface, SharedClock, ValidateExt};
use hyu_domain::{normalize_tags, Profile, MAX_CONCERN_TAGS, MAX_GOALS};
use hyu_repository::{ChatRepository, ProfileRepository};
use shaku::Component;
use std::sync::Arc;
use tracing::{debug, info};

pub const RECENT_CHAT_DEFAULT: usize = 20;
pub const RECENT_CHAT_MAX: usize = 100;

#[async_trait]
pub trait ProfileService: Interface + Send + Sync {
    /// Returns the profile, creating the defaults on first access.
    async fn get_or_create(&self, user_id: i64) -> HyuResult<ProfileResponse>;

    async fn update(&self, user_id: i64, request: UpdateProfileRequest) -> HyuResult<ProfileResponse>;

    /// Most recent user and assistant messages across all sessions, newest first.
    async fn recent_chat(&self, user_id: i64, limit: Option<usize>) -> HyuResult<Vec<MessageDto>>;

    async fn chat_sessions(&self, user_id: i64) -> HyuResult<Vec<SessionPreview>>;
}

#[derive(Component)]
#[shaku(interface = ProfileService)]
pub struct ProfileServiceImpl {
    #[shaku(inject)]
    profiles: Arc<dyn ProfileRepository>,
    #[shaku(inject)]
    chats: Arc<dyn ChatRepository>,
    clock: SharedClock,
}

impl ProfileServiceImpl {
    pub fn new(profiles: Arc<dyn ProfileRepository>, chats: Arc<dyn ChatRepository>, clock: SharedClock) -> Self {
        Self { profiles, chats, clock }
    }

    async fn load_or_default(&self, user_id: i64) -> HyuResult<(Profile, bool)> {
        match self.profiles.find(user_id).await? {
            Some(profile) => Ok((profile, false)),
            None => Ok((Profile::default_for(user_id, self.clock.now()), true)),
        }
    }
}

fn clean_goals(goals: Vec<String>) -> Vec<String> {
    goals
        .into_iter()
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect()
}

#[async_trait]
impl ProfileService for ProfileServiceImpl {
    async fn get_or_create(&self, user_id: i64) -> HyuResult<ProfileResponse> {
        let (profile, fresh) = self.load_or_default(user_id).await?;
        if !fresh {
            return Ok(profile.into());
        }
        let saved = self.profiles.save(&profile).await?;
        info!("Created default profile for user {}", user_id);
        Ok(saved.into())
    }

    async fn update(&self, user_id: i64, request: UpdateProfileRequest) -> HyuResult<ProfileResponse> {
        request.validate_request()?;
        let (mut profile, _) = self.load_or_default(user_id).await?;

        if let Some(nickname) = blank_to_none(request.nickname.as_deref()) {
            profile.nickname = nickname;
        }
        if request.avatar_url.is_some() {
            profile.avatar_url = blank_to_none(request.avatar_url.as_deref());
        }
        if request.bio.is_some() {
            profile.bio = blank_to_none(request.bio.as_deref());
        }
        if let Some(tone) = request.tone {
            profile.tone = tone;
        }
        if let Some(sensitivity) = request.sensitivity {
            profile.sensitivity = sensitivity;
        }
        if let Some(language) = request.language {
            profile.language = language;
        }
        if let Some(anonymity) = request.anonymity {
            profile.anonymity = anonymity;
        }
        if request.reminder.is_some() {
            profile.reminder = blank_to_none(request.reminder.as_deref());
        }
        if let Some(region) = blank_to_none(request.region.as_deref()) {
            profile.region = region;
        }
        if let Some(weekly_summary) = request.weekly_summary {
            profile.weekly_summary = weekly_summary;
        }
        if let Some(safety_consent) = request.safety_consent {
            profile.safety_consent = safety_consent;
        }
        if let Some(tags) = request.concern_tags {
            let tags = normalize_tags(tags);
            if tags.len() > MAX_CONCERN_TAGS {
                return Err(HyuError::validation("Too many concern tags"));
            }
            profile.concern_tags = tags;
        }
        if let Some(goals) = request.goals {
            let goals = clean_goals(goals);
            if goals.len() > MAX_GOALS {
                return Err(HyuError::validation("Too many goals"));
            }
            profile.goals = goals;
        }
        profile.updated_at = self.clock.now();

        let saved = self.profiles.save(&profile).await?;
        debug!("Profile of user {} updated", user_id);
        Ok(saved.into())
    }

    async fn recent_chat(&self, user_id: i64, limit: Option<usize>) -> HyuResult<Vec<MessageDto>> {
        let limit = limit.unwrap_or(RECENT_CHAT_DEFAULT).clamp(1, RECENT_CHAT_MAX);
        Ok(self
            .chats
            .recent_for_user(user_id, limit)
            .await?
            .into_iter()
            .map(MessageDto::from)
            .collect())
    }

    async fn chat_sessions(&self, user_id: i64) -> HyuResult<Vec<SessionPreview>> {
        Ok(self
            .chats
            .session_previews(user_id)
            .await?
            .into_iter()
            .map(|(session, last)| SessionPreview {
                session_id: session.id,
                title: session.title,
                updated_at: session.updated_at,
                last_message: last.map(MessageDto::from),
            })
            .collect())
    }
}

impl std::fmt::Debug for ProfileServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileServiceImpl").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{clock, now};
    use hyu_domain::{MessageRole, Sensitivity, Tone};
    use hyu_repository::memory::{InMemoryChatRepository, InMemoryProfileRepository};

    fn service() -> (ProfileServiceImpl, Arc<InMemoryChatRepository>) {
        let chats = Arc::new(InMemoryChatRepository::new());
        let service = ProfileServiceImpl::new(Arc::new(InMemoryProfileRepository::new()), chats.clone(), clock());
        (service, chats)
    }

    #[tokio::test]
    async fn test_first_read_creates_defaults() {
        let (service, _) = service();
        let profile = service.get_or_create(7).await.unwrap();
        assert_eq!(profile.nickname, "사용자7");
        assert_eq!(profile.tone, Tone::Neutral);
        assert_eq!(profile.language, "ko");
        assert!(profile.anonymity);
        assert_eq!(profile.created_at, now());
    }

    #[tokio::test]
    async fn test_update_replaces_lists() {
        let (service, _) = service();
        let updated = service
            .update(
                1,
                UpdateProfileRequest {
                    nickname: Some("달빛".to_string()),
                    tone: Some(Tone::Soft),
                    sensitivity: Some(Sensitivity::High),
                    reminder: Some("21:30".to_string()),
                    concern_tags: Some(vec![" sleep ".into(), "work".into(), "sleep".into()]),
                    goals: Some(vec!["walk".into(), "  ".into(), "journal".into()]),
                    ..UpdateProfileRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.nickname, "달빛");
        assert_eq!(updated.concern_tags, vec!["sleep", "work"]);
        assert_eq!(updated.goals, vec!["walk", "journal"]);
        assert_eq!(updated.reminder.as_deref(), Some("21:30"));

        let kept = service
            .update(
                1,
                UpdateProfileRequest {
                    anonymity: Some(false),
                    ..UpdateProfileRequest::default()
                },
            )
            .await
            .unwrap();
        assert!(!kept.anonymity);
        assert_eq!(kept.concern_tags, vec!["sleep", "work"]);
        assert_eq!(kept.tone, Tone::Soft);
    }

    #[tokio::test]
    async fn test_update_sets_consents_and_bio() {
        let (service, _) = service();
        let updated = service
            .update(
                1,
                UpdateProfileRequest {
                    bio: Some("  매일 산책하기  ".to_string()),
                    weekly_summary: Some(true),
                    safety_consent: Some(true),
                    ..UpdateProfileRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("매일 산책하기"));
        assert!(updated.weekly_summary);
        assert!(updated.safety_consent);

        let cleared = service
            .update(
                1,
                UpdateProfileRequest {
                    bio: Some(" ".to_string()),
                    weekly_summary: Some(false),
                    ..UpdateProfileRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.bio, None);
        assert!(!cleared.weekly_summary);
        assert!(cleared.safety_consent);
    }

    #[tokio::test]
    async fn test_update_rejects_bad_fields() {
        let (service, _) = service();
        let err = service
            .update(
                1,
                UpdateProfileRequest {
                    nickname: Some("a".to_string()),
                    ..UpdateProfileRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_chat_overview() {
        let (service, chats) = service();
        let first = chats.create_session(1, None, now()).await.unwrap();
        let second = chats.create_session(1, Some("night".to_string()), now()).await.unwrap();
        chats.append_message(first.id, MessageRole::System, "prompt", now()).await.unwrap();
        chats.append_message(first.id, MessageRole::User, "hi", now()).await.unwrap();
        chats.append_message(first.id, MessageRole::Assistant, "hello", now()).await.unwrap();
        chats.append_message(second.id, MessageRole::User, "late", now()).await.unwrap();

        let recent = service.recent_chat(1, None).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].content, "late");
        assert!(recent.iter().all(|m| m.role != MessageRole::System));

        let limited = service.recent_chat(1, Some(0)).await.unwrap();
        assert_eq!(limited.len(), 1);

        let previews = service.chat_sessions(1).await.unwrap();
        assert_eq!(previews.len(), 2);
        let night = previews.iter().find(|p| p.session_id == second.id).unwrap();
        assert_eq!(night.last_message.as_ref().unwrap().content, "late");
        assert!(service.chat_sessions(2).await.unwrap().is_empty());
    }
}
