//! Profile DTOs.

use crate::dto::MessageDto;
use chrono::{DateTime, Utc};
use hyu_core::rules::{hh_mm, language_code};
use hyu_domain::{Profile, Sensitivity, Tone};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user_id: i64,
    pub nickname: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub tone: Tone,
    pub sensitivity: Sensitivity,
    pub language: String,
    pub anonymity: bool,
    pub reminder: Option<String>,
    pub region: String,
    pub weekly_summary: bool,
    pub safety_consent: bool,
    pub concern_tags: Vec<String>,
    pub goals: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self {
            user_id: p.user_id,
            nickname: p.nickname,
            avatar_url: p.avatar_url,
            bio: p.bio,
            tone: p.tone,
            sensitivity: p.sensitivity,
            language: p.language,
            anonymity: p.anonymity,
            reminder: p.reminder,
            region: p.region,
            weekly_summary: p.weekly_summary,
            safety_consent: p.safety_consent,
            concern_tags: p.concern_tags,
            goals: p.goals,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Profile upsert. Provided lists replace the stored ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 16, message = "Nickname must be 2-16 characters"))]
    pub nickname: Option<String>,

    #[validate(length(max = 500))]
    pub avatar_url: Option<String>,

    #[validate(length(max = 400, message = "Bio must be at most 400 characters"))]
    pub bio: Option<String>,

    pub tone: Option<Tone>,

    pub sensitivity: Option<Sensitivity>,

    #[validate(custom(function = "language_code", message = "Language must be two lowercase letters"))]
    pub language: Option<String>,

    pub anonymity: Option<bool>,

    #[validate(custom(function = "hh_mm", message = "Reminder must be HH:mm"))]
    pub reminder: Option<String>,

    #[validate(length(min = 2, max = 8))]
    pub region: Option<String>,

    pub weekly_summary: Option<bool>,

    pub safety_consent: Option<bool>,

    #[validate(length(max = 7, message = "Too many concern tags"))]
    pub concern_tags: Option<Vec<String>>,

    #[validate(length(max = 10, message = "Too many goals"))]
    pub goals: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentChatParams {
    pub limit: Option<usize>,
}

/// A session with its latest message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionPreview {
    pub session_id: Uuid,
    pub title: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub last_message: Option<MessageDto>,
}
