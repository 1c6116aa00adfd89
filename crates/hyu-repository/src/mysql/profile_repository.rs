//! MySQL user profile repository.

use super::parse_column;
use crate::{traits::ProfileRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyu_core::{HyuError, HyuResult};
use hyu_domain::Profile;
use shaku::Component;
use sqlx::types::Json;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

#[derive(Component, Clone)]
#[shaku(interface = ProfileRepository)]
pub struct MySqlProfileRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlProfileRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    user_id: i64,
    nickname: String,
    avatar_url: Option<String>,
    bio: Option<String>,
    tone: String,
    sensitivity: String,
    language: String,
    anonymity: bool,
    reminder: Option<String>,
    region: String,
    weekly_summary: bool,
    safety_consent: bool,
    concern_tags: Json<Vec<String>>,
    goals: Json<Vec<String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = HyuError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: row.user_id,
            nickname: row.nickname,
            avatar_url: row.avatar_url,
            bio: row.bio,
            tone: parse_column("tone", &row.tone)?,
            sensitivity: parse_column("sensitivity", &row.sensitivity)?,
            language: row.language,
            anonymity: row.anonymity,
            reminder: row.reminder,
            region: row.region,
            weekly_summary: row.weekly_summary,
            safety_consent: row.safety_consent,
            concern_tags: row.concern_tags.0,
            goals: row.goals.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl ProfileRepository for MySqlProfileRepository {
    async fn find(&self, user_id: i64) -> HyuResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT user_id, nickname, avatar_url, bio, tone, sensitivity, language, anonymity, reminder, region,
                   weekly_summary, safety_consent, concern_tags, goals, created_at, updated_at
            FROM user_profiles
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool.inner())
        .await?;

        row.map(Profile::try_from).transpose()
    }

    async fn save(&self, profile: &Profile) -> HyuResult<Profile> {
        debug!("Saving profile of user {}", profile.user_id);

        sqlx::query(
            r#"
            INSERT INTO user_profiles
                (user_id, nickname, avatar_url, bio, tone, sensitivity, language, anonymity, reminder, region,
                 weekly_summary, safety_consent, concern_tags, goals, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                nickname = VALUES(nickname),
                avatar_url = VALUES(avatar_url),
                bio = VALUES(bio),
                tone = VALUES(tone),
                sensitivity = VALUES(sensitivity),
                language = VALUES(language),
                anonymity = VALUES(anonymity),
                reminder = VALUES(reminder),
                region = VALUES(region),
                weekly_summary = VALUES(weekly_summary),
                safety_consent = VALUES(safety_consent),
                concern_tags = VALUES(concern_tags),
                goals = VALUES(goals),
                updated_at = VALUES(updated_at)
            "#,
        )
        .bind(profile.user_id)
        .bind(&profile.nickname)
        .bind(&profile.avatar_url)
        .bind(&profile.bio)
        .bind(profile.tone.as_str())
        .bind(profile.sensitivity.as_str())
        .bind(&profile.language)
        .bind(profile.anonymity)
        .bind(&profile.reminder)
        .bind(&profile.region)
        .bind(profile.weekly_summary)
        .bind(profile.safety_consent)
        .bind(Json(&profile.concern_tags))
        .bind(Json(&profile.goals))
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(self.pool.inner())
        .await?;

        self.find(profile.user_id)
            .await?
            .ok_or_else(|| HyuError::not_found("Profile", profile.user_id))
    }

    async fn weekly_summary_subscribers(&self) -> HyuResult<Vec<i64>> {
        let ids: Vec<(i64,)> =
            sqlx::query_as("SELECT user_id FROM user_profiles WHERE weekly_summary = TRUE ORDER BY user_id")
                .fetch_all(self.pool.inner())
                .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}

impl std::fmt::Debug for MySqlProfileRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlProfileRepository").finish_non_exhaustive()
    }
}
