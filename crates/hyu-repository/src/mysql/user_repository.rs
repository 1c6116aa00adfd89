//! MySQL user repository implementation.

use super::{convert_all, like_pattern, parse_column, parse_optional_column};
use crate::query::UserSearch;
use crate::{traits::UserRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyu_core::{HyuError, HyuResult, Page, PageRequest};
use hyu_domain::{LoginRecord, NewUser, RiskLevel, RiskMode, User, UserState};
use shaku::Component;
use sqlx::{FromRow, MySql, QueryBuilder};
use std::sync::Arc;
use tracing::debug;

const USER_COLUMNS: &str = "id, email, password_hash, name, nickname, role, state, suspend_until, risk_mode, \
     risk_level, reset_token_hash, reset_expires_at, need_password_reset, created_at, updated_at";

/// MySQL user repository implementation.
#[derive(Component, Clone)]
#[shaku(interface = UserRepository)]
pub struct MySqlUserRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlUserRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> HyuResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(self.pool.inner())
            .await?;
        row.map(User::try_from).transpose()
    }

    fn push_filters(builder: &mut QueryBuilder<'_, MySql>, search: &UserSearch) {
        builder.push(" WHERE 1 = 1");
        if let Some(q) = &search.q {
            let pattern = like_pattern(q);
            builder
                .push(" AND (email LIKE ")
                .push_bind(pattern.clone())
                .push(" OR nickname LIKE ")
                .push_bind(pattern.clone())
                .push(" OR name LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(role) = search.role {
            builder.push(" AND role = ").push_bind(role.as_str());
        }
        if let Some(state) = search.state {
            builder.push(" AND state = ").push_bind(state.as_str());
        }
        if let Some(level) = search.risk_level {
            builder.push(" AND risk_level = ").push_bind(level.as_str());
        }
        if let Some(from) = search.joined_from {
            builder.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(until) = search.joined_until {
            builder.push(" AND created_at < ").push_bind(until);
        }
    }
}

/// Database row representation of a user.
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    name: String,
    nickname: String,
    role: String,
    state: String,
    suspend_until: Option<DateTime<Utc>>,
    risk_mode: Option<String>,
    risk_level: Option<String>,
    reset_token_hash: Option<String>,
    reset_expires_at: Option<DateTime<Utc>>,
    need_password_reset: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = HyuError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            nickname: row.nickname,
            role: parse_column("role", &row.role)?,
            state: parse_column("state", &row.state)?,
            suspend_until: row.suspend_until,
            risk_mode: parse_optional_column("risk_mode", row.risk_mode.as_deref())?,
            risk_level: parse_optional_column("risk_level", row.risk_level.as_deref())?,
            reset_token_hash: row.reset_token_hash,
            reset_expires_at: row.reset_expires_at,
            need_password_reset: row.need_password_reset,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn find_by_id(&self, id: i64) -> HyuResult<Option<User>> {
        debug!("Finding user by id: {}", id);

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.inner())
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_ids(&self, ids: &[i64]) -> HyuResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<MySql>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE id IN ("));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = builder.build_query_as::<UserRow>().fetch_all(self.pool.inner()).await?;
        convert_all(rows)
    }

    async fn find_by_email(&self, email: &str) -> HyuResult<Option<User>> {
        debug!("Finding user by email: {}", email);

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER(?)");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.trim())
            .fetch_optional(self.pool.inner())
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn exists_by_email(&self, email: &str) -> HyuResult<bool> {
        let result: Option<i32> = sqlx::query_scalar("SELECT 1 FROM users WHERE LOWER(email) = LOWER(?) LIMIT 1")
            .bind(email.trim())
            .fetch_optional(self.pool.inner())
            .await?;

        Ok(result.is_some())
    }

    async fn create(&self, user: NewUser) -> HyuResult<User> {
        debug!("Creating user: {}", user.email);

        // MySQL has no RETURNING, so insert then select
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, name, nickname, role, state)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.nickname)
        .bind(user.role.as_str())
        .bind(UserState::Active.as_str())
        .execute(self.pool.inner())
        .await?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|_| HyuError::Internal("User id out of range".to_string()))?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| HyuError::Internal("Failed to fetch inserted user".to_string()))
    }

    async fn search(&self, search: &UserSearch, page: PageRequest) -> HyuResult<Page<User>> {
        debug!("Searching users: {:?}", search);

        let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM users");
        Self::push_filters(&mut count, search);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool.inner()).await?;

        let mut select = QueryBuilder::<MySql>::new(format!("SELECT {USER_COLUMNS} FROM users"));
        Self::push_filters(&mut select, search);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let rows = select.build_query_as::<UserRow>().fetch_all(self.pool.inner()).await?;

        Ok(Page::new(convert_all(rows)?, page.page, page.size, total as u64))
    }

    async fn update_state(
        &self,
        id: i64,
        state: UserState,
        suspend_until: Option<DateTime<Utc>>,
        risk_mode: Option<RiskMode>,
    ) -> HyuResult<()> {
        debug!("Updating state of user {} to {}", id, state);

        let result = sqlx::query(
            r#"
            UPDATE users
            SET state = ?, suspend_until = ?, risk_mode = COALESCE(?, risk_mode)
            WHERE id = ?
            "#,
        )
        .bind(state.as_str())
        .bind(suspend_until)
        .bind(risk_mode.map(|m| m.as_str()))
        .bind(id)
        .execute(self.pool.inner())
        .await?;

        if result.rows_affected() == 0 && self.find_by_id(id).await?.is_none() {
            return Err(HyuError::not_found("User", id));
        }
        Ok(())
    }

    async fn update_risk_level(&self, id: i64, level: RiskLevel) -> HyuResult<()> {
        sqlx::query("UPDATE users SET risk_level = ? WHERE id = ?")
            .bind(level.as_str())
            .bind(id)
            .execute(self.pool.inner())
            .await?;
        Ok(())
    }

    async fn set_reset_token(&self, id: i64, digest: &str, expires_at: DateTime<Utc>) -> HyuResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_token_hash = ?, reset_expires_at = ?, need_password_reset = TRUE
            WHERE id = ?
            "#,
        )
        .bind(digest)
        .bind(expires_at)
        .bind(id)
        .execute(self.pool.inner())
        .await?;
        Ok(())
    }

    async fn clear_reset_token(&self, id: i64) -> HyuResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_token_hash = NULL, reset_expires_at = NULL, need_password_reset = FALSE
            WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(self.pool.inner())
        .await?;
        Ok(())
    }

    async fn find_by_reset_digest(&self, digest: &str) -> HyuResult<Option<User>> {
        self.fetch_one_by("reset_token_hash", digest).await
    }

    async fn complete_password_reset(&self, id: i64, password_hash: &str) -> HyuResult<()> {
        debug!("Completing password reset for user {}", id);

        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, reset_token_hash = NULL, reset_expires_at = NULL,
                need_password_reset = FALSE
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .execute(self.pool.inner())
        .await?;
        Ok(())
    }

    async fn record_login(&self, record: LoginRecord) -> HyuResult<()> {
        sqlx::query("INSERT INTO login_history (user_id, ip_address, logged_in_at) VALUES (?, ?, ?)")
            .bind(record.user_id)
            .bind(&record.ip_address)
            .bind(record.logged_in_at)
            .execute(self.pool.inner())
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for MySqlUserRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlUserRepository").finish_non_exhaustive()
    }
}
