//! Token store backed by Redis, or process memory when Redis is disabled.

use super::{InMemoryTokenStore, RefreshSession};
use crate::digest::sha256_b64url;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use deadpool_redis::{redis::AsyncCommands, Pool};
use hyu_core::{HyuError, HyuResult, Interface};
use shaku::Component;
use std::sync::Arc;
use tracing::debug;

/// Refresh-token sessions and revoked access tokens.
///
/// Refresh tokens are only ever stored as their SHA-256 digest.
#[async_trait]
pub trait TokenStore: Interface + Send + Sync {
    /// Stores a refresh token for `ttl_secs` and indexes it under its user.
    async fn store_refresh(&self, token: &str, session: &RefreshSession, ttl_secs: u64) -> HyuResult<()>;

    /// Looks up a live refresh token.
    async fn find_refresh(&self, token: &str) -> HyuResult<Option<RefreshSession>>;

    /// Atomically consumes a live refresh token. Of two concurrent callers
    /// presenting the same token, at most one gets the session back.
    async fn take_refresh(&self, token: &str) -> HyuResult<Option<RefreshSession>>;

    /// Revokes one refresh token. Returns whether it existed.
    async fn revoke_refresh(&self, token: &str) -> HyuResult<bool> {
        Ok(self.take_refresh(token).await?.is_some())
    }

    /// Revokes every refresh token of a user. Returns how many were removed.
    async fn revoke_all_for_user(&self, user_id: i64) -> HyuResult<usize>;

    /// Blacklists an access-token id for the rest of its lifetime.
    async fn blacklist_access(&self, jti: &str, ttl_secs: u64) -> HyuResult<()>;

    async fn is_blacklisted(&self, jti: &str) -> HyuResult<bool>;
}

fn refresh_key(digest: &str) -> String {
    format!("rt:{digest}")
}

fn user_key(user_id: i64) -> String {
    format!("rt:user:{user_id}")
}

fn blacklist_key(jti: &str) -> String {
    format!("bl:{jti}")
}

fn cache_error(op: &str, e: &impl std::fmt::Display) -> HyuError {
    HyuError::Cache(format!("Failed to {op}: {e}"))
}

/// Token store service.
#[derive(Component, Default)]
#[shaku(interface = TokenStore)]
pub struct TokenStoreService {
    pool: Option<Arc<Pool>>,
    memory: InMemoryTokenStore,
}

impl TokenStoreService {
    #[must_use]
    pub fn redis(pool: Arc<Pool>) -> Self {
        Self {
            pool: Some(pool),
            memory: InMemoryTokenStore::default(),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Shaku parameters; `None` selects the in-memory store.
    #[must_use]
    pub fn parameters(pool: Option<Arc<Pool>>) -> TokenStoreServiceParameters {
        TokenStoreServiceParameters {
            pool,
            memory: InMemoryTokenStore::default(),
        }
    }

    async fn conn(pool: &Pool) -> HyuResult<deadpool_redis::Connection> {
        pool.get().await.map_err(|e| cache_error("get Redis connection", &e))
    }
}

#[async_trait]
impl TokenStore for TokenStoreService {
    async fn store_refresh(&self, token: &str, session: &RefreshSession, ttl_secs: u64) -> HyuResult<()> {
        let digest = sha256_b64url(token);
        let Some(pool) = &self.pool else {
            self.memory.store(&digest, session.clone(), ttl_secs, Utc::now());
            return Ok(());
        };

        let mut conn = Self::conn(pool).await?;
        let ttl = ttl_secs.max(1);
        conn.set_ex::<_, _, ()>(refresh_key(&digest), session.encode(), ttl)
            .await
            .map_err(|e| cache_error("store refresh token", &e))?;
        let index = user_key(session.user_id);
        conn.sadd::<_, _, ()>(&index, &digest)
            .await
            .map_err(|e| cache_error("index refresh token", &e))?;
        conn.expire::<_, ()>(&index, i64::try_from(ttl).unwrap_or(i64::MAX))
            .await
            .map_err(|e| cache_error("expire refresh index", &e))?;

        debug!("Stored refresh token for user {}", session.user_id);
        Ok(())
    }

    async fn find_refresh(&self, token: &str) -> HyuResult<Option<RefreshSession>> {
        let digest = sha256_b64url(token);
        let Some(pool) = &self.pool else {
            return Ok(self.memory.find(&digest, Utc::now()));
        };

        let mut conn = Self::conn(pool).await?;
        let value: Option<String> = conn
            .get(refresh_key(&digest))
            .await
            .map_err(|e| cache_error("read refresh token", &e))?;
        Ok(value.as_deref().and_then(RefreshSession::decode))
    }

    async fn take_refresh(&self, token: &str) -> HyuResult<Option<RefreshSession>> {
        let digest = sha256_b64url(token);
        let Some(pool) = &self.pool else {
            return Ok(self.memory.take(&digest, Utc::now()));
        };

        let mut conn = Self::conn(pool).await?;
        let value: Option<String> = conn
            .get_del(refresh_key(&digest))
            .await
            .map_err(|e| cache_error("consume refresh token", &e))?;
        let Some(session) = value.as_deref().and_then(RefreshSession::decode) else {
            return Ok(None);
        };
        conn.srem::<_, _, ()>(user_key(session.user_id), &digest)
            .await
            .map_err(|e| cache_error("unindex refresh token", &e))?;
        Ok(Some(session))
    }

    async fn revoke_all_for_user(&self, user_id: i64) -> HyuResult<usize> {
        let Some(pool) = &self.pool else {
            return Ok(self.memory.revoke_all(user_id));
        };

        let mut conn = Self::conn(pool).await?;
        let index = user_key(user_id);
        let digests: Vec<String> = conn
            .smembers(&index)
            .await
            .map_err(|e| cache_error("list refresh tokens", &e))?;
        let keys: Vec<String> = digests.iter().map(|d| refresh_key(d)).collect();
        if !keys.is_empty() {
            conn.del::<_, ()>(keys).await.map_err(|e| cache_error("revoke refresh tokens", &e))?;
        }
        conn.del::<_, ()>(&index).await.map_err(|e| cache_error("drop refresh index", &e))?;

        debug!("Revoked {} refresh tokens for user {}", digests.len(), user_id);
        Ok(digests.len())
    }

    async fn blacklist_access(&self, jti: &str, ttl_secs: u64) -> HyuResult<()> {
        if ttl_secs == 0 {
            return Ok(());
        }
        let Some(pool) = &self.pool else {
            let until = Utc::now() + Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX / 1000));
            self.memory.blacklist(jti, until);
            return Ok(());
        };

        let mut conn = Self::conn(pool).await?;
        conn.set_ex::<_, _, ()>(blacklist_key(jti), "1", ttl_secs)
            .await
            .map_err(|e| cache_error("blacklist access token", &e))
    }

    async fn is_blacklisted(&self, jti: &str) -> HyuResult<bool> {
        let Some(pool) = &self.pool else {
            return Ok(self.memory.is_blacklisted(jti, Utc::now()));
        };

        let mut conn = Self::conn(pool).await?;
        conn.exists(blacklist_key(jti))
            .await
            .map_err(|e| cache_error("check blacklist", &e))
    }
}
