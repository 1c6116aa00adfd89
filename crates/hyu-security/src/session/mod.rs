//! Refresh-token sessions and the access-token blacklist.

mod memory;
mod token_store;

pub use memory::InMemoryTokenStore;
pub use token_store::*;

use chrono::Utc;
use hyu_config::RedisConfig;
use hyu_core::{HyuError, HyuResult};
use hyu_domain::Role;
use tracing::info;
use uuid::Uuid;

/// Data bound to a stored refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSession {
    pub user_id: i64,
    pub role: Role,
    pub email: String,
}

impl RefreshSession {
    /// Stored form `userId|role|email`.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}|{}|{}", self.user_id, self.role.as_str(), self.email)
    }

    /// Parses the stored form. The email may itself contain `|`.
    #[must_use]
    pub fn decode(value: &str) -> Option<Self> {
        let mut parts = value.splitn(3, '|');
        let user_id = parts.next()?.parse().ok()?;
        let role = parts.next()?.parse().ok()?;
        let email = parts.next()?.to_string();
        Some(Self { user_id, role, email })
    }
}

/// Generates an opaque refresh token `rt.<uuid>.<nanos>`.
#[must_use]
pub fn new_refresh_token() -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("rt.{}.{}", Uuid::new_v4().simple(), nanos)
}

/// Creates a Redis connection pool and checks it with `PING`.
///
/// # Errors
///
/// `Configuration` for a bad URL, `Cache` when Redis is unreachable.
pub async fn create_redis_pool(config: &RedisConfig) -> HyuResult<deadpool_redis::Pool> {
    info!("Creating Redis connection pool for token store...");

    let pool = deadpool_redis::Config::from_url(&config.url)
        .builder()
        .map_err(|e| HyuError::Configuration(format!("Invalid Redis config: {e}")))?
        .max_size(config.pool_size as usize)
        .runtime(deadpool_redis::Runtime::Tokio1)
        .build()
        .map_err(|e| HyuError::Configuration(format!("Failed to create Redis pool: {e}")))?;

    let mut conn = pool
        .get()
        .await
        .map_err(|e| HyuError::Cache(format!("Failed to get Redis connection: {e}")))?;
    redis::cmd("PING")
        .query_async::<String>(&mut *conn)
        .await
        .map_err(|e| HyuError::Cache(format!("Redis PING failed: {e}")))?;

    info!("Redis connection pool created successfully");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_encoding() {
        let session = RefreshSession {
            user_id: 12,
            role: Role::Admin,
            email: "odd|name@example.com".to_string(),
        };
        let stored = session.encode();
        assert_eq!(stored, "12|ADMIN|odd|name@example.com");
        assert_eq!(RefreshSession::decode(&stored), Some(session));
        assert_eq!(RefreshSession::decode("garbage"), None);
    }

    #[test]
    fn test_refresh_token_shape() {
        let token = new_refresh_token();
        let parts: Vec<_> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "rt");
        assert_eq!(parts[1].len(), 32);
        assert_ne!(token, new_refresh_token());
    }
}
