//! MySQL analytics event repository.

use crate::{traits::EventRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyu_core::{HyuError, HyuResult};
use hyu_domain::{Event, NewEvent};
use shaku::Component;
use sqlx::types::Json;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

const EVENT_COLUMNS: &str =
    "id, user_id, event_name, event_time, status, level, session_id, idempotency_key, meta, created_at";

#[derive(Component, Clone)]
#[shaku(interface = EventRepository)]
pub struct MySqlEventRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlEventRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: i64,
    user_id: Option<i64>,
    event_name: String,
    event_time: DateTime<Utc>,
    status: String,
    level: Option<String>,
    session_id: Option<String>,
    idempotency_key: Option<String>,
    meta: Option<Json<serde_json::Value>>,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            event_name: row.event_name,
            event_time: row.event_time,
            status: row.status,
            level: row.level,
            session_id: row.session_id,
            idempotency_key: row.idempotency_key,
            meta: row.meta.map(|m| m.0),
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl EventRepository for MySqlEventRepository {
    async fn insert(&self, event: NewEvent, at: DateTime<Utc>) -> HyuResult<Event> {
        debug!("Recording event {} for user {:?}", event.event_name, event.user_id);

        let result = sqlx::query(
            r#"
            INSERT INTO events
                (user_id, event_name, event_time, status, level, session_id, idempotency_key, meta, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.user_id)
        .bind(&event.event_name)
        .bind(event.event_time)
        .bind(&event.status)
        .bind(&event.level)
        .bind(&event.session_id)
        .bind(&event.idempotency_key)
        .bind(event.meta.as_ref().map(Json))
        .bind(at)
        .execute(self.pool.inner())
        .await?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|_| HyuError::Internal("Event id out of range".to_string()))?;
        Ok(Event {
            id,
            user_id: event.user_id,
            event_name: event.event_name,
            event_time: event.event_time,
            status: event.status,
            level: event.level,
            session_id: event.session_id,
            idempotency_key: event.idempotency_key,
            meta: event.meta,
            created_at: at,
        })
    }

    async fn find_by_idempotency_key(&self, key: &str) -> HyuResult<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE idempotency_key = ?");
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(key)
            .fetch_optional(self.pool.inner())
            .await?;
        Ok(row.map(Event::from))
    }
}

impl std::fmt::Debug for MySqlEventRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlEventRepository").finish_non_exhaustive()
    }
}
