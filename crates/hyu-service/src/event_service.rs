//! Client analytics event ingestion.

use crate::dto::{EventAck, EventRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyu_core::text::blank_to_none;
use hyu_core::{HyuError, HyuResult, Interface, SharedClock, ValidateExt};
use hyu_domain::{names, Event, NewEvent, RISK_EVENT_LEVELS, STATUS_OK};
use hyu_repository::EventRepository;
use shaku::Component;
use std::sync::Arc;
use tracing::debug;

#[async_trait]
pub trait EventService: Interface + Send + Sync {
    /// Stores one event. A repeated idempotency key returns the first row
    /// with `dedup` set.
    async fn ingest(
        &self,
        request: EventRequest,
        idempotency_key: Option<String>,
        bearer_user_id: Option<i64>,
    ) -> HyuResult<EventAck>;
}

#[derive(Component)]
#[shaku(interface = EventService)]
pub struct EventServiceImpl {
    #[shaku(inject)]
    events: Arc<dyn EventRepository>,
    clock: SharedClock,
}

impl EventServiceImpl {
    pub fn new(events: Arc<dyn EventRepository>, clock: SharedClock) -> Self {
        Self { events, clock }
    }

    fn build(&self, request: EventRequest, bearer_user_id: Option<i64>) -> HyuResult<NewEvent> {
        let event_name = request.event_name.trim().to_string();
        let level = blank_to_none(request.level.as_deref()).map(|l| l.to_lowercase());
        if event_name == names::RISK_DETECTED {
            match level.as_deref() {
                Some(l) if RISK_EVENT_LEVELS.contains(&l) => {}
                Some(l) => return Err(HyuError::bad_request(format!("unknown risk level: {l}"))),
                None => return Err(HyuError::bad_request("level is required for risk_detected")),
            }
        }

        let event_time = match blank_to_none(request.event_time.as_deref()) {
            Some(raw) => parse_event_time(&raw)?,
            None => self.clock.now(),
        };

        Ok(NewEvent {
            user_id: request.user_id.or(bearer_user_id),
            event_name,
            event_time,
            status: blank_to_none(request.status.as_deref()).unwrap_or_else(|| STATUS_OK.to_string()),
            level,
            session_id: blank_to_none(request.session_id.as_deref()),
            idempotency_key: None,
            meta: request.meta,
        })
    }

    async fn existing(&self, key: &str) -> HyuResult<Option<Event>> {
        self.events.find_by_idempotency_key(key).await
    }
}

fn parse_event_time(raw: &str) -> HyuResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| HyuError::bad_request(format!("eventTime must be ISO-8601 with an offset: {raw}")))
}

fn ack(event: &Event, dedup: bool) -> EventAck {
    EventAck {
        ok: true,
        id: event.id,
        dedup,
    }
}

#[async_trait]
impl EventService for EventServiceImpl {
    async fn ingest(
        &self,
        request: EventRequest,
        idempotency_key: Option<String>,
        bearer_user_id: Option<i64>,
    ) -> HyuResult<EventAck> {
        request.validate_request()?;
        let key = blank_to_none(idempotency_key.as_deref());

        if let Some(key) = &key {
            if let Some(event) = self.existing(key).await? {
                debug!("Event with idempotency key {} already stored as {}", key, event.id);
                return Ok(ack(&event, true));
            }
        }

        let mut event = self.build(request, bearer_user_id)?;
        event.idempotency_key = key.clone();

        match self.events.insert(event, self.clock.now()).await {
            Ok(stored) => Ok(ack(&stored, false)),
            // a concurrent request with the same key won the insert
            Err(HyuError::Conflict(message)) => match key {
                Some(key) => self
                    .existing(&key)
                    .await?
                    .map(|event| ack(&event, true))
                    .ok_or(HyuError::Conflict(message)),
                None => Err(HyuError::Conflict(message)),
            },
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for EventServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventServiceImpl").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{clock, now};
    use chrono::TimeZone;
    use hyu_repository::memory::InMemoryEventRepository;
    use serde_json::json;

    fn request(name: &str) -> EventRequest {
        EventRequest {
            user_id: None,
            event_name: name.to_string(),
            event_time: None,
            status: None,
            level: None,
            session_id: None,
            meta: None,
        }
    }

    fn service() -> (EventServiceImpl, Arc<InMemoryEventRepository>) {
        let events = Arc::new(InMemoryEventRepository::new());
        (EventServiceImpl::new(events.clone(), clock()), events)
    }

    #[tokio::test]
    async fn test_defaults_fill_from_bearer_and_clock() {
        let (service, events) = service();
        let ack = service.ingest(request("app_open"), None, Some(9)).await.unwrap();
        assert!(ack.ok);
        assert!(!ack.dedup);

        let stored = &events.all()[0];
        assert_eq!(stored.user_id, Some(9));
        assert_eq!(stored.status, STATUS_OK);
        assert_eq!(stored.event_time, now());
    }

    #[tokio::test]
    async fn test_event_time_with_offset() {
        let (service, events) = service();
        let mut req = request("app_open");
        req.user_id = Some(3);
        req.event_time = Some("2024-05-01T09:00:00+09:00".to_string());
        service.ingest(req, None, Some(9)).await.unwrap();

        let stored = &events.all()[0];
        assert_eq!(stored.user_id, Some(3));
        assert_eq!(stored.event_time, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());

        let mut bad = request("app_open");
        bad.event_time = Some("2024-05-01 09:00".to_string());
        assert_eq!(service.ingest(bad, None, None).await.unwrap_err().status_code(), 400);
    }

    #[tokio::test]
    async fn test_risk_detected_needs_known_level() {
        let (service, events) = service();
        let err = service.ingest(request(names::RISK_DETECTED), None, Some(1)).await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        let mut odd = request(names::RISK_DETECTED);
        odd.level = Some("severe".to_string());
        assert_eq!(service.ingest(odd, None, Some(1)).await.unwrap_err().status_code(), 400);

        let mut ok = request(names::RISK_DETECTED);
        ok.level = Some("HIGH_RISK".to_string());
        ok.meta = Some(json!({"source": "chat"}));
        service.ingest(ok, None, Some(1)).await.unwrap();
        assert_eq!(events.all()[0].level.as_deref(), Some("high_risk"));
    }

    #[tokio::test]
    async fn test_repeated_key_is_deduplicated() {
        let (service, events) = service();
        let first = service
            .ingest(request("app_open"), Some("k-1".to_string()), Some(1))
            .await
            .unwrap();
        let second = service
            .ingest(request("app_open"), Some("k-1".to_string()), Some(1))
            .await
            .unwrap();

        assert!(second.dedup);
        assert_eq!(second.id, first.id);
        assert_eq!(events.all().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let (service, _) = service();
        let err = service.ingest(request("  "), None, None).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
