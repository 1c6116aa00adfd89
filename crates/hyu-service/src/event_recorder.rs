//! Internal analytics events emitted by services.

use async_trait::async_trait;
use hyu_core::{Interface, SharedClock};
use hyu_domain::NewEvent;
use hyu_repository::EventRepository;
use shaku::Component;
use std::sync::Arc;
use tracing::warn;

/// Fire-and-forget event sink. Failures never reach the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRecorder: Interface + Send + Sync {
    async fn record(&self, event: NewEvent);
}

/// Stores events through the [`EventRepository`].
#[derive(Component)]
#[shaku(interface = EventRecorder)]
pub struct RepositoryEventRecorder {
    #[shaku(inject)]
    events: Arc<dyn EventRepository>,
    clock: SharedClock,
}

impl RepositoryEventRecorder {
    #[must_use]
    pub fn new(events: Arc<dyn EventRepository>, clock: SharedClock) -> Self {
        Self { events, clock }
    }
}

#[async_trait]
impl EventRecorder for RepositoryEventRecorder {
    async fn record(&self, event: NewEvent) {
        let name = event.event_name.clone();
        if let Err(e) = self.events.insert(event, self.clock.now()).await {
            warn!("Failed to record event {}: {}", name, e);
        }
    }
}

impl std::fmt::Debug for RepositoryEventRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryEventRecorder").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hyu_repository::memory::InMemoryEventRepository;

    #[tokio::test]
    async fn test_record_stores_event() {
        let now = Utc.with_ymd_and_hms(2024, 4, 2, 3, 0, 0).unwrap();
        let events = Arc::new(InMemoryEventRepository::new());
        let recorder = RepositoryEventRecorder::new(events.clone(), SharedClock::fixed(now));

        recorder
            .record(NewEvent::ok(Some(5), hyu_domain::names::AI_CHAT_USER_MESSAGE, now))
            .await;

        let stored = events.all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].user_id, Some(5));
        assert_eq!(stored[0].created_at, now);
    }
}
