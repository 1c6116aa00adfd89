//! In-app notifications and the missed-goal reminder.

use crate::clients::NotificationSender;
use crate::dto::{CountResponse, NotificationDto, UpdatedResponse};
use async_trait::async_trait;
use chrono::NaiveDate;
use hyu_core::{HyuError, HyuResult, Interface, PageRequest, SharedClock, Slice};
use hyu_domain::NewNotification;
use hyu_repository::{GoalRepository, NotificationRepository};
use shaku::Component;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const NOTIFICATION_PAGE_SIZE: usize = 15;

/// Upper bound of rows touched by one "read all".
pub const READ_ALL_LIMIT: usize = 200;

#[async_trait]
pub trait NotificationService: Interface + Send + Sync {
    async fn list(&self, user_id: i64, page: PageRequest) -> HyuResult<Slice<NotificationDto>>;

    async fn unread_count(&self, user_id: i64) -> HyuResult<CountResponse>;

    async fn mark_read(&self, user_id: i64, notification_id: i64) -> HyuResult<()>;

    async fn mark_all_read(&self, user_id: i64) -> HyuResult<UpdatedResponse>;

    /// Creates a `MISSED_DAILY` notification for every alert-enabled goal
    /// left unchecked on `day`. Returns how many were new.
    async fn notify_missed_goals(&self, day: NaiveDate) -> HyuResult<usize>;
}

#[derive(Component)]
#[shaku(interface = NotificationService)]
pub struct NotificationServiceImpl {
    #[shaku(inject)]
    notifications: Arc<dyn NotificationRepository>,
    #[shaku(inject)]
    goals: Arc<dyn GoalRepository>,
    #[shaku(inject)]
    sender: Arc<dyn NotificationSender>,
    clock: SharedClock,
}

impl NotificationServiceImpl {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        goals: Arc<dyn GoalRepository>,
        sender: Arc<dyn NotificationSender>,
        clock: SharedClock,
    ) -> Self {
        Self {
            notifications,
            goals,
            sender,
            clock,
        }
    }
}

#[async_trait]
impl NotificationService for NotificationServiceImpl {
    async fn list(&self, user_id: i64, page: PageRequest) -> HyuResult<Slice<NotificationDto>> {
        Ok(self
            .notifications
            .list(user_id, page)
            .await?
            .map(NotificationDto::from))
    }

    async fn unread_count(&self, user_id: i64) -> HyuResult<CountResponse> {
        Ok(CountResponse {
            count: self.notifications.unread_count(user_id).await?,
        })
    }

    async fn mark_read(&self, user_id: i64, notification_id: i64) -> HyuResult<()> {
        let notification = self
            .notifications
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| HyuError::not_found("Notification", notification_id))?;
        if notification.user_id != user_id {
            return Err(HyuError::forbidden("not the owner of this notification"));
        }
        if !notification.read {
            self.notifications.mark_read(notification_id).await?;
        }
        Ok(())
    }

    async fn mark_all_read(&self, user_id: i64) -> HyuResult<UpdatedResponse> {
        let updated = self.notifications.mark_all_read(user_id, READ_ALL_LIMIT).await?;
        debug!("Marked {} notifications read for user {}", updated, user_id);
        Ok(UpdatedResponse { updated })
    }

    async fn notify_missed_goals(&self, day: NaiveDate) -> HyuResult<usize> {
        let missed = self.goals.find_missed(day).await?;
        let now = self.clock.now();
        let mut created = 0;

        for goal in &missed {
            let draft = NewNotification::missed_daily(goal.user_id, goal.id, &goal.title, day);
            let Some(notification) = self.notifications.insert_if_absent(draft, now).await? else {
                continue;
            };
            created += 1;
            if let Err(e) = self.sender.send(&notification).await {
                warn!("Failed to deliver notification {}: {}", notification.id, e);
            }
        }

        info!(
            "Missed-goal reminders for {}: {} new of {} unchecked goals",
            day,
            created,
            missed.len()
        );
        Ok(created)
    }
}

impl std::fmt::Debug for NotificationServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationServiceImpl").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{LoggingNotificationSender, MockNotificationSender};
    use crate::test_support::{clock, date, now};
    use hyu_domain::{GoalDraft, MISSED_DAILY_TITLE};
    use hyu_repository::memory::{InMemoryGoalRepository, InMemoryNotificationRepository};

    struct Fixture {
        notifications: Arc<InMemoryNotificationRepository>,
        goals: Arc<InMemoryGoalRepository>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                notifications: Arc::new(InMemoryNotificationRepository::new()),
                goals: Arc::new(InMemoryGoalRepository::new()),
            }
        }

        fn service(&self, sender: Arc<dyn NotificationSender>) -> NotificationServiceImpl {
            NotificationServiceImpl::new(self.notifications.clone(), self.goals.clone(), sender, clock())
        }

        async fn goal(&self, user_id: i64, title: &str, alert: bool) -> i64 {
            self.goals
                .create(
                    user_id,
                    GoalDraft {
                        title: title.to_string(),
                        start_date: date(2024, 5, 1),
                        end_date: date(2024, 5, 31),
                        alert_enabled: alert,
                    },
                    now(),
                )
                .await
                .unwrap()
                .id
        }
    }

    #[tokio::test]
    async fn test_missed_goals_notify_once() {
        let f = Fixture::new();
        let day = date(2024, 5, 15);
        f.goal(1, "walk", true).await;
        f.goal(1, "muted", false).await;
        let done = f.goal(2, "read", true).await;
        f.goals.add_checkin(done, day).await.unwrap();

        let mut sender = MockNotificationSender::new();
        sender
            .expect_send()
            .withf(|n| n.user_id == 1 && n.title == MISSED_DAILY_TITLE)
            .times(1)
            .returning(|_| Ok(()));
        let service = f.service(Arc::new(sender));

        assert_eq!(service.notify_missed_goals(day).await.unwrap(), 1);
        assert_eq!(service.notify_missed_goals(day).await.unwrap(), 0);

        let page = service.list(1, PageRequest::new(0, NOTIFICATION_PAGE_SIZE)).await.unwrap();
        assert_eq!(page.content.len(), 1);
        assert!(page.content[0].body.as_deref().unwrap().contains("walk"));
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_notification() {
        let f = Fixture::new();
        f.goal(1, "walk", true).await;
        let mut sender = MockNotificationSender::new();
        sender
            .expect_send()
            .returning(|_| Err(HyuError::external("push", "down")));
        let service = f.service(Arc::new(sender));

        assert_eq!(service.notify_missed_goals(date(2024, 5, 15)).await.unwrap(), 1);
        assert_eq!(service.unread_count(1).await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_read_flags() {
        let f = Fixture::new();
        f.goal(1, "walk", true).await;
        f.goal(1, "read", true).await;
        let service = f.service(Arc::new(LoggingNotificationSender::default()));
        service.notify_missed_goals(date(2024, 5, 14)).await.unwrap();
        assert_eq!(service.unread_count(1).await.unwrap().count, 2);

        let first = service.list(1, PageRequest::first()).await.unwrap().content[0].id;
        let err = service.mark_read(2, first).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(service.mark_read(1, 999).await.unwrap_err().status_code(), 404);

        service.mark_read(1, first).await.unwrap();
        assert_eq!(service.unread_count(1).await.unwrap().count, 1);

        assert_eq!(service.mark_all_read(1).await.unwrap().updated, 1);
        assert_eq!(service.unread_count(1).await.unwrap().count, 0);
    }
}
