//! Delivery of in-app notifications to devices.

use async_trait::async_trait;
use hyu_core::{HyuResult, Interface};
use hyu_domain::Notification;
use shaku::Component;
use tracing::info;

/// Pushes a stored notification to the user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSender: Interface + Send + Sync {
    async fn send(&self, notification: &Notification) -> HyuResult<()>;
}

/// Logs each notification instead of pushing it.
#[derive(Component, Debug, Clone)]
#[shaku(interface = NotificationSender)]
pub struct LoggingNotificationSender {
    #[shaku(default = "in-app".to_string())]
    channel: String,
}

impl LoggingNotificationSender {
    #[must_use]
    pub fn new(channel: impl Into<String>) -> Self {
        Self { channel: channel.into() }
    }
}

impl Default for LoggingNotificationSender {
    fn default() -> Self {
        Self::new("in-app")
    }
}

#[async_trait]
impl NotificationSender for LoggingNotificationSender {
    async fn send(&self, notification: &Notification) -> HyuResult<()> {
        info!(
            channel = %self.channel,
            user_id = notification.user_id,
            notification_id = notification.id,
            kind = %notification.kind,
            "Notification sent"
        );
        Ok(())
    }
}
