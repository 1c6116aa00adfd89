//! Outbound mail.

use async_trait::async_trait;
use hyu_core::text::mask_email;
use hyu_core::{HyuResult, Interface};
use shaku::Component;
use tracing::info;

/// Sends plain-text mail.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailSender: Interface + Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> HyuResult<()>;
}

/// Writes mail to the log instead of delivering it.
#[derive(Component, Debug, Clone, Default)]
#[shaku(interface = MailSender)]
pub struct LoggingMailSender {
    from: String,
}

impl LoggingMailSender {
    #[must_use]
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }

    #[must_use]
    pub fn parameters(from: impl Into<String>) -> LoggingMailSenderParameters {
        LoggingMailSenderParameters { from: from.into() }
    }
}

#[async_trait]
impl MailSender for LoggingMailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> HyuResult<()> {
        info!(
            from = %self.from,
            to = %mask_email(to),
            subject,
            body_chars = body.chars().count(),
            "Mail queued"
        );
        Ok(())
    }
}
