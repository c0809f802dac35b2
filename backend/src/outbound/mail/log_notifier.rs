//! Notifier that only logs, for deployments without a mail API.

use async_trait::async_trait;
use tracing::info;

use crate::domain::Notification;
use crate::domain::ports::{BookingNotifier, NotificationError};

use super::templates::MailTemplates;

/// Renders each notification and logs it instead of sending it.
#[derive(Debug, Clone)]
pub struct LoggingNotifier {
    templates: MailTemplates,
}

impl LoggingNotifier {
    pub fn new(templates: MailTemplates) -> Self {
        Self { templates }
    }
}

#[async_trait]
impl BookingNotifier for LoggingNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        if notification.recipients.is_empty() {
            return Err(NotificationError::no_recipients());
        }
        let mail = self.templates.render(notification);
        let recipients: Vec<&str> = notification
            .recipients
            .iter()
            .map(|address| address.as_str())
            .collect();
        info!(
            booking_id = %notification.booking.id(),
            kind = notification.kind.name(),
            ?recipients,
            subject = %mail.subject,
            "mail delivery disabled; notification logged"
        );
        Ok(())
    }
}
