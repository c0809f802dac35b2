//! Port for delivering lifecycle notifications.

use async_trait::async_trait;

use crate::domain::Notification;

use super::define_port_error;

define_port_error! {
    /// Delivery failures. These are logged and never undo a transition.
    pub enum NotificationError {
        /// The notification had nobody to send to.
        NoRecipients => "notification has no recipients",
        /// The transport could not be reached.
        Transport { message: String } => "mail transport failed: {message}",
        /// The mail service refused the message.
        Rejected { status: u16, message: String } =>
            "mail service rejected message with status {status}: {message}",
    }
}

/// Port consuming lifecycle notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingNotifier: Send + Sync {
    /// Deliver one notification.
    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError>;
}
