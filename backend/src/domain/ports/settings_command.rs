//! Driving port for notification settings.

use async_trait::async_trait;

use crate::domain::Error;

/// Current notification recipients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationSettings {
    /// Address configured at deployment time; read-only.
    pub admin_email: Option<String>,
    /// Secondary address stored in the settings table.
    pub hall_contact_email: Option<String>,
}

/// Driving port for reading and updating notification settings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsCommand: Send + Sync {
    /// Read the configured recipients.
    async fn notification_settings(&self) -> Result<NotificationSettings, Error>;

    /// Replace the hall contact address. Blank input clears it.
    async fn update_hall_contact_email(&self, raw: &str) -> Result<NotificationSettings, Error>;
}
