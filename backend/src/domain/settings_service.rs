//! Notification settings service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{NotificationSettings, SettingsCommand, SettingsRepository};
use crate::domain::{
    EmailAddress, Error, HALL_CONTACT_EMAIL_DESCRIPTION, HALL_CONTACT_EMAIL_KEY, Setting,
};

/// Settings service implementing [`SettingsCommand`].
#[derive(Clone)]
pub struct SettingsService<S> {
    settings: Arc<S>,
    admin_email: Option<EmailAddress>,
}

impl<S> SettingsService<S> {
    pub fn new(settings: Arc<S>, admin_email: Option<EmailAddress>) -> Self {
        Self {
            settings,
            admin_email,
        }
    }
}

impl<S: SettingsRepository> SettingsService<S> {
    async fn hall_contact_email(&self) -> Result<Option<String>, Error> {
        let setting = self
            .settings
            .get(HALL_CONTACT_EMAIL_KEY)
            .await
            .map_err(Error::from)?;
        Ok(setting
            .map(|setting| setting.value.trim().to_owned())
            .filter(|value| !value.is_empty()))
    }

    fn snapshot(&self, hall_contact_email: Option<String>) -> NotificationSettings {
        NotificationSettings {
            admin_email: self.admin_email.as_ref().map(ToString::to_string),
            hall_contact_email,
        }
    }
}

#[async_trait]
impl<S: SettingsRepository> SettingsCommand for SettingsService<S> {
    async fn notification_settings(&self) -> Result<NotificationSettings, Error> {
        let contact = self.hall_contact_email().await?;
        Ok(self.snapshot(contact))
    }

    async fn update_hall_contact_email(&self, raw: &str) -> Result<NotificationSettings, Error> {
        let trimmed = raw.trim();
        let value = if trimmed.is_empty() {
            None
        } else {
            let address = EmailAddress::new(trimmed).map_err(|err| {
                Error::invalid_request(err.to_string()).with_details(json!({ "field": "email" }))
            })?;
            Some(address.to_string())
        };

        let setting = Setting::new(
            HALL_CONTACT_EMAIL_KEY,
            value.clone().unwrap_or_default(),
            Some(HALL_CONTACT_EMAIL_DESCRIPTION.to_owned()),
        );
        self.settings
            .upsert(&setting)
            .await
            .map_err(Error::from)?;
        info!(cleared = value.is_none(), "hall contact email updated");
        Ok(self.snapshot(value))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MockSettingsRepository, SettingsRepositoryError};

    fn service(repo: MockSettingsRepository) -> SettingsService<MockSettingsRepository> {
        SettingsService::new(
            Arc::new(repo),
            Some(EmailAddress::new("admin@example.org").expect("valid email")),
        )
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some("  "), None)]
    #[case(Some("hall@example.org"), Some("hall@example.org"))]
    #[tokio::test]
    async fn reads_both_recipients(#[case] stored: Option<&str>, #[case] expected: Option<&str>) {
        let stored = stored.map(|value| Setting::new(HALL_CONTACT_EMAIL_KEY, value, None));
        let mut repo = MockSettingsRepository::new();
        repo.expect_get()
            .withf(|key| key == HALL_CONTACT_EMAIL_KEY)
            .return_once(move |_| Ok(stored));

        let settings = service(repo)
            .notification_settings()
            .await
            .expect("settings read");
        assert_eq!(settings.admin_email.as_deref(), Some("admin@example.org"));
        assert_eq!(settings.hall_contact_email.as_deref(), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn update_trims_and_stores_description() {
        let mut repo = MockSettingsRepository::new();
        repo.expect_upsert()
            .withf(|setting| {
                setting.value == "hall@example.org"
                    && setting.description.as_deref() == Some(HALL_CONTACT_EMAIL_DESCRIPTION)
            })
            .times(1)
            .returning(|_| Ok(()));

        let settings = service(repo)
            .update_hall_contact_email("  hall@example.org ")
            .await
            .expect("update succeeds");
        assert_eq!(settings.hall_contact_email.as_deref(), Some("hall@example.org"));
    }

    #[rstest]
    #[tokio::test]
    async fn blank_update_clears_the_address() {
        let mut repo = MockSettingsRepository::new();
        repo.expect_upsert()
            .withf(|setting| setting.value.is_empty())
            .times(1)
            .returning(|_| Ok(()));

        let settings = service(repo)
            .update_hall_contact_email("   ")
            .await
            .expect("clear succeeds");
        assert_eq!(settings.hall_contact_email, None);
    }

    #[rstest]
    #[tokio::test]
    async fn invalid_address_is_rejected_without_writing() {
        let mut repo = MockSettingsRepository::new();
        repo.expect_upsert().never();

        let err = service(repo)
            .update_hall_contact_email("not-an-address")
            .await
            .expect_err("invalid address");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn connection_failures_are_unavailable() {
        let mut repo = MockSettingsRepository::new();
        repo.expect_get()
            .return_once(|_| Err(SettingsRepositoryError::connection("refused")));

        let err = service(repo)
            .notification_settings()
            .await
            .expect_err("store down");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
