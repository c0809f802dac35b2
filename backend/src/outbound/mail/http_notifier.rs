//! Notifier posting RFC 822 messages to an HTTP mail API.
//!
//! The API accepts `{"raw": base64url(message)}` with a bearer token, the
//! shape used by Gmail's `users.messages.send`.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use reqwest::Client;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::domain::ports::{BookingNotifier, NotificationError};
use crate::domain::{EmailAddress, Notification};

use super::templates::{MailTemplates, RenderedMail};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_BODY: usize = 200;

/// Connection settings for the mail API.
#[derive(Clone)]
pub struct MailApiConfig {
    pub endpoint: String,
    pub token: Zeroizing<String>,
    pub sender: EmailAddress,
}

impl std::fmt::Debug for MailApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailApiConfig")
            .field("endpoint", &self.endpoint)
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

/// Encode a header value as an RFC 2047 word when it is not plain ASCII.
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_owned()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

/// Assemble a single-part HTML message.
pub(crate) fn build_message(
    sender: &EmailAddress,
    recipients: &[EmailAddress],
    mail: &RenderedMail,
) -> String {
    let to = recipients
        .iter()
        .map(EmailAddress::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "From: {sender}\r\nTo: {to}\r\nSubject: {}\r\nMIME-Version: 1.0\r\n\
         Content-Type: text/html; charset=UTF-8\r\nContent-Transfer-Encoding: base64\r\n\r\n{}",
        encode_header(&mail.subject),
        STANDARD.encode(mail.html.as_bytes()),
    )
}

/// Delivers notifications through the mail API.
#[derive(Debug, Clone)]
pub struct HttpMailNotifier {
    client: Client,
    config: MailApiConfig,
    templates: MailTemplates,
}

impl HttpMailNotifier {
    /// Build a notifier with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::Transport`] when the TLS backend cannot be
    /// initialised.
    pub fn new(config: MailApiConfig, templates: MailTemplates) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| NotificationError::transport(err.to_string()))?;
        Ok(Self {
            client,
            config,
            templates,
        })
    }
}

#[async_trait]
impl BookingNotifier for HttpMailNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        if notification.recipients.is_empty() {
            return Err(NotificationError::no_recipients());
        }
        let mail = self.templates.render(notification);
        let raw = build_message(&self.config.sender, &notification.recipients, &mail);
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(self.config.token.as_str())
            .json(&serde_json::json!({ "raw": URL_SAFE_NO_PAD.encode(raw.as_bytes()) }))
            .send()
            .await
            .map_err(|err| NotificationError::transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.chars().take(MAX_ERROR_BODY).collect();
            debug!(status = status.as_u16(), body = %message, "mail API refused message");
            return Err(NotificationError::rejected(status.as_u16(), message));
        }
        info!(
            booking_id = %notification.booking.id(),
            kind = notification.kind.name(),
            recipients = notification.recipients.len(),
            "notification sent"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "http_notifier_tests.rs"]
mod tests;
