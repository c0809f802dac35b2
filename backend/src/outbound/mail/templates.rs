//! HTML email bodies for lifecycle notifications.

use crate::domain::{Booking, Notification, NotificationKind};

const DATE_FORMAT: &str = "%d.%m.%Y";
const TIME_FORMAT: &str = "%H:%M";

/// A rendered message ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    pub subject: String,
    pub html: String,
}

/// Escape text for inclusion in HTML element content or attribute values.
pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Renders notifications with links rooted at the public base URL.
#[derive(Debug, Clone)]
pub struct MailTemplates {
    base_url: String,
    hall_name: String,
}

impl MailTemplates {
    pub fn new(base_url: impl Into<String>, hall_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            hall_name: hall_name.into(),
        }
    }

    /// Absolute URL of a token link page, e.g. `/booking/cancel/{token}`.
    #[must_use]
    pub fn link(&self, action: &str, token: &str) -> String {
        format!("{}/booking/{action}/{token}", self.base_url)
    }

    fn details_table(booking: &Booking, room_name: &str) -> String {
        let slot = booking.slot();
        let mut rows = vec![
            ("Room", room_name.to_owned()),
            ("Date", slot.start().format(DATE_FORMAT).to_string()),
            (
                "Time",
                format!(
                    "{} - {} (UTC)",
                    slot.start().format(TIME_FORMAT),
                    slot.end().format(TIME_FORMAT)
                ),
            ),
            ("Name", booking.requester_name().as_str().to_owned()),
            ("Email", booking.requester_email().to_string()),
        ];
        if let Some(purpose) = booking.purpose() {
            rows.push(("Purpose", purpose.as_str().to_owned()));
        }
        let body: String = rows
            .into_iter()
            .map(|(label, value)| {
                format!(
                    "<tr><th align=\"left\">{label}</th><td>{}</td></tr>",
                    escape_html(&value)
                )
            })
            .collect();
        format!("<table cellpadding=\"4\">{body}</table>")
    }

    fn button(href: &str, label: &str, colour: &str) -> String {
        format!(
            "<a href=\"{}\" style=\"display:inline-block;padding:10px 18px;margin-right:8px;\
             background:{colour};color:#fff;text-decoration:none;border-radius:4px\">{label}</a>",
            escape_html(href)
        )
    }

    fn page(title: &str, content: &str) -> String {
        format!(
            "<!DOCTYPE html><html><body style=\"font-family:sans-serif\">\
             <h2>{}</h2>{content}</body></html>",
            escape_html(title)
        )
    }

    /// Render `notification` into a subject and HTML body.
    #[must_use]
    pub fn render(&self, notification: &Notification) -> RenderedMail {
        let booking = &notification.booking;
        let requester = booking.requester_name().as_str();
        let hall = &self.hall_name;
        let details = Self::details_table(booking, &notification.room_name);

        let (subject, title, content) = match &notification.kind {
            NotificationKind::RequestCreated { decision_token } => (
                format!("New booking request - {requester}"),
                "New booking request".to_owned(),
                format!(
                    "<p>A new booking request is waiting for a decision.</p>{details}<p>{}{}</p>\
                     <p><small>These links expire after 24 hours.</small></p>",
                    Self::button(&self.link("confirm", decision_token), "Confirm", "#2e7d32"),
                    Self::button(&self.link("reject", decision_token), "Reject", "#c62828"),
                ),
            ),
            NotificationKind::RequestReceived => (
                format!("Your booking request for {hall}"),
                "Booking request received".to_owned(),
                format!(
                    "<p>Hello {},</p><p>we have received your request. You will get another \
                     email once it has been reviewed.</p>{details}",
                    escape_html(requester)
                ),
            ),
            NotificationKind::Confirmed { cancel_token } => (
                format!("Booking confirmed - {hall}"),
                "Booking confirmed".to_owned(),
                format!(
                    "<p>Hello {},</p><p>your booking has been confirmed.</p>{details}\
                     <p>If you can no longer use the slot, please cancel it:</p><p>{}</p>",
                    escape_html(requester),
                    Self::button(&self.link("cancel", cancel_token), "Cancel booking", "#616161"),
                ),
            ),
            NotificationKind::Rejected { reason } => {
                let reason = reason
                    .as_deref()
                    .map(|text| format!("<p><strong>Message:</strong> {}</p>", escape_html(text)))
                    .unwrap_or_default();
                (
                    format!("Booking declined - {hall}"),
                    "Booking declined".to_owned(),
                    format!(
                        "<p>Hello {},</p><p>unfortunately your booking request could not be \
                         accepted.</p>{reason}{details}",
                        escape_html(requester)
                    ),
                )
            }
            NotificationKind::CancelledByRequester => (
                format!("Cancellation - {requester}"),
                "Booking cancelled".to_owned(),
                format!("<p>A confirmed booking was cancelled by the requester.</p>{details}"),
            ),
        };

        RenderedMail {
            subject,
            html: Self::page(&title, &content),
        }
    }
}
