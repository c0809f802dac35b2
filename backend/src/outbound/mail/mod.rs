//! Email delivery adapters for the `BookingNotifier` port.

mod http_notifier;
mod log_notifier;
mod templates;

pub use http_notifier::{HttpMailNotifier, MailApiConfig};
pub use log_notifier::LoggingNotifier;
pub(crate) use templates::escape_html;
pub use templates::{MailTemplates, RenderedMail};
