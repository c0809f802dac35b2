//! Lifecycle notification events handed to the notifier port.

use super::{Booking, EmailAddress};

/// What happened to the booking, plus any link material the email needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    /// New request; admins receive confirm/reject links.
    RequestCreated { decision_token: String },
    /// Acknowledgement to the requester that the request is pending.
    RequestReceived,
    /// Confirmation to the requester with a cancellation link.
    Confirmed { cancel_token: String },
    /// Rejection to the requester with the optional admin message.
    Rejected { reason: Option<String> },
    /// Admins learn that the requester cancelled a confirmed booking.
    CancelledByRequester,
}

impl NotificationKind {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RequestCreated { .. } => "request_created",
            Self::RequestReceived => "request_received",
            Self::Confirmed { .. } => "confirmed",
            Self::Rejected { .. } => "rejected",
            Self::CancelledByRequester => "cancelled_by_requester",
        }
    }
}

/// A single email to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipients: Vec<EmailAddress>,
    pub room_name: String,
    pub booking: Booking,
    pub kind: NotificationKind,
}
