//! Driving port for booking lifecycle mutations.
//!
//! Admin-only operations (`confirm`, `reject`, `delete`) assume the caller has
//! already been authenticated; authentication lives in the inbound adapter.

use async_trait::async_trait;

use crate::domain::{Booking, BookingId, BookingRequest, BookingStatus, Error};

/// Response from creating a booking request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBookingResponse {
    pub booking_id: BookingId,
    pub status: BookingStatus,
    /// Whether the admin notification was handed to the mail service.
    pub admin_notified: bool,
    /// Whether the acknowledgement reached the mail service.
    pub requester_notified: bool,
}

/// Decision carried by an admin email link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailDecision {
    Confirm,
    Reject,
}

/// Result of following an admin decision link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailDecisionOutcome {
    /// The decision was applied.
    Applied(Booking),
    /// The booking was no longer pending; nothing changed.
    AlreadyHandled(Booking),
}

/// Driving port for booking write operations.
///
/// Every failure maps onto the domain error taxonomy: `invalid_request`,
/// `not_found`, `conflict`, `invalid_state` and `invalid_token`, plus
/// `service_unavailable`/`internal_error` for store failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingCommand: Send + Sync {
    /// Submit a new request. Admins and the requester are notified.
    async fn create(&self, request: BookingRequest) -> Result<CreateBookingResponse, Error>;

    /// Confirm a pending booking after re-checking conflicts.
    async fn confirm(&self, id: BookingId) -> Result<Booking, Error>;

    /// Reject a pending booking with an optional message for the requester.
    async fn reject(&self, id: BookingId, reason: Option<String>) -> Result<Booking, Error>;

    /// Soft-delete a booking. Repeating the call is a no-op.
    async fn delete(&self, id: BookingId) -> Result<Booking, Error>;

    /// Cancel a confirmed booking using the requester's signed link.
    async fn cancel_with_token(&self, token: &str) -> Result<Booking, Error>;

    /// Apply an admin decision from a signed email link.
    async fn decide_with_token(
        &self,
        token: &str,
        decision: EmailDecision,
    ) -> Result<EmailDecisionOutcome, Error>;
}
