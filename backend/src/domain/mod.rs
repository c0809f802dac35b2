//! Domain primitives, lifecycle rules and services.
//!
//! Purpose: keep booking semantics independent of HTTP, storage and mail.
//! Inbound adapters call the driving ports in [`ports`]; outbound adapters
//! implement the driven ones.
//!
//! Public surface:
//! - Error / ErrorCode: API error payload and stable identifiers.
//! - Booking, TimeSlot and friends: validated booking aggregate.
//! - BookingLifecycleService, SettingsService, AdminAuthService: services
//!   implementing the driving ports.

pub mod admin_auth;
pub mod booking;
pub mod booking_service;
pub mod conflict;
pub mod error;
pub mod lifecycle;
pub mod notification;
pub mod ports;
pub mod room;
pub mod setting;
pub mod settings_service;
pub mod token;
pub mod trace_id;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use self::admin_auth::{AdminAuthService, DEFAULT_SESSION_TTL};
pub use self::booking::{
    Booking, BookingCounts, BookingDraft, BookingFilter, BookingId, BookingRequest,
    BookingStatus, BookingValidationError, EmailAddress, ParseBookingStatusError, Purpose,
    RequesterName, RoomId, TimeSlot,
};
pub use self::booking_service::BookingLifecycleService;
pub use self::error::{Error, ErrorCode};
pub use self::notification::{Notification, NotificationKind};
pub use self::room::{NewRoom, Room, RoomValidationError};
pub use self::setting::{HALL_CONTACT_EMAIL_DESCRIPTION, HALL_CONTACT_EMAIL_KEY, Setting};
pub use self::settings_service::SettingsService;
pub use self::token::{InvalidToken, TokenCodec, TokenPurpose, WeakSecret};
pub use self::trace_id::TraceId;

/// HTTP header carrying the request trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use hall_booking::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::unauthorized("admin session required"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
