//! Driving port for booking read models: listings, the audit log and counts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Booking, BookingCounts, BookingId, Error, Room, RoomId};

/// Default number of log entries returned.
pub const DEFAULT_LOG_LIMIT: u32 = 50;
/// Upper bound on log entries per request.
pub const MAX_LOG_LIMIT: u32 = 500;

const DISPLAY_DATE: &str = "%d.%m.%Y %H:%M";
const DISPLAY_TIME: &str = "%H:%M";

/// Filter for the active booking listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListBookingsRequest {
    pub room_id: Option<RoomId>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// One row of the admin log: a booking viewed as an audit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingLogEntry {
    pub booking_id: BookingId,
    pub room_id: RoomId,
    /// `pending`, `confirmed`, `rejected` or `deleted`.
    pub status: &'static str,
    pub status_label: &'static str,
    pub message: String,
    pub details: String,
    pub requester_email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&Booking> for BookingLogEntry {
    fn from(booking: &Booking) -> Self {
        let slot = booking.slot();
        let mut details = format!(
            "{} - {}",
            slot.start().format(DISPLAY_DATE),
            slot.end().format(DISPLAY_TIME)
        );
        let (status, status_label) = if booking.is_active() {
            (booking.status().as_str(), booking.status().label())
        } else {
            ("deleted", "Deleted")
        };
        if let Some(deleted_at) = booking.deleted_at() {
            details.push_str(&format!(" (deleted {})", deleted_at.format(DISPLAY_DATE)));
        }
        Self {
            booking_id: booking.id(),
            room_id: booking.room_id(),
            status,
            status_label,
            message: format!("Booking request from {}", booking.requester_name().as_str()),
            details,
            requester_email: booking.requester_email().to_string(),
            is_active: booking.is_active(),
            created_at: booking.created_at(),
            deleted_at: booking.deleted_at(),
        }
    }
}

/// Driving port for booking reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingQuery: Send + Sync {
    /// Active bookings, optionally filtered by room and start month.
    async fn list_active(&self, request: ListBookingsRequest) -> Result<Vec<Booking>, Error>;

    /// Newest bookings first, including soft-deleted ones.
    async fn list_log(&self, limit: Option<u32>) -> Result<Vec<BookingLogEntry>, Error>;

    /// Counts by status (active only) and deleted.
    async fn stats(&self) -> Result<BookingCounts, Error>;

    /// All rooms.
    async fn list_rooms(&self) -> Result<Vec<Room>, Error>;
}
