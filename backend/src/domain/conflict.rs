//! Overlap detection between a candidate slot and confirmed bookings.
//!
//! This is the single conflict predicate. Every transition that can produce
//! a confirmed, active booking (creation admission and confirmation from any
//! entry point) runs it against a snapshot loaded inside the same store
//! transaction.

use super::{Booking, BookingId, RoomId, TimeSlot};

/// Whether `existing` blocks `slot` in `room_id`.
///
/// Only confirmed, active bookings block; pending and rejected requests may
/// overlap freely. `exclude` skips the booking being confirmed.
#[must_use]
pub fn blocks(
    existing: &Booking,
    room_id: RoomId,
    slot: &TimeSlot,
    exclude: Option<BookingId>,
) -> bool {
    existing.room_id() == room_id
        && existing.is_blocking()
        && exclude != Some(existing.id())
        && existing.slot().overlaps(slot)
}

/// First booking in `bookings` that blocks `slot`, if any.
pub fn find_conflict<'a, I>(
    bookings: I,
    room_id: RoomId,
    slot: &TimeSlot,
    exclude: Option<BookingId>,
) -> Option<BookingId>
where
    I: IntoIterator<Item = &'a Booking>,
{
    bookings
        .into_iter()
        .find(|existing| blocks(existing, room_id, slot, exclude))
        .map(Booking::id)
}

/// Whether any booking in `bookings` blocks `slot`.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use hall_booking::domain::{RoomId, TimeSlot, conflict::has_conflict};
///
/// let at = |h| Utc.with_ymd_and_hms(2024, 6, 1, h, 0, 0).unwrap();
/// let slot = TimeSlot::new(at(10), at(11)).expect("ordered");
/// assert!(!has_conflict(&[], RoomId::new(1), &slot, None));
/// ```
pub fn has_conflict<'a, I>(
    bookings: I,
    room_id: RoomId,
    slot: &TimeSlot,
    exclude: Option<BookingId>,
) -> bool
where
    I: IntoIterator<Item = &'a Booking>,
{
    find_conflict(bookings, room_id, slot, exclude).is_some()
}
