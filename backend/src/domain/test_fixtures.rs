//! Shared builders for domain unit tests.

use std::sync::Mutex;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use super::{
    Booking, BookingId, BookingRequest, BookingStatus, EmailAddress, RequesterName,
    RoomId, TimeSlot,
};

/// 2024-06-01 at `hour:minute` UTC.
pub(crate) fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// Slot on 2024-06-01 between two `(hour, minute)` pairs.
pub(crate) fn hm_slot(start: (u32, u32), end: (u32, u32)) -> TimeSlot {
    TimeSlot::new(at(start.0, start.1), at(end.0, end.1)).expect("ordered fixture slot")
}

pub(crate) fn request(room_id: RoomId, slot: TimeSlot) -> BookingRequest {
    BookingRequest {
        room_id,
        slot,
        requester_name: RequesterName::new("Ada Lovelace").expect("valid name"),
        requester_email: EmailAddress::new("ada@example.org").expect("valid email"),
        purpose: None,
    }
}

pub(crate) fn booking(id: i64, room_id: RoomId, slot: TimeSlot, status: BookingStatus) -> Booking {
    let mut booking = Booking::pending(BookingId::new(id), request(room_id, slot), at(8, 0));
    booking.set_status(status);
    booking
}

/// Clock that only moves when a test advances it.
pub(crate) struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub(crate) fn starting_at(start: DateTime<Utc>) -> Self {
        Self(Mutex::new(start))
    }

    pub(crate) fn advance(&self, by: chrono::Duration) {
        let mut now = self.0.lock().expect("clock lock");
        *now += by;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().expect("clock lock")
    }
}
