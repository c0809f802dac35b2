//! Internal Diesel row structs for database operations.
//!
//! These types never leave the persistence layer. Conversions into domain
//! types re-run domain validation and report failures as strings so the
//! calling repository can wrap them in its own query error.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{
    Booking, BookingDraft, BookingId, BookingStatus, EmailAddress, NewRoom, Purpose,
    RequesterName, Room, RoomId, Setting, TimeSlot,
};

use super::schema::{bookings, rooms, settings};

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = rooms)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RoomRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = rooms)]
pub(crate) struct NewRoomRow<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
}

impl TryFrom<RoomRow> for Room {
    type Error = String;

    fn try_from(row: RoomRow) -> Result<Self, Self::Error> {
        let fields = NewRoom::new(row.name, row.description)
            .map_err(|err| format!("room {}: {err}", row.id))?;
        Ok(Room::new(RoomId::new(row.id), fields))
    }
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookingRow {
    pub id: i64,
    pub room_id: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub requester_name: String,
    pub requester_email: String,
    pub purpose: Option<String>,
    pub status: String,
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub(crate) struct NewBookingRow<'a> {
    pub room_id: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub requester_name: &'a str,
    pub requester_email: &'a str,
    pub purpose: Option<&'a str>,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle columns written back after a transition.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = bookings)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct BookingStateChange {
    pub status: &'static str,
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&Booking> for BookingStateChange {
    fn from(booking: &Booking) -> Self {
        Self {
            status: booking.status().as_str(),
            is_active: booking.is_active(),
            deleted_at: booking.deleted_at(),
        }
    }
}

impl TryFrom<BookingRow> for Booking {
    type Error = String;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let invalid = |err: &dyn std::fmt::Display| format!("booking {id}: {err}");
        Ok(Booking::new(BookingDraft {
            id: BookingId::new(row.id),
            room_id: RoomId::new(row.room_id),
            slot: TimeSlot::new(row.starts_at, row.ends_at).map_err(|err| invalid(&err))?,
            requester_name: RequesterName::new(&row.requester_name)
                .map_err(|err| invalid(&err))?,
            requester_email: EmailAddress::new(&row.requester_email)
                .map_err(|err| invalid(&err))?,
            purpose: Purpose::parse(row.purpose.as_deref()).map_err(|err| invalid(&err))?,
            status: row
                .status
                .parse::<BookingStatus>()
                .map_err(|err| invalid(&err))?,
            is_active: row.is_active,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
        }))
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SettingRow {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = settings)]
pub(crate) struct SettingUpsert<'a> {
    pub key: &'a str,
    pub value: &'a str,
    pub description: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

impl From<SettingRow> for Setting {
    fn from(row: SettingRow) -> Self {
        Setting::new(row.key, row.value, row.description)
    }
}
