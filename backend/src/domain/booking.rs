//! Booking aggregate and its validated value types.
//!
//! A booking reserves a [`TimeSlot`] in one room. Its lifecycle has two
//! independent axes: [`BookingStatus`] (pending, confirmed or rejected) and the
//! soft-delete flag. Mutation happens only through
//! [`crate::domain::lifecycle`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum characters accepted for a requester name.
pub const REQUESTER_NAME_MAX: usize = 100;
/// Maximum characters accepted for an email address.
pub const EMAIL_MAX: usize = 120;
/// Maximum characters accepted for a booking purpose.
pub const PURPOSE_MAX: usize = 500;

/// Validation failures for booking input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingValidationError {
    /// The slot ends at or before its start.
    #[error("booking must end after it starts")]
    EmptyInterval,
    /// The requester name is blank.
    #[error("requester name must not be empty")]
    EmptyName,
    /// The requester name exceeds [`REQUESTER_NAME_MAX`].
    #[error("requester name must be at most {max} characters")]
    NameTooLong { max: usize },
    /// The email address is malformed.
    #[error("email address is not valid")]
    InvalidEmail,
    /// The email address exceeds [`EMAIL_MAX`].
    #[error("email address must be at most {max} characters")]
    EmailTooLong { max: usize },
    /// The purpose text exceeds [`PURPOSE_MAX`].
    #[error("purpose must be at most {max} characters")]
    PurposeTooLong { max: usize },
}

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw database identifier.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Raw database identifier.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

integer_id!(
    /// Identifier of a booking row.
    BookingId
);
integer_id!(
    /// Identifier of a room row.
    RoomId
);

/// Decision state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Awaiting an administrator decision.
    Pending,
    /// Approved; blocks overlapping requests while active.
    Confirmed,
    /// Declined by an administrator.
    Rejected,
}

impl BookingStatus {
    /// Stable storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
        }
    }

    /// Human-readable label used in pages and emails.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown booking status: {0}")]
pub struct ParseBookingStatusError(pub String);

impl FromStr for BookingStatus {
    type Err = ParseBookingStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "rejected" => Ok(Self::Rejected),
            other => Err(ParseBookingStatusError(other.to_owned())),
        }
    }
}

/// Half-open time interval `[start, end)` with `start < end`.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use hall_booking::domain::TimeSlot;
///
/// let at = |h| Utc.with_ymd_and_hms(2024, 6, 1, h, 0, 0).unwrap();
/// let morning = TimeSlot::new(at(9), at(10)).expect("ordered");
/// let late_morning = TimeSlot::new(at(10), at(11)).expect("ordered");
/// assert!(!morning.overlaps(&late_morning));
/// assert!(TimeSlot::new(at(10), at(10)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeSlot {
    /// Build a slot, rejecting empty or inverted intervals.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, BookingValidationError> {
        if start >= end {
            return Err(BookingValidationError::EmptyInterval);
        }
        Ok(Self { start, end })
    }

    /// Inclusive start instant.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive end instant.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether the two slots share any instant. Touching endpoints do not.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// Non-empty requester name of at most [`REQUESTER_NAME_MAX`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RequesterName(String);

impl RequesterName {
    /// Trim and validate a name.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, BookingValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(BookingValidationError::EmptyName);
        }
        if trimmed.chars().count() > REQUESTER_NAME_MAX {
            return Err(BookingValidationError::NameTooLong {
                max: REQUESTER_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Syntactically plausible email address.
///
/// The check is deliberately shallow: one `@`, a non-empty local part, a dotted
/// domain and no whitespace. Deliverability is the mail provider's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Trim and validate an address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, BookingValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.chars().count() > EMAIL_MAX {
            return Err(BookingValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(BookingValidationError::InvalidEmail);
        };
        let domain_ok = domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains('@');
        if local.is_empty() || !domain_ok || trimmed.chars().any(char::is_whitespace) {
            return Err(BookingValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optional free-text purpose of at most [`PURPOSE_MAX`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Purpose(String);

impl Purpose {
    /// Trim and validate; blank input yields `None`.
    pub fn parse(raw: Option<&str>) -> Result<Option<Self>, BookingValidationError> {
        let Some(trimmed) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Ok(None);
        };
        if trimmed.chars().count() > PURPOSE_MAX {
            return Err(BookingValidationError::PurposeTooLong { max: PURPOSE_MAX });
        }
        Ok(Some(Self(trimmed.to_owned())))
    }

    /// Borrow the text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated input for a new booking request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub room_id: RoomId,
    pub slot: TimeSlot,
    pub requester_name: RequesterName,
    pub requester_email: EmailAddress,
    pub purpose: Option<Purpose>,
}

/// Field bundle used to hydrate a [`Booking`] from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDraft {
    pub id: BookingId,
    pub room_id: RoomId,
    pub slot: TimeSlot,
    pub requester_name: RequesterName,
    pub requester_email: EmailAddress,
    pub purpose: Option<Purpose>,
    pub status: BookingStatus,
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A reservation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    id: BookingId,
    room_id: RoomId,
    slot: TimeSlot,
    requester_name: RequesterName,
    requester_email: EmailAddress,
    purpose: Option<Purpose>,
    status: BookingStatus,
    is_active: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl Booking {
    /// Hydrate a booking from its stored fields.
    #[must_use]
    pub fn new(draft: BookingDraft) -> Self {
        let BookingDraft {
            id,
            room_id,
            slot,
            requester_name,
            requester_email,
            purpose,
            status,
            is_active,
            deleted_at,
            created_at,
        } = draft;
        Self {
            id,
            room_id,
            slot,
            requester_name,
            requester_email,
            purpose,
            status,
            is_active,
            deleted_at,
            created_at,
        }
    }

    /// Materialise a freshly inserted pending booking.
    #[must_use]
    pub fn pending(id: BookingId, request: BookingRequest, created_at: DateTime<Utc>) -> Self {
        let BookingRequest {
            room_id,
            slot,
            requester_name,
            requester_email,
            purpose,
        } = request;
        Self::new(BookingDraft {
            id,
            room_id,
            slot,
            requester_name,
            requester_email,
            purpose,
            status: BookingStatus::Pending,
            is_active: true,
            deleted_at: None,
            created_at,
        })
    }

    pub fn id(&self) -> BookingId {
        self.id
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn slot(&self) -> &TimeSlot {
        &self.slot
    }

    pub fn requester_name(&self) -> &RequesterName {
        &self.requester_name
    }

    pub fn requester_email(&self) -> &EmailAddress {
        &self.requester_email
    }

    pub fn purpose(&self) -> Option<&Purpose> {
        self.purpose.as_ref()
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    /// `false` once the booking has been soft-deleted or cancelled.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Confirmed and active: the only combination that blocks other bookings.
    pub fn is_blocking(&self) -> bool {
        self.is_active && self.status == BookingStatus::Confirmed
    }

    pub(crate) fn set_status(&mut self, status: BookingStatus) {
        self.status = status;
    }

    pub(crate) fn deactivate(&mut self, at: DateTime<Utc>) {
        self.is_active = false;
        self.deleted_at = Some(at);
    }
}

/// Read-side filter for active booking listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingFilter {
    /// Restrict to one room.
    pub room_id: Option<RoomId>,
    /// Restrict to bookings starting within `[from, until)`.
    pub starts_within: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl BookingFilter {
    /// Whether `booking` is active and satisfies every configured criterion.
    #[must_use]
    pub fn admits(&self, booking: &Booking) -> bool {
        let room_ok = self.room_id.is_none_or(|room| booking.room_id() == room);
        let window_ok = self.starts_within.is_none_or(|(from, until)| {
            booking.slot().start() >= from && booking.slot().start() < until
        });
        booking.is_active() && room_ok && window_ok
    }
}

/// Booking counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BookingCounts {
    /// Every booking ever stored, deleted ones included.
    pub total: u64,
    pub pending: u64,
    pub confirmed: u64,
    pub rejected: u64,
    /// Soft-deleted or cancelled bookings.
    pub deleted: u64,
}

impl BookingCounts {
    /// Tally a set of bookings.
    pub fn tally<'a>(bookings: impl IntoIterator<Item = &'a Booking>) -> Self {
        bookings
            .into_iter()
            .fold(Self::default(), |mut counts, booking| {
                counts.total += 1;
                if booking.is_active() {
                    match booking.status() {
                        BookingStatus::Pending => counts.pending += 1,
                        BookingStatus::Confirmed => counts.confirmed += 1,
                        BookingStatus::Rejected => counts.rejected += 1,
                    }
                } else {
                    counts.deleted += 1;
                }
                counts
            })
    }
}
