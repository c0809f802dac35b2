//! Booking lifecycle state machine.
//!
//! Pure transition rules over a loaded [`Booking`] and the blocking snapshot
//! of its room. Store adapters call [`admit`] and [`apply`] inside the
//! transaction that persists the result, so the decision and the write are
//! atomic.
//!
//! ```text
//!            confirm             cancel (token)
//! pending ─────────────▶ confirmed ─────────────▶ inactive
//!    │  reject                  │ delete (admin)
//!    └──────────▶ rejected      ▼
//!                            inactive
//! ```
//!
//! Soft deletion is orthogonal to status and one-way.

use chrono::{DateTime, Utc};

use super::conflict::find_conflict;
use super::{Booking, BookingId, BookingRequest, BookingStatus, RoomId};

/// A requested state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Admin approval; legal only from pending and active.
    Confirm,
    /// Admin refusal; legal only from pending and active.
    Reject,
    /// Admin soft delete; idempotent.
    SoftDelete,
    /// Requester cancellation via a signed link; legal only from confirmed
    /// and active.
    CancelByRequester,
}

impl Transition {
    /// Verb used in error messages and logs.
    #[must_use]
    pub const fn action(self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Reject => "reject",
            Self::SoftDelete => "delete",
            Self::CancelByRequester => "cancel",
        }
    }

    /// Whether applying this transition needs the room's blocking snapshot.
    #[must_use]
    pub const fn needs_conflict_check(self) -> bool {
        matches!(self, Self::Confirm)
    }
}

/// Why a transition was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("booking {0} not found")]
    BookingNotFound(BookingId),
    #[error("room {0} not found")]
    RoomNotFound(RoomId),
    #[error("requested slot overlaps confirmed booking {with}")]
    Conflict { with: BookingId },
    #[error("cannot {action} booking {id} while it is {state}")]
    InvalidState {
        id: BookingId,
        action: &'static str,
        state: &'static str,
    },
}

/// Result of a permitted transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The booking changed and must be written back.
    Changed(Booking),
    /// The transition was a no-op (repeated soft delete).
    Unchanged(Booking),
}

impl Outcome {
    /// The booking after the transition.
    #[must_use]
    pub fn booking(&self) -> &Booking {
        match self {
            Self::Changed(booking) | Self::Unchanged(booking) => booking,
        }
    }

    /// Consume the outcome, returning the booking.
    #[must_use]
    pub fn into_booking(self) -> Booking {
        match self {
            Self::Changed(booking) | Self::Unchanged(booking) => booking,
        }
    }

    #[must_use]
    pub const fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

fn state_name(booking: &Booking) -> &'static str {
    if booking.is_active() {
        booking.status().as_str()
    } else {
        "deleted"
    }
}

fn invalid(booking: &Booking, transition: Transition) -> TransitionError {
    TransitionError::InvalidState {
        id: booking.id(),
        action: transition.action(),
        state: state_name(booking),
    }
}

/// Admission check for a new request against the room's blocking snapshot.
///
/// Pending requests may coexist, so only confirmed, active bookings count.
pub fn admit<'a, I>(request: &BookingRequest, snapshot: I) -> Result<(), TransitionError>
where
    I: IntoIterator<Item = &'a Booking>,
{
    match find_conflict(snapshot, request.room_id, &request.slot, None) {
        Some(with) => Err(TransitionError::Conflict { with }),
        None => Ok(()),
    }
}

/// Apply `transition` to `booking` at `now`.
///
/// `snapshot` must contain the confirmed, active bookings of the room that may
/// overlap the booking's slot; it is consulted only for [`Transition::Confirm`].
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use hall_booking::domain::lifecycle::{Transition, TransitionError, apply};
/// use hall_booking::domain::{
///     Booking, BookingId, BookingRequest, BookingStatus, EmailAddress, RequesterName, RoomId,
///     TimeSlot,
/// };
///
/// let at = |h| Utc.with_ymd_and_hms(2024, 6, 1, h, 0, 0).unwrap();
/// let request = BookingRequest {
///     room_id: RoomId::new(1),
///     slot: TimeSlot::new(at(10), at(11)).unwrap(),
///     requester_name: RequesterName::new("Ada").unwrap(),
///     requester_email: EmailAddress::new("ada@example.org").unwrap(),
///     purpose: None,
/// };
/// let pending = Booking::pending(BookingId::new(1), request, at(8));
/// let rejected = apply(&pending, Transition::Reject, &[], at(9)).unwrap().into_booking();
/// assert_eq!(rejected.status(), BookingStatus::Rejected);
/// assert!(matches!(
///     apply(&rejected, Transition::Confirm, &[], at(9)),
///     Err(TransitionError::InvalidState { .. })
/// ));
/// ```
pub fn apply(
    booking: &Booking,
    transition: Transition,
    snapshot: &[Booking],
    now: DateTime<Utc>,
) -> Result<Outcome, TransitionError> {
    let mut next = booking.clone();
    match transition {
        Transition::Confirm => {
            ensure_pending(booking, transition)?;
            if let Some(with) = find_conflict(
                snapshot,
                booking.room_id(),
                booking.slot(),
                Some(booking.id()),
            ) {
                return Err(TransitionError::Conflict { with });
            }
            next.set_status(BookingStatus::Confirmed);
        }
        Transition::Reject => {
            ensure_pending(booking, transition)?;
            next.set_status(BookingStatus::Rejected);
        }
        Transition::SoftDelete => {
            if !booking.is_active() {
                return Ok(Outcome::Unchanged(next));
            }
            next.deactivate(now);
        }
        Transition::CancelByRequester => {
            if !booking.is_blocking() {
                return Err(invalid(booking, transition));
            }
            next.deactivate(now);
        }
    }
    Ok(Outcome::Changed(next))
}

fn ensure_pending(booking: &Booking, transition: Transition) -> Result<(), TransitionError> {
    if booking.is_active() && booking.status() == BookingStatus::Pending {
        Ok(())
    } else {
        Err(invalid(booking, transition))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;
    use crate::domain::test_fixtures::{at, booking, hm_slot, request};

    const ROOM: RoomId = RoomId::new(1);

    fn pending(id: i64) -> Booking {
        booking(id, ROOM, hm_slot((10, 0), (11, 0)), BookingStatus::Pending)
    }

    #[rstest]
    fn admit_allows_overlap_with_pending_requests() {
        let other = pending(1);
        assert_eq!(admit(&request(ROOM, hm_slot((10, 30), (11, 30))), [&other]), Ok(()));
    }

    #[rstest]
    fn admit_refuses_overlap_with_confirmed_booking() {
        let confirmed = booking(4, ROOM, hm_slot((10, 0), (11, 0)), BookingStatus::Confirmed);
        assert_eq!(
            admit(&request(ROOM, hm_slot((10, 30), (11, 30))), [&confirmed]),
            Err(TransitionError::Conflict {
                with: BookingId::new(4)
            })
        );
    }

    #[rstest]
    fn confirm_sets_status_and_keeps_activity() {
        let outcome = apply(&pending(1), Transition::Confirm, &[], at(9, 0)).expect("confirm");
        assert!(outcome.is_changed());
        let confirmed = outcome.into_booking();
        assert_eq!(confirmed.status(), BookingStatus::Confirmed);
        assert!(confirmed.is_active());
    }

    #[rstest]
    fn confirm_rechecks_conflicts_excluding_itself() {
        let subject = pending(2);
        let confirmed = booking(1, ROOM, hm_slot((10, 30), (11, 30)), BookingStatus::Confirmed);
        assert_eq!(
            apply(&subject, Transition::Confirm, &[confirmed], at(9, 0)),
            Err(TransitionError::Conflict {
                with: BookingId::new(1)
            })
        );

        let mut itself = subject.clone();
        itself.set_status(BookingStatus::Confirmed);
        assert!(apply(&subject, Transition::Confirm, &[itself], at(9, 0)).is_ok());
    }

    #[rstest]
    #[case(BookingStatus::Confirmed, Transition::Confirm, "confirmed")]
    #[case(BookingStatus::Rejected, Transition::Confirm, "rejected")]
    #[case(BookingStatus::Confirmed, Transition::Reject, "confirmed")]
    #[case(BookingStatus::Rejected, Transition::Reject, "rejected")]
    #[case(BookingStatus::Pending, Transition::CancelByRequester, "pending")]
    #[case(BookingStatus::Rejected, Transition::CancelByRequester, "rejected")]
    fn decisions_only_from_legal_states(
        #[case] status: BookingStatus,
        #[case] transition: Transition,
        #[case] state: &'static str,
    ) {
        let subject = booking(3, ROOM, hm_slot((10, 0), (11, 0)), status);
        assert_eq!(
            apply(&subject, transition, &[], at(9, 0)),
            Err(TransitionError::InvalidState {
                id: BookingId::new(3),
                action: transition.action(),
                state,
            })
        );
    }

    #[rstest]
    #[case(Transition::Confirm)]
    #[case(Transition::Reject)]
    #[case(Transition::CancelByRequester)]
    fn inactive_bookings_refuse_decisions(#[case] transition: Transition) {
        let mut subject = booking(3, ROOM, hm_slot((10, 0), (11, 0)), BookingStatus::Confirmed);
        if transition != Transition::CancelByRequester {
            subject.set_status(BookingStatus::Pending);
        }
        subject.deactivate(at(8, 30));
        assert!(matches!(
            apply(&subject, transition, &[], at(9, 0)),
            Err(TransitionError::InvalidState { state: "deleted", .. })
        ));
    }

    #[rstest]
    fn soft_delete_is_idempotent_and_keeps_first_timestamp() {
        let first = apply(&pending(1), Transition::SoftDelete, &[], at(9, 0))
            .expect("first delete")
            .into_booking();
        assert!(!first.is_active());
        assert_eq!(first.deleted_at(), Some(at(9, 0)));

        let again = apply(&first, Transition::SoftDelete, &[], at(12, 0)).expect("second delete");
        assert!(!again.is_changed());
        assert_eq!(again.booking().deleted_at(), Some(at(9, 0)));
    }

    #[rstest]
    fn cancel_deactivates_confirmed_booking() {
        let confirmed = booking(1, ROOM, hm_slot((10, 0), (11, 0)), BookingStatus::Confirmed);
        let cancelled = apply(&confirmed, Transition::CancelByRequester, &[], at(9, 0))
            .expect("cancel")
            .into_booking();
        assert!(!cancelled.is_active());
        assert_eq!(cancelled.status(), BookingStatus::Confirmed);
        assert_eq!(cancelled.deleted_at(), Some(at(9, 0)));
    }
}
