//! Port for booking persistence.
//!
//! Writes go through [`BookingRepository::insert`] and
//! [`BookingRepository::mutate`], which run the lifecycle rules inside a
//! single store transaction: lock the room, load the blocking snapshot, decide,
//! write. Two concurrent confirmations for overlapping slots therefore
//! serialise and the second observes the first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::lifecycle::{Outcome, Transition, TransitionError};
use crate::domain::{Booking, BookingCounts, BookingFilter, BookingId, BookingRequest};

use super::define_store_error;

define_store_error! {
    /// Errors raised by booking repository adapters.
    pub enum BookingRepositoryError => "booking repository"
}

/// Failure of a transactional write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingWriteError {
    /// The lifecycle rules refused the change; nothing was written.
    #[error(transparent)]
    Refused(#[from] TransitionError),
    /// The store failed; the transaction was rolled back.
    #[error(transparent)]
    Store(#[from] BookingRepositoryError),
}

/// Port for reading and transactionally mutating bookings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Admit and insert a pending booking created at `now`.
    ///
    /// Fails with [`TransitionError::RoomNotFound`] for unknown rooms and
    /// [`TransitionError::Conflict`] when a confirmed, active booking overlaps.
    async fn insert(
        &self,
        request: &BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingWriteError>;

    /// Apply `transition` to booking `id` at `now` and persist the result.
    async fn mutate(
        &self,
        id: BookingId,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<Outcome, BookingWriteError>;

    /// Load one booking regardless of its active flag.
    async fn find(&self, id: BookingId) -> Result<Option<Booking>, BookingRepositoryError>;

    /// Active bookings matching `filter`, ordered by start.
    async fn list_active(
        &self,
        filter: &BookingFilter,
    ) -> Result<Vec<Booking>, BookingRepositoryError>;

    /// Most recently created bookings, newest first, including inactive ones.
    async fn list_recent(&self, limit: u32) -> Result<Vec<Booking>, BookingRepositoryError>;

    /// Aggregate counts by status and activity.
    async fn counts(&self) -> Result<BookingCounts, BookingRepositoryError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn refusals_keep_their_message() {
        let err = BookingWriteError::from(TransitionError::BookingNotFound(BookingId::new(3)));
        assert_eq!(err.to_string(), "booking 3 not found");
    }

    #[rstest]
    fn store_errors_keep_their_message() {
        let err = BookingWriteError::from(BookingRepositoryError::connection("refused"));
        assert_eq!(
            err.to_string(),
            "booking repository connection failed: refused"
        );
    }
}
