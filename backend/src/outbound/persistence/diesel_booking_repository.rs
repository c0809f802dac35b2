//! PostgreSQL-backed `BookingRepository` implementation using Diesel ORM.
//!
//! Writes run in one transaction. Creation locks the room row before loading
//! the blocking set, and confirmation locks the booking row and then its room,
//! so two confirmations for the same room serialise and the second observes
//! the first commit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::lifecycle::{self, Outcome, Transition, TransitionError};
use crate::domain::ports::{BookingRepository, BookingRepositoryError, BookingWriteError};
use crate::domain::{
    Booking, BookingCounts, BookingFilter, BookingId, BookingRequest, BookingStatus, RoomId,
    TimeSlot,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{BookingRow, BookingStateChange, NewBookingRow};
use super::pool::{DbPool, PoolError};
use super::schema::{bookings, rooms};

/// Diesel-backed implementation of the `BookingRepository` port.
#[derive(Clone)]
pub struct DieselBookingRepository {
    pool: DbPool,
}

impl DieselBookingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a write transaction. Any variant rolls the transaction
/// back.
#[derive(Debug)]
enum TxError {
    Diesel(diesel::result::Error),
    Refused(TransitionError),
    Row(String),
}

impl From<diesel::result::Error> for TxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

impl From<TransitionError> for TxError {
    fn from(error: TransitionError) -> Self {
        Self::Refused(error)
    }
}

fn pool_error(error: PoolError) -> BookingRepositoryError {
    map_pool_error(error, BookingRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> BookingRepositoryError {
    map_diesel_error(
        error,
        BookingRepositoryError::query,
        BookingRepositoryError::connection,
    )
}

impl From<TxError> for BookingWriteError {
    fn from(error: TxError) -> Self {
        match error {
            TxError::Diesel(err) => Self::Store(diesel_error(err)),
            TxError::Refused(err) => Self::Refused(err),
            TxError::Row(message) => Self::Store(BookingRepositoryError::query(message)),
        }
    }
}

fn to_booking(row: BookingRow) -> Result<Booking, BookingRepositoryError> {
    Booking::try_from(row).map_err(BookingRepositoryError::query)
}

fn to_bookings(rows: Vec<BookingRow>) -> Result<Vec<Booking>, BookingRepositoryError> {
    rows.into_iter().map(to_booking).collect()
}

/// Take the room row lock. Returns `false` when the room does not exist.
async fn lock_room(conn: &mut AsyncPgConnection, room_id: RoomId) -> Result<bool, TxError> {
    let locked: Option<i64> = rooms::table
        .filter(rooms::id.eq(room_id.get()))
        .select(rooms::id)
        .for_update()
        .first(conn)
        .await
        .optional()?;
    Ok(locked.is_some())
}

/// Confirmed, active bookings in `room_id` overlapping `slot`.
async fn load_blocking(
    conn: &mut AsyncPgConnection,
    room_id: RoomId,
    slot: &TimeSlot,
) -> Result<Vec<Booking>, TxError> {
    let rows: Vec<BookingRow> = bookings::table
        .filter(bookings::room_id.eq(room_id.get()))
        .filter(bookings::status.eq(BookingStatus::Confirmed.as_str()))
        .filter(bookings::is_active.eq(true))
        .filter(bookings::starts_at.lt(slot.end()))
        .filter(bookings::ends_at.gt(slot.start()))
        .select(BookingRow::as_select())
        .load(conn)
        .await?;
    rows.into_iter()
        .map(|row| Booking::try_from(row).map_err(TxError::Row))
        .collect()
}

async fn insert_in_tx(
    conn: &mut AsyncPgConnection,
    request: &BookingRequest,
    now: DateTime<Utc>,
) -> Result<Booking, TxError> {
    if !lock_room(conn, request.room_id).await? {
        return Err(TransitionError::RoomNotFound(request.room_id).into());
    }
    let blocking = load_blocking(conn, request.room_id, &request.slot).await?;
    lifecycle::admit(request, &blocking)?;

    let row: BookingRow = diesel::insert_into(bookings::table)
        .values(NewBookingRow {
            room_id: request.room_id.get(),
            starts_at: request.slot.start(),
            ends_at: request.slot.end(),
            requester_name: request.requester_name.as_str(),
            requester_email: request.requester_email.as_str(),
            purpose: request.purpose.as_ref().map(|purpose| purpose.as_str()),
            status: BookingStatus::Pending.as_str(),
            created_at: now,
        })
        .returning(BookingRow::as_returning())
        .get_result(conn)
        .await?;
    Booking::try_from(row).map_err(TxError::Row)
}

async fn mutate_in_tx(
    conn: &mut AsyncPgConnection,
    id: BookingId,
    transition: Transition,
    now: DateTime<Utc>,
) -> Result<Outcome, TxError> {
    let row: Option<BookingRow> = bookings::table
        .filter(bookings::id.eq(id.get()))
        .select(BookingRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?;
    let Some(row) = row else {
        return Err(TransitionError::BookingNotFound(id).into());
    };
    let current = Booking::try_from(row).map_err(TxError::Row)?;

    let blocking = if transition.needs_conflict_check() {
        lock_room(conn, current.room_id()).await?;
        load_blocking(conn, current.room_id(), current.slot()).await?
    } else {
        Vec::new()
    };

    let outcome = lifecycle::apply(&current, transition, &blocking, now)?;
    if let Outcome::Changed(next) = &outcome {
        diesel::update(bookings::table.filter(bookings::id.eq(id.get())))
            .set(BookingStateChange::from(next))
            .execute(conn)
            .await?;
    }
    Ok(outcome)
}

fn tally_grouped(rows: Vec<(String, bool, i64)>) -> Result<BookingCounts, BookingRepositoryError> {
    let mut counts = BookingCounts::default();
    for (status, is_active, count) in rows {
        let count = u64::try_from(count).unwrap_or_default();
        counts.total += count;
        if !is_active {
            counts.deleted += count;
            continue;
        }
        match status
            .parse::<BookingStatus>()
            .map_err(|err| BookingRepositoryError::query(err.to_string()))?
        {
            BookingStatus::Pending => counts.pending += count,
            BookingStatus::Confirmed => counts.confirmed += count,
            BookingStatus::Rejected => counts.rejected += count,
        }
    }
    Ok(counts)
}

#[async_trait]
impl BookingRepository for DieselBookingRepository {
    async fn insert(
        &self,
        request: &BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingWriteError> {
        let mut pooled = self.pool.get().await.map_err(pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;
        let booking = conn
            .transaction(|conn| insert_in_tx(conn, request, now).scope_boxed())
            .await?;
        debug!(booking_id = %booking.id(), "booking row inserted");
        Ok(booking)
    }

    async fn mutate(
        &self,
        id: BookingId,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<Outcome, BookingWriteError> {
        let mut pooled = self.pool.get().await.map_err(pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;
        let outcome = conn
            .transaction(|conn| {
                mutate_in_tx(conn, id, transition, now).scope_boxed()
            })
            .await?;
        Ok(outcome)
    }

    async fn find(&self, id: BookingId) -> Result<Option<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<BookingRow> = bookings::table
            .filter(bookings::id.eq(id.get()))
            .select(BookingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(to_booking).transpose()
    }

    async fn list_active(
        &self,
        filter: &BookingFilter,
    ) -> Result<Vec<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let mut query = bookings::table
            .filter(bookings::is_active.eq(true))
            .select(BookingRow::as_select())
            .into_boxed();
        if let Some(room_id) = filter.room_id {
            query = query.filter(bookings::room_id.eq(room_id.get()));
        }
        if let Some((from, until)) = filter.starts_within {
            query = query
                .filter(bookings::starts_at.ge(from))
                .filter(bookings::starts_at.lt(until));
        }
        let rows: Vec<BookingRow> = query
            .order_by((bookings::starts_at, bookings::id))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        to_bookings(rows)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<BookingRow> = bookings::table
            .select(BookingRow::as_select())
            .order_by((bookings::created_at.desc(), bookings::id.desc()))
            .limit(i64::from(limit))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        to_bookings(rows)
    }

    async fn counts(&self) -> Result<BookingCounts, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<(String, bool, i64)> = bookings::table
            .group_by((bookings::status, bookings::is_active))
            .select((bookings::status, bookings::is_active, count_star()))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        tally_grouped(rows)
    }
}
