//! In-process store implementing the booking, room and settings ports.
//!
//! Used when no database is configured and by tests. Every operation holds
//! one async mutex for its whole duration, so admission, transitions and
//! their conflict checks are atomic with respect to each other.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::lifecycle::{self, Outcome, Transition, TransitionError};
use crate::domain::ports::{
    BookingRepository, BookingRepositoryError, BookingWriteError, RoomRepository,
    RoomRepositoryError, SettingsRepository, SettingsRepositoryError,
};
use crate::domain::{
    Booking, BookingCounts, BookingFilter, BookingId, BookingRequest, NewRoom, Room, RoomId,
    Setting,
};

#[derive(Debug, Default)]
struct State {
    rooms: BTreeMap<RoomId, Room>,
    bookings: BTreeMap<BookingId, Booking>,
    settings: BTreeMap<String, Setting>,
    last_room_id: i64,
    last_booking_id: i64,
}

impl State {
    fn push_room(&mut self, room: NewRoom) -> Room {
        self.last_room_id += 1;
        let stored = Room::new(RoomId::new(self.last_room_id), room);
        self.rooms.insert(stored.id(), stored.clone());
        stored
    }

    fn blocking_in(&self, room_id: RoomId) -> Vec<Booking> {
        self.bookings
            .values()
            .filter(|booking| booking.room_id() == room_id && booking.is_blocking())
            .cloned()
            .collect()
    }
}

/// Shared in-memory store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a room unconditionally and return it.
    pub async fn add_room(&self, room: NewRoom) -> Room {
        self.state.lock().await.push_room(room)
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn insert(
        &self,
        request: &BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingWriteError> {
        let mut state = self.state.lock().await;
        if !state.rooms.contains_key(&request.room_id) {
            return Err(TransitionError::RoomNotFound(request.room_id).into());
        }
        lifecycle::admit(request, &state.blocking_in(request.room_id))?;

        state.last_booking_id += 1;
        let booking = Booking::pending(BookingId::new(state.last_booking_id), request.clone(), now);
        state.bookings.insert(booking.id(), booking.clone());
        Ok(booking)
    }

    async fn mutate(
        &self,
        id: BookingId,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<Outcome, BookingWriteError> {
        let mut state = self.state.lock().await;
        let current = state
            .bookings
            .get(&id)
            .cloned()
            .ok_or(TransitionError::BookingNotFound(id))?;
        let blocking = if transition.needs_conflict_check() {
            state.blocking_in(current.room_id())
        } else {
            Vec::new()
        };

        let outcome = lifecycle::apply(&current, transition, &blocking, now)?;
        if let Outcome::Changed(next) = &outcome {
            state.bookings.insert(id, next.clone());
        }
        Ok(outcome)
    }

    async fn find(&self, id: BookingId) -> Result<Option<Booking>, BookingRepositoryError> {
        Ok(self.state.lock().await.bookings.get(&id).cloned())
    }

    async fn list_active(
        &self,
        filter: &BookingFilter,
    ) -> Result<Vec<Booking>, BookingRepositoryError> {
        let state = self.state.lock().await;
        let mut found: Vec<Booking> = state
            .bookings
            .values()
            .filter(|booking| filter.admits(booking))
            .cloned()
            .collect();
        found.sort_by_key(|booking| (booking.slot().start(), booking.id()));
        Ok(found)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Booking>, BookingRepositoryError> {
        let state = self.state.lock().await;
        let mut recent: Vec<Booking> = state.bookings.values().cloned().collect();
        recent.sort_by_key(|booking| std::cmp::Reverse((booking.created_at(), booking.id())));
        recent.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(recent)
    }

    async fn counts(&self) -> Result<BookingCounts, BookingRepositoryError> {
        Ok(BookingCounts::tally(self.state.lock().await.bookings.values()))
    }
}

#[async_trait]
impl RoomRepository for InMemoryStore {
    async fn list(&self) -> Result<Vec<Room>, RoomRepositoryError> {
        Ok(self.state.lock().await.rooms.values().cloned().collect())
    }

    async fn find(&self, id: RoomId) -> Result<Option<Room>, RoomRepositoryError> {
        Ok(self.state.lock().await.rooms.get(&id).cloned())
    }

    async fn seed_if_empty(&self, room: &NewRoom) -> Result<Option<Room>, RoomRepositoryError> {
        let mut state = self.state.lock().await;
        if !state.rooms.is_empty() {
            return Ok(None);
        }
        Ok(Some(state.push_room(room.clone())))
    }
}

#[async_trait]
impl SettingsRepository for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Setting>, SettingsRepositoryError> {
        Ok(self.state.lock().await.settings.get(key).cloned())
    }

    async fn upsert(&self, setting: &Setting) -> Result<(), SettingsRepositoryError> {
        self.state
            .lock()
            .await
            .settings
            .insert(setting.key.clone(), setting.clone());
        Ok(())
    }
}
