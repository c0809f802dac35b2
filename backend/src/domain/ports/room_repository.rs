//! Port for room storage.

use async_trait::async_trait;

use crate::domain::{NewRoom, Room, RoomId};

use super::define_store_error;

define_store_error! {
    /// Errors raised by room repository adapters.
    pub enum RoomRepositoryError => "room repository"
}

/// Port for listing rooms and seeding the default room.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// All rooms ordered by id.
    async fn list(&self) -> Result<Vec<Room>, RoomRepositoryError>;

    /// Look up one room.
    async fn find(&self, id: RoomId) -> Result<Option<Room>, RoomRepositoryError>;

    /// Insert `room` only when no room exists yet.
    ///
    /// Returns the inserted room, or `None` when the table was already
    /// populated.
    async fn seed_if_empty(&self, room: &NewRoom) -> Result<Option<Room>, RoomRepositoryError>;
}
