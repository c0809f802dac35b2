//! PostgreSQL-backed `RoomRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{RoomRepository, RoomRepositoryError};
use crate::domain::{NewRoom, Room, RoomId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewRoomRow, RoomRow};
use super::pool::{DbPool, PoolError};
use super::schema::rooms;

/// Diesel-backed implementation of the `RoomRepository` port.
#[derive(Clone)]
pub struct DieselRoomRepository {
    pool: DbPool,
}

impl DieselRoomRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> RoomRepositoryError {
    map_pool_error(error, RoomRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> RoomRepositoryError {
    map_diesel_error(
        error,
        RoomRepositoryError::query,
        RoomRepositoryError::connection,
    )
}

fn to_room(row: RoomRow) -> Result<Room, RoomRepositoryError> {
    Room::try_from(row).map_err(RoomRepositoryError::query)
}

async fn seed_in_tx(
    conn: &mut AsyncPgConnection,
    room: &NewRoom,
) -> Result<Option<RoomRow>, diesel::result::Error> {
    // Serialises concurrent seeders without blocking readers.
    diesel::sql_query("LOCK TABLE rooms IN SHARE ROW EXCLUSIVE MODE")
        .execute(conn)
        .await?;
    let existing: i64 = rooms::table.select(count_star()).first(conn).await?;
    if existing > 0 {
        return Ok(None);
    }
    let row = diesel::insert_into(rooms::table)
        .values(NewRoomRow {
            name: room.name(),
            description: room.description(),
        })
        .returning(RoomRow::as_returning())
        .get_result(conn)
        .await?;
    Ok(Some(row))
}

#[async_trait]
impl RoomRepository for DieselRoomRepository {
    async fn list(&self) -> Result<Vec<Room>, RoomRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<RoomRow> = rooms::table
            .select(RoomRow::as_select())
            .order_by(rooms::id)
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows.into_iter().map(to_room).collect()
    }

    async fn find(&self, id: RoomId) -> Result<Option<Room>, RoomRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<RoomRow> = rooms::table
            .filter(rooms::id.eq(id.get()))
            .select(RoomRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(to_room).transpose()
    }

    async fn seed_if_empty(&self, room: &NewRoom) -> Result<Option<Room>, RoomRepositoryError> {
        let mut pooled = self.pool.get().await.map_err(pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;
        let row = conn
            .transaction(|conn| seed_in_tx(conn, room).scope_boxed())
            .await
            .map_err(diesel_error)?;
        row.map(to_room).transpose()
    }
}
