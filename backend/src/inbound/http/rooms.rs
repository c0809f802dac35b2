//! Room listing.

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, Room};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Bookable room.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub id: i64,
    #[schema(example = "Community Hall")]
    pub name: String,
    pub description: Option<String>,
}

impl From<&Room> for RoomResponse {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id().get(),
            name: room.name().to_owned(),
            description: room.description().map(str::to_owned),
        }
    }
}

/// List all rooms.
#[utoipa::path(
    get,
    path = "/api/rooms",
    responses(
        (status = 200, description = "Rooms", body = [RoomResponse]),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["rooms"],
    operation_id = "listRooms",
    security([])
)]
#[get("/rooms")]
pub async fn list_rooms(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<RoomResponse>>> {
    let rooms = state.bookings_query.list_rooms().await?;
    Ok(web::Json(rooms.iter().map(RoomResponse::from).collect()))
}
