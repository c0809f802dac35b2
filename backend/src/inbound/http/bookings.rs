//! Booking API handlers.
//!
//! ```text
//! GET    /api/bookings?roomId=1&year=2024&month=6
//! POST   /api/bookings {"roomId":1,"start":"2024-06-01T10:00:00Z",...}
//! POST   /api/bookings/{id}/confirm
//! POST   /api/bookings/{id}/reject {"message":"..."}
//! DELETE /api/bookings/{id}
//! ```

use std::collections::HashMap;

use actix_web::{HttpResponse, delete, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{CreateBookingResponse, ListBookingsRequest};
use crate::domain::{
    Booking, BookingId, BookingRequest, EmailAddress, Error, Purpose, RequesterName, RoomId,
    TimeSlot,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::AdminSession;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    EMAIL, END, NAME, ROOM_ID, START, map_booking_validation_error, parse_timestamp, require,
    require_text,
};

/// Query parameters for `GET /api/bookings`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BookingListQuery {
    /// Restrict to one room.
    pub room_id: Option<i64>,
    /// Year of the start date; defaults to the current year when `month` is given.
    pub year: Option<i32>,
    /// Month (1-12) of the start date; defaults to the current month when `year` is given.
    pub month: Option<u32>,
}

/// Active booking as returned by the listing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: i64,
    pub room_id: i64,
    pub room_name: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub purpose: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
}

impl BookingResponse {
    fn new(booking: &Booking, room_name: Option<&str>) -> Self {
        Self {
            id: booking.id().get(),
            room_id: booking.room_id().get(),
            room_name: room_name.map(str::to_owned),
            start: booking.slot().start(),
            end: booking.slot().end(),
            name: booking.requester_name().as_str().to_owned(),
            email: booking.requester_email().as_str().to_owned(),
            purpose: booking.purpose().map(|purpose| purpose.as_str().to_owned()),
            status: booking.status().as_str().to_owned(),
        }
    }
}

/// Request body for `POST /api/bookings`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[schema(example = 1)]
    pub room_id: Option<i64>,
    #[schema(example = "2024-06-01T10:00:00Z")]
    pub start: Option<String>,
    #[schema(example = "2024-06-01T12:00:00Z")]
    pub end: Option<String>,
    #[schema(example = "Ada Lovelace")]
    pub name: Option<String>,
    #[schema(example = "ada@example.org")]
    pub email: Option<String>,
    pub purpose: Option<String>,
}

impl TryFrom<CreateBookingRequest> for BookingRequest {
    type Error = Error;

    fn try_from(value: CreateBookingRequest) -> Result<Self, Self::Error> {
        let room_id = RoomId::new(require(value.room_id, ROOM_ID)?);
        let start = parse_timestamp(&require_text(value.start, START)?, START)?;
        let end = parse_timestamp(&require_text(value.end, END)?, END)?;
        let slot = TimeSlot::new(start, end).map_err(map_booking_validation_error)?;
        let requester_name = RequesterName::new(require_text(value.name, NAME)?)
            .map_err(map_booking_validation_error)?;
        let requester_email = EmailAddress::new(require_text(value.email, EMAIL)?)
            .map_err(map_booking_validation_error)?;
        let purpose =
            Purpose::parse(value.purpose.as_deref()).map_err(map_booking_validation_error)?;
        Ok(Self {
            room_id,
            slot,
            requester_name,
            requester_email,
            purpose,
        })
    }
}

/// Response body for a created booking request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBookingResponse {
    pub booking_id: i64,
    #[schema(example = "pending")]
    pub status: String,
    pub admin_notified: bool,
    pub requester_notified: bool,
    pub message: String,
}

impl From<CreateBookingResponse> for CreatedBookingResponse {
    fn from(value: CreateBookingResponse) -> Self {
        let message = if value.admin_notified {
            "Booking request submitted and the hall team has been notified"
        } else {
            "Booking request submitted"
        };
        Self {
            booking_id: value.booking_id.get(),
            status: value.status.as_str().to_owned(),
            admin_notified: value.admin_notified,
            requester_notified: value.requester_notified,
            message: message.to_owned(),
        }
    }
}

/// Optional body for `POST /api/bookings/{id}/reject`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct RejectBookingRequest {
    /// Passed on to the requester in the rejection email.
    pub message: Option<String>,
}

/// Outcome of an admin transition.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingStatusResponse {
    pub booking_id: i64,
    #[schema(example = "confirmed")]
    pub status: String,
    pub message: String,
}

impl BookingStatusResponse {
    fn new(booking: &Booking, message: &str) -> Self {
        let status = if booking.is_active() {
            booking.status().as_str()
        } else {
            "deleted"
        };
        Self {
            booking_id: booking.id().get(),
            status: status.to_owned(),
            message: message.to_owned(),
        }
    }
}

/// List active bookings.
#[utoipa::path(
    get,
    path = "/api/bookings",
    params(BookingListQuery),
    responses(
        (status = 200, description = "Active bookings ordered by start", body = [BookingResponse]),
        (status = 400, description = "Invalid filter", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "listBookings",
    security([])
)]
#[get("/bookings")]
pub async fn list_bookings(
    state: web::Data<HttpState>,
    query: web::Query<BookingListQuery>,
) -> ApiResult<web::Json<Vec<BookingResponse>>> {
    let query = query.into_inner();
    let request = ListBookingsRequest {
        room_id: query.room_id.map(RoomId::new),
        year: query.year,
        month: query.month,
    };
    let rooms: HashMap<RoomId, String> = state
        .bookings_query
        .list_rooms()
        .await?
        .into_iter()
        .map(|room| (room.id(), room.name().to_owned()))
        .collect();
    let bookings = state.bookings_query.list_active(request).await?;
    Ok(web::Json(
        bookings
            .iter()
            .map(|booking| {
                BookingResponse::new(booking, rooms.get(&booking.room_id()).map(String::as_str))
            })
            .collect(),
    ))
}

/// Submit a booking request.
#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Request stored as pending", body = CreatedBookingResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Unknown room", body = Error),
        (status = 409, description = "Slot overlaps a confirmed booking", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "createBooking",
    security([])
)]
#[post("/bookings")]
pub async fn create_booking(
    state: web::Data<HttpState>,
    payload: web::Json<CreateBookingRequest>,
) -> ApiResult<HttpResponse> {
    let request = BookingRequest::try_from(payload.into_inner())?;
    let created = state.bookings.create(request).await?;
    Ok(HttpResponse::Created().json(CreatedBookingResponse::from(created)))
}

/// Confirm a pending booking.
#[utoipa::path(
    post,
    path = "/api/bookings/{id}/confirm",
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking confirmed", body = BookingStatusResponse),
        (status = 401, description = "Admin session required", body = Error),
        (status = 404, description = "Unknown booking", body = Error),
        (status = 409, description = "Conflict or not pending", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "confirmBooking"
)]
#[post("/bookings/{id}/confirm")]
pub async fn confirm_booking(
    _admin: AdminSession,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<BookingStatusResponse>> {
    let booking = state
        .bookings
        .confirm(BookingId::new(path.into_inner()))
        .await?;
    Ok(web::Json(BookingStatusResponse::new(
        &booking,
        "Booking confirmed",
    )))
}

/// Reject a pending booking.
#[utoipa::path(
    post,
    path = "/api/bookings/{id}/reject",
    params(("id" = i64, Path, description = "Booking id")),
    request_body(content = Option<RejectBookingRequest>, description = "Optional message for the requester"),
    responses(
        (status = 200, description = "Booking rejected", body = BookingStatusResponse),
        (status = 401, description = "Admin session required", body = Error),
        (status = 404, description = "Unknown booking", body = Error),
        (status = 409, description = "Booking is not pending", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "rejectBooking"
)]
#[post("/bookings/{id}/reject")]
pub async fn reject_booking(
    _admin: AdminSession,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: Option<web::Json<RejectBookingRequest>>,
) -> ApiResult<web::Json<BookingStatusResponse>> {
    let reason = payload.and_then(|body| body.into_inner().message);
    let booking = state
        .bookings
        .reject(BookingId::new(path.into_inner()), reason)
        .await?;
    Ok(web::Json(BookingStatusResponse::new(&booking, "Booking rejected")))
}

/// Soft-delete a booking.
#[utoipa::path(
    delete,
    path = "/api/bookings/{id}",
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking deleted (repeat calls are no-ops)", body = BookingStatusResponse),
        (status = 401, description = "Admin session required", body = Error),
        (status = 404, description = "Unknown booking", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "deleteBooking"
)]
#[delete("/bookings/{id}")]
pub async fn delete_booking(
    _admin: AdminSession,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<BookingStatusResponse>> {
    let booking = state
        .bookings
        .delete(BookingId::new(path.into_inner()))
        .await?;
    Ok(web::Json(BookingStatusResponse::new(&booking, "Booking deleted")))
}

#[cfg(test)]
#[path = "bookings_tests.rs"]
mod tests;
