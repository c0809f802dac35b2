//! OpenAPI documentation for the booking API.
//!
//! Swagger UI serves this document at `/docs` in debug builds; the
//! `openapi-dump` binary writes it out for tooling.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::admin::{
    AckResponse, LogEntryResponse, SettingsResponse, StatsResponse, UpdateContactEmailRequest,
    VerifyPinRequest, VerifyPinResponse,
};
use crate::inbound::http::bookings::{
    BookingResponse, BookingStatusResponse, CreateBookingRequest, CreatedBookingResponse,
    RejectBookingRequest,
};
use crate::inbound::http::health::{Phase, ProbeBody};
use crate::inbound::http::rooms::RoomResponse;

/// Register the admin session cookie scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Admin session cookie issued by POST /api/admin/verify-pin.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API and email link pages.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Hall booking API",
        description = "Booking requests for community rooms, admin review and signed email links."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::rooms::list_rooms,
        crate::inbound::http::bookings::list_bookings,
        crate::inbound::http::bookings::create_booking,
        crate::inbound::http::bookings::confirm_booking,
        crate::inbound::http::bookings::reject_booking,
        crate::inbound::http::bookings::delete_booking,
        crate::inbound::http::admin::verify_pin,
        crate::inbound::http::admin::logout,
        crate::inbound::http::admin::list_logs,
        crate::inbound::http::admin::get_stats,
        crate::inbound::http::admin::get_settings,
        crate::inbound::http::admin::update_hall_contact_email,
        crate::inbound::http::token_links::confirm_link,
        crate::inbound::http::token_links::reject_link,
        crate::inbound::http::token_links::cancel_link,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        RoomResponse,
        BookingResponse,
        CreateBookingRequest,
        CreatedBookingResponse,
        RejectBookingRequest,
        BookingStatusResponse,
        VerifyPinRequest,
        VerifyPinResponse,
        AckResponse,
        LogEntryResponse,
        StatsResponse,
        SettingsResponse,
        UpdateContactEmailRequest,
        ProbeBody,
        Phase,
    )),
    tags(
        (name = "rooms", description = "Bookable rooms"),
        (name = "bookings", description = "Booking requests and admin decisions"),
        (name = "admin", description = "Admin session, audit log and settings"),
        (name = "links", description = "HTML pages behind signed email links"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
