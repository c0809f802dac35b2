//! Admin API handlers.
//!
//! ```text
//! POST /api/admin/verify-pin {"pin":"2468"}
//! POST /api/admin/logout
//! GET  /api/admin/logs?limit=50
//! GET  /api/admin/stats
//! GET  /api/admin/settings
//! POST /api/admin/settings/hall-contact-email {"email":"hall@example.org"}
//! ```

use actix_web::{HttpRequest, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use zeroize::Zeroizing;

use crate::domain::ports::{BookingLogEntry, NotificationSettings};
use crate::domain::{BookingCounts, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::{AdminSession, SessionContext};
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/admin/verify-pin`.
#[derive(Deserialize, Serialize, ToSchema)]
pub struct VerifyPinRequest {
    #[schema(example = "2468")]
    pub pin: Option<String>,
}

/// Successful PIN check.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPinResponse {
    pub valid: bool,
    pub session_created: bool,
    pub message: String,
}

/// Generic acknowledgement.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}

/// Query parameters for `GET /api/admin/logs`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogQuery {
    /// Number of entries (default 50, clamped to 1..=500).
    pub limit: Option<u32>,
}

/// One booking viewed as an audit entry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogEntryResponse {
    pub booking_id: i64,
    pub room_id: i64,
    #[schema(example = "deleted")]
    pub status: String,
    pub status_label: String,
    pub message: String,
    pub details: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<BookingLogEntry> for LogEntryResponse {
    fn from(entry: BookingLogEntry) -> Self {
        Self {
            booking_id: entry.booking_id.get(),
            room_id: entry.room_id.get(),
            status: entry.status.to_owned(),
            status_label: entry.status_label.to_owned(),
            message: entry.message,
            details: entry.details,
            email: entry.requester_email,
            is_active: entry.is_active,
            created_at: entry.created_at,
            deleted_at: entry.deleted_at,
        }
    }
}

/// Booking counts for the dashboard.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    /// Every stored booking, deleted ones included.
    pub total: u64,
    pub pending: u64,
    pub confirmed: u64,
    pub rejected: u64,
    /// Soft-deleted bookings.
    pub deleted: u64,
}

impl From<BookingCounts> for StatsResponse {
    fn from(counts: BookingCounts) -> Self {
        Self {
            total: counts.total,
            pending: counts.pending,
            confirmed: counts.confirmed,
            rejected: counts.rejected,
            deleted: counts.deleted,
        }
    }
}

/// Notification recipients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub admin_email: Option<String>,
    pub hall_contact_email: Option<String>,
}

impl From<NotificationSettings> for SettingsResponse {
    fn from(settings: NotificationSettings) -> Self {
        Self {
            admin_email: settings.admin_email,
            hall_contact_email: settings.hall_contact_email,
        }
    }
}

/// Request body for updating the hall contact address. Blank clears it.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateContactEmailRequest {
    #[schema(example = "hall@example.org")]
    pub email: Option<String>,
}

/// Check the admin PIN and open a session.
#[utoipa::path(
    post,
    path = "/api/admin/verify-pin",
    request_body = VerifyPinRequest,
    responses(
        (status = 200, description = "PIN accepted", body = VerifyPinResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 401, description = "Wrong PIN", body = Error),
        (status = 429, description = "Too many attempts", body = Error)
    ),
    tags = ["admin"],
    operation_id = "verifyPin",
    security([])
)]
#[post("/admin/verify-pin")]
pub async fn verify_pin(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<VerifyPinRequest>,
) -> ApiResult<web::Json<VerifyPinResponse>> {
    let client = state.pin_limiter.client_key(&req);
    if let Err(limited) = state.pin_limiter.check(&client).await {
        return Err(
            Error::too_many_requests("too many PIN attempts; try again later")
                .with_details(json!({ "retryAfterSecs": limited.retry_after.as_secs() })),
        );
    }
    let pin = Zeroizing::new(payload.into_inner().pin.unwrap_or_default());
    match state.admin.verify_pin(&pin) {
        Ok(token) => {
            session.persist_admin_token(&token)?;
            info!(client = %client, "admin logged in");
            Ok(web::Json(VerifyPinResponse {
                valid: true,
                session_created: true,
                message: "PIN accepted".to_owned(),
            }))
        }
        Err(err) => {
            session.purge();
            Err(err)
        }
    }
}

/// End the admin session.
#[utoipa::path(
    post,
    path = "/api/admin/logout",
    responses((status = 200, description = "Session cleared", body = AckResponse)),
    tags = ["admin"],
    operation_id = "logout",
    security([])
)]
#[post("/admin/logout")]
pub async fn logout(session: SessionContext) -> web::Json<AckResponse> {
    session.purge();
    web::Json(AckResponse {
        success: true,
        message: "Logged out".to_owned(),
    })
}

/// Most recent bookings, including deleted ones.
#[utoipa::path(
    get,
    path = "/api/admin/logs",
    params(LogQuery),
    responses(
        (status = 200, description = "Newest first", body = [LogEntryResponse]),
        (status = 401, description = "Admin session required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "listLogs"
)]
#[get("/admin/logs")]
pub async fn list_logs(
    _admin: AdminSession,
    state: web::Data<HttpState>,
    query: web::Query<LogQuery>,
) -> ApiResult<web::Json<Vec<LogEntryResponse>>> {
    let entries = state.bookings_query.list_log(query.limit).await?;
    Ok(web::Json(
        entries.into_iter().map(LogEntryResponse::from).collect(),
    ))
}

/// Booking counts.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Counts", body = StatsResponse),
        (status = 401, description = "Admin session required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "getStats"
)]
#[get("/admin/stats")]
pub async fn get_stats(
    _admin: AdminSession,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<StatsResponse>> {
    let counts = state.bookings_query.stats().await?;
    Ok(web::Json(counts.into()))
}

/// Current notification settings.
#[utoipa::path(
    get,
    path = "/api/admin/settings",
    responses(
        (status = 200, description = "Settings", body = SettingsResponse),
        (status = 401, description = "Admin session required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "getSettings"
)]
#[get("/admin/settings")]
pub async fn get_settings(
    _admin: AdminSession,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<SettingsResponse>> {
    let settings = state.settings.notification_settings().await?;
    Ok(web::Json(settings.into()))
}

/// Set or clear the hall contact address.
#[utoipa::path(
    post,
    path = "/api/admin/settings/hall-contact-email",
    request_body = UpdateContactEmailRequest,
    responses(
        (status = 200, description = "Updated settings", body = SettingsResponse),
        (status = 400, description = "Invalid address", body = Error),
        (status = 401, description = "Admin session required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "updateHallContactEmail"
)]
#[post("/admin/settings/hall-contact-email")]
pub async fn update_hall_contact_email(
    _admin: AdminSession,
    state: web::Data<HttpState>,
    payload: web::Json<UpdateContactEmailRequest>,
) -> ApiResult<web::Json<SettingsResponse>> {
    let raw = payload.into_inner().email.unwrap_or_default();
    let settings = state.settings.update_hall_contact_email(&raw).await?;
    Ok(web::Json(settings.into()))
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
