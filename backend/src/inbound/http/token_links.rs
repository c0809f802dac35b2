//! Pages served for the signed links in notification emails.
//!
//! The audience is an email recipient rather than an API client, so every
//! outcome, failures included, renders as an HTML page with status 200.

use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, get, web};
use tracing::debug;

use crate::domain::ports::{EmailDecision, EmailDecisionOutcome};
use crate::domain::{Booking, BookingStatus, Error, ErrorCode};
use crate::inbound::http::state::HttpState;
use crate::outbound::mail::escape_html;

/// Visual tone of a result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Success,
    Warning,
    Error,
}

impl PageKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    fn colour(self) -> &'static str {
        match self {
            Self::Success => "#2e7d32",
            Self::Warning => "#ed6c02",
            Self::Error => "#c62828",
        }
    }
}

/// Title and message shown after following a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPage {
    pub kind: PageKind,
    pub title: String,
    pub message: String,
}

impl ResultPage {
    fn new(kind: PageKind, title: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.to_owned(),
            message: message.into(),
        }
    }

    /// Self-contained HTML document.
    pub fn render(&self) -> String {
        let title = escape_html(&self.title);
        format!(
            "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
             <title>{title}</title></head>\
             <body style=\"font-family:sans-serif;max-width:560px;margin:48px auto\">\
             <div class=\"result result-{kind}\" style=\"border-left:6px solid {colour};padding:16px 24px\">\
             <h1>{title}</h1><p>{message}</p></div></body></html>",
            kind = self.kind.as_str(),
            colour = self.kind.colour(),
            message = escape_html(&self.message),
        )
    }

    fn into_response(self) -> HttpResponse {
        HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(self.render())
    }
}

fn failure_page(err: &Error) -> ResultPage {
    debug!(code = ?err.code(), message = err.message(), "link could not be applied");
    match err.code() {
        ErrorCode::InvalidToken => ResultPage::new(
            PageKind::Error,
            "Link expired",
            "This link is no longer valid or has expired.",
        ),
        ErrorCode::NotFound => ResultPage::new(
            PageKind::Error,
            "Booking not found",
            "This booking no longer exists.",
        ),
        ErrorCode::Conflict => ResultPage::new(
            PageKind::Error,
            "Conflict",
            "This booking cannot be confirmed because it overlaps another confirmed booking.",
        ),
        ErrorCode::InvalidState => ResultPage::new(
            PageKind::Warning,
            "Cancellation not possible",
            "Only confirmed bookings can be cancelled.",
        ),
        _ => ResultPage::new(
            PageKind::Error,
            "Something went wrong",
            "The request could not be processed. Please try again later.",
        ),
    }
}

fn already_handled_page(booking: &Booking) -> ResultPage {
    let message = if !booking.is_active() {
        "This booking has already been withdrawn.".to_owned()
    } else {
        match booking.status() {
            BookingStatus::Confirmed => "This booking has already been confirmed.".to_owned(),
            BookingStatus::Rejected => "This booking has already been declined.".to_owned(),
            BookingStatus::Pending => "This booking is still awaiting a decision.".to_owned(),
        }
    };
    ResultPage::new(PageKind::Warning, "Already handled", message)
}

pub(crate) fn decision_page(
    decision: EmailDecision,
    outcome: Result<EmailDecisionOutcome, Error>,
) -> ResultPage {
    match outcome {
        Ok(EmailDecisionOutcome::Applied(booking)) => {
            let name = booking.requester_name().as_str();
            match decision {
                EmailDecision::Confirm => ResultPage::new(
                    PageKind::Success,
                    "Booking confirmed",
                    format!("The booking from {name} has been confirmed."),
                ),
                EmailDecision::Reject => ResultPage::new(
                    PageKind::Success,
                    "Booking declined",
                    format!("The booking from {name} has been declined."),
                ),
            }
        }
        Ok(EmailDecisionOutcome::AlreadyHandled(booking)) => already_handled_page(&booking),
        Err(err) => failure_page(&err),
    }
}

pub(crate) fn cancel_page(outcome: Result<Booking, Error>) -> ResultPage {
    match outcome {
        Ok(_) => ResultPage::new(
            PageKind::Success,
            "Booking cancelled",
            "Your booking has been cancelled. The hall team has been informed.",
        ),
        Err(err) if is_already_deleted(&err) => ResultPage::new(
            PageKind::Warning,
            "Booking already cancelled",
            "This booking has already been cancelled.",
        ),
        Err(err) => failure_page(&err),
    }
}

fn is_already_deleted(err: &Error) -> bool {
    err.code() == ErrorCode::InvalidState
        && err
            .details()
            .and_then(|details| details.get("state"))
            .and_then(|state| state.as_str())
            == Some("deleted")
}

/// Admin confirmation link.
#[utoipa::path(
    get,
    path = "/booking/confirm/{token}",
    params(("token" = String, Path, description = "Signed decision token")),
    responses((status = 200, description = "HTML result page", content_type = "text/html")),
    tags = ["links"],
    security([])
)]
#[get("/booking/confirm/{token}")]
pub async fn confirm_link(state: web::Data<HttpState>, token: web::Path<String>) -> HttpResponse {
    let outcome = state
        .bookings
        .decide_with_token(&token, EmailDecision::Confirm)
        .await;
    decision_page(EmailDecision::Confirm, outcome).into_response()
}

/// Admin rejection link.
#[utoipa::path(
    get,
    path = "/booking/reject/{token}",
    params(("token" = String, Path, description = "Signed decision token")),
    responses((status = 200, description = "HTML result page", content_type = "text/html")),
    tags = ["links"],
    security([])
)]
#[get("/booking/reject/{token}")]
pub async fn reject_link(state: web::Data<HttpState>, token: web::Path<String>) -> HttpResponse {
    let outcome = state
        .bookings
        .decide_with_token(&token, EmailDecision::Reject)
        .await;
    decision_page(EmailDecision::Reject, outcome).into_response()
}

/// Requester cancellation link.
#[utoipa::path(
    get,
    path = "/booking/cancel/{token}",
    params(("token" = String, Path, description = "Signed cancellation token")),
    responses((status = 200, description = "HTML result page", content_type = "text/html")),
    tags = ["links"],
    security([])
)]
#[get("/booking/cancel/{token}")]
pub async fn cancel_link(state: web::Data<HttpState>, token: web::Path<String>) -> HttpResponse {
    let outcome = state.bookings.cancel_with_token(&token).await;
    cancel_page(outcome).into_response()
}
