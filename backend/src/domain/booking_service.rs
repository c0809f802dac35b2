//! Booking lifecycle service implementing the booking driving ports.
//!
//! Store adapters run each transition atomically (see
//! [`BookingRepository`]); this service maps failures onto [`Error`], issues
//! link tokens and dispatches notifications once the write has committed.
//! Delivery failures are logged and surface only through the
//! `*_notified` flags.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::lifecycle::{Transition, TransitionError};
use crate::domain::ports::{
    BookingCommand, BookingLogEntry, BookingNotifier, BookingQuery, BookingRepository,
    BookingWriteError, CreateBookingResponse, DEFAULT_LOG_LIMIT, EmailDecision,
    EmailDecisionOutcome, ListBookingsRequest, MAX_LOG_LIMIT, RoomRepository,
    SettingsRepository,
};
use crate::domain::token::{DEFAULT_LINK_MAX_AGE, TokenCodec, TokenPurpose};
use crate::domain::{
    Booking, BookingCounts, BookingFilter, BookingId, BookingRequest, EmailAddress,
    Error, HALL_CONTACT_EMAIL_KEY, Notification, NotificationKind, Room, RoomId,
};

/// Booking lifecycle service implementing [`BookingCommand`] and
/// [`BookingQuery`].
#[derive(Clone)]
pub struct BookingLifecycleService<B, R, S> {
    bookings: Arc<B>,
    rooms: Arc<R>,
    settings: Arc<S>,
    notifier: Arc<dyn BookingNotifier>,
    tokens: Arc<TokenCodec>,
    clock: Arc<dyn Clock>,
    admin_email: Option<EmailAddress>,
    link_max_age: Duration,
}

impl<B, R, S> BookingLifecycleService<B, R, S> {
    /// Create a service with no configured admin address and the default
    /// link lifetime.
    pub fn new(
        bookings: Arc<B>,
        rooms: Arc<R>,
        settings: Arc<S>,
        notifier: Arc<dyn BookingNotifier>,
        tokens: Arc<TokenCodec>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bookings,
            rooms,
            settings,
            notifier,
            tokens,
            clock,
            admin_email: None,
            link_max_age: DEFAULT_LINK_MAX_AGE,
        }
    }

    /// Primary admin recipient for request and cancellation notices.
    #[must_use]
    pub fn with_admin_email(mut self, admin_email: Option<EmailAddress>) -> Self {
        self.admin_email = admin_email;
        self
    }

    /// Maximum age accepted for decision and cancellation links.
    #[must_use]
    pub fn with_link_max_age(mut self, max_age: Duration) -> Self {
        self.link_max_age = max_age;
        self
    }
}

pub(crate) fn map_transition_error(error: TransitionError) -> Error {
    match error {
        TransitionError::BookingNotFound(id) => Error::not_found(format!("booking {id} not found")),
        TransitionError::RoomNotFound(id) => Error::not_found(format!("room {id} not found")),
        TransitionError::Conflict { with } => {
            Error::conflict("the requested time overlaps a confirmed booking")
                .with_details(json!({ "conflictingBookingId": with }))
        }
        err @ TransitionError::InvalidState { state, .. } => {
            Error::invalid_state(err.to_string()).with_details(json!({ "state": state }))
        }
    }
}

fn map_write_error(error: BookingWriteError) -> Error {
    match error {
        BookingWriteError::Refused(err) => map_transition_error(err),
        BookingWriteError::Store(err) => err.into(),
    }
}

/// Start-of-month window `[first day, first day of next month)` in UTC.
fn month_window(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>), Error> {
    let invalid = || Error::invalid_request(format!("invalid month {year}-{month}"));
    if !(1..=12).contains(&month) {
        return Err(invalid().with_details(json!({ "field": "month" })));
    }
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1).ok_or_else(invalid)?, 1)
    } else {
        (year, month + 1)
    };
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next = NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(invalid)?;
    let midnight = |date: NaiveDate| date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    Ok((
        midnight(first).ok_or_else(invalid)?,
        midnight(next).ok_or_else(invalid)?,
    ))
}

impl<B, R, S> BookingLifecycleService<B, R, S>
where
    B: BookingRepository,
    R: RoomRepository,
    S: SettingsRepository,
{
    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    fn verify_link(&self, token: &str, purpose: TokenPurpose) -> Result<BookingId, Error> {
        self.tokens
            .verify(token, purpose, self.link_max_age, self.now())
            .map(BookingId::new)
            .map_err(|_| Error::invalid_token("the link is invalid or has expired"))
    }

    async fn transition(&self, id: BookingId, transition: Transition) -> Result<Booking, Error> {
        let outcome = self
            .bookings
            .mutate(id, transition, self.now())
            .await
            .map_err(map_write_error)?;
        if outcome.is_changed() {
            info!(
                booking_id = %id,
                action = transition.action(),
                status = %outcome.booking().status(),
                active = outcome.booking().is_active(),
                "booking transition applied"
            );
        }
        Ok(outcome.into_booking())
    }

    async fn room_name(&self, id: RoomId) -> String {
        match self.rooms.find(id).await {
            Ok(Some(room)) => room.name().to_owned(),
            Ok(None) => format!("Room {id}"),
            Err(err) => {
                warn!(room_id = %id, error = %err, "room lookup failed; using fallback name");
                format!("Room {id}")
            }
        }
    }

    async fn hall_contact(&self) -> Option<EmailAddress> {
        let setting = match self.settings.get(HALL_CONTACT_EMAIL_KEY).await {
            Ok(setting) => setting?,
            Err(err) => {
                warn!(
                    error = %err,
                    "hall contact lookup failed; notifying admin address only"
                );
                return None;
            }
        };
        if setting.value.trim().is_empty() {
            return None;
        }
        EmailAddress::new(&setting.value)
            .inspect_err(|_| warn!("stored hall contact address is invalid; ignoring it"))
            .ok()
    }

    async fn admin_recipients(&self) -> Vec<EmailAddress> {
        let mut recipients: Vec<EmailAddress> = self.admin_email.iter().cloned().collect();
        if let Some(contact) = self.hall_contact().await {
            if !recipients
                .iter()
                .any(|existing| existing.as_str().eq_ignore_ascii_case(contact.as_str()))
            {
                recipients.push(contact);
            }
        }
        recipients
    }

    async fn notify(
        &self,
        recipients: Vec<EmailAddress>,
        booking: &Booking,
        kind: NotificationKind,
    ) -> bool {
        let kind_name = kind.name();
        if recipients.is_empty() {
            debug!(booking_id = %booking.id(), kind = kind_name, "no recipients configured");
            return false;
        }
        let notification = Notification {
            recipients,
            room_name: self.room_name(booking.room_id()).await,
            booking: booking.clone(),
            kind,
        };
        match self.notifier.deliver(&notification).await {
            Ok(()) => {
                debug!(booking_id = %booking.id(), kind = kind_name, "notification delivered");
                true
            }
            Err(err) => {
                warn!(
                    booking_id = %booking.id(),
                    kind = kind_name,
                    error = %err,
                    "notification delivery failed"
                );
                false
            }
        }
    }

    async fn notify_requester(&self, booking: &Booking, kind: NotificationKind) -> bool {
        self.notify(vec![booking.requester_email().clone()], booking, kind)
            .await
    }

    async fn notify_admins(&self, booking: &Booking, kind: NotificationKind) -> bool {
        let recipients = self.admin_recipients().await;
        self.notify(recipients, booking, kind).await
    }

    async fn after_confirm(&self, booking: &Booking) {
        let cancel_token = self
            .tokens
            .issue(TokenPurpose::Cancellation, booking.id().get(), self.now());
        self.notify_requester(booking, NotificationKind::Confirmed { cancel_token })
            .await;
    }

    async fn after_reject(&self, booking: &Booking, reason: Option<String>) {
        let reason = reason
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());
        self.notify_requester(booking, NotificationKind::Rejected { reason })
            .await;
    }

    fn filter_for(&self, request: ListBookingsRequest) -> Result<BookingFilter, Error> {
        let today = self.now().date_naive();
        let starts_within = match (request.year, request.month) {
            (None, None) => None,
            (year, month) => Some(month_window(
                year.unwrap_or_else(|| today.year()),
                month.unwrap_or_else(|| today.month()),
            )?),
        };
        Ok(BookingFilter {
            room_id: request.room_id,
            starts_within,
        })
    }
}

#[async_trait]
impl<B, R, S> BookingCommand for BookingLifecycleService<B, R, S>
where
    B: BookingRepository,
    R: RoomRepository,
    S: SettingsRepository,
{
    async fn create(&self, request: BookingRequest) -> Result<CreateBookingResponse, Error> {
        let now = self.now();
        let booking = self
            .bookings
            .insert(&request, now)
            .await
            .map_err(map_write_error)?;
        info!(
            booking_id = %booking.id(),
            room_id = %booking.room_id(),
            "booking request created"
        );

        let decision_token = self
            .tokens
            .issue(TokenPurpose::Decision, booking.id().get(), now);
        let admin_notified = self
            .notify_admins(&booking, NotificationKind::RequestCreated { decision_token })
            .await;
        let requester_notified = self
            .notify_requester(&booking, NotificationKind::RequestReceived)
            .await;

        Ok(CreateBookingResponse {
            booking_id: booking.id(),
            status: booking.status(),
            admin_notified,
            requester_notified,
        })
    }

    async fn confirm(&self, id: BookingId) -> Result<Booking, Error> {
        let booking = self.transition(id, Transition::Confirm).await?;
        self.after_confirm(&booking).await;
        Ok(booking)
    }

    async fn reject(&self, id: BookingId, reason: Option<String>) -> Result<Booking, Error> {
        let booking = self.transition(id, Transition::Reject).await?;
        self.after_reject(&booking, reason).await;
        Ok(booking)
    }

    async fn delete(&self, id: BookingId) -> Result<Booking, Error> {
        self.transition(id, Transition::SoftDelete).await
    }

    async fn cancel_with_token(&self, token: &str) -> Result<Booking, Error> {
        let id = self.verify_link(token, TokenPurpose::Cancellation)?;
        let booking = self.transition(id, Transition::CancelByRequester).await?;
        self.notify_admins(&booking, NotificationKind::CancelledByRequester)
            .await;
        Ok(booking)
    }

    async fn decide_with_token(
        &self,
        token: &str,
        decision: EmailDecision,
    ) -> Result<EmailDecisionOutcome, Error> {
        let id = self.verify_link(token, TokenPurpose::Decision)?;
        let transition = match decision {
            EmailDecision::Confirm => Transition::Confirm,
            EmailDecision::Reject => Transition::Reject,
        };
        match self.bookings.mutate(id, transition, self.now()).await {
            Ok(outcome) => {
                let booking = outcome.into_booking();
                info!(
                    booking_id = %id,
                    action = transition.action(),
                    "booking decided via email link"
                );
                match decision {
                    EmailDecision::Confirm => self.after_confirm(&booking).await,
                    EmailDecision::Reject => self.after_reject(&booking, None).await,
                }
                Ok(EmailDecisionOutcome::Applied(booking))
            }
            Err(BookingWriteError::Refused(TransitionError::InvalidState { .. })) => {
                let booking = self
                    .bookings
                    .find(id)
                    .await
                    .map_err(Error::from)?
                    .ok_or_else(|| Error::not_found(format!("booking {id} not found")))?;
                Ok(EmailDecisionOutcome::AlreadyHandled(booking))
            }
            Err(err) => Err(map_write_error(err)),
        }
    }
}

#[async_trait]
impl<B, R, S> BookingQuery for BookingLifecycleService<B, R, S>
where
    B: BookingRepository,
    R: RoomRepository,
    S: SettingsRepository,
{
    async fn list_active(&self, request: ListBookingsRequest) -> Result<Vec<Booking>, Error> {
        let filter = self.filter_for(request)?;
        self.bookings
            .list_active(&filter)
            .await
            .map_err(Error::from)
    }

    async fn list_log(&self, limit: Option<u32>) -> Result<Vec<BookingLogEntry>, Error> {
        let limit = limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);
        let bookings = self
            .bookings
            .list_recent(limit)
            .await
            .map_err(Error::from)?;
        Ok(bookings.iter().map(BookingLogEntry::from).collect())
    }

    async fn stats(&self) -> Result<BookingCounts, Error> {
        self.bookings
            .counts()
            .await
            .map_err(Error::from)
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, Error> {
        self.rooms.list().await.map_err(Error::from)
    }
}

#[cfg(test)]
#[path = "booking_service_tests.rs"]
mod tests;
