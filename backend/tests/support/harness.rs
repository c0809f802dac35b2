//! Shared wiring for integration suites: the booking service over the
//! in-memory store, a recording notifier and a clock tests can move.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use hall_booking::domain::ports::{BookingNotifier, NotificationError};
use hall_booking::domain::{
    BookingLifecycleService, BookingRequest, EmailAddress, NewRoom, Notification,
    NotificationKind, RequesterName, Room, RoomId, TimeSlot, TokenCodec,
};
use hall_booking::outbound::memory::InMemoryStore;
use mockable::Clock;

pub const TOKEN_SECRET: [u8; 32] = [7; 32];
pub const ADMIN_EMAIL: &str = "admin@example.org";

/// Notifier that keeps every notification for later inspection.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier lock").clone()
    }

    pub fn last_decision_token(&self) -> Option<String> {
        self.sent().into_iter().rev().find_map(|n| match n.kind {
            NotificationKind::RequestCreated { decision_token } => Some(decision_token),
            _ => None,
        })
    }

    pub fn last_cancel_token(&self) -> Option<String> {
        self.sent().into_iter().rev().find_map(|n| match n.kind {
            NotificationKind::Confirmed { cancel_token } => Some(cancel_token),
            _ => None,
        })
    }

    pub fn count(&self, name: &str) -> usize {
        self.sent()
            .iter()
            .filter(|n| n.kind.name() == name)
            .count()
    }
}

#[async_trait]
impl BookingNotifier for RecordingNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .expect("notifier lock")
            .push(notification.clone());
        Ok(())
    }
}

/// Clock frozen at a chosen instant until advanced.
pub struct SteppingClock(Mutex<DateTime<Utc>>);

impl SteppingClock {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self(Mutex::new(start))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().expect("clock lock");
        *now += by;
    }
}

impl Clock for SteppingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().expect("clock lock")
    }
}

pub type MemoryService = BookingLifecycleService<InMemoryStore, InMemoryStore, InMemoryStore>;

/// A seeded store with one room and the service on top of it.
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub service: Arc<MemoryService>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<SteppingClock>,
    pub tokens: Arc<TokenCodec>,
    pub room: Room,
}

pub fn day_at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 5, 4, hour, minute, 0)
        .single()
        .expect("valid test instant")
}

pub async fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let room = store
        .add_room(NewRoom::new("Gemeindesaal", None).expect("valid room"))
        .await;
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = Arc::new(SteppingClock::starting_at(day_at(8, 0)));
    let tokens = Arc::new(TokenCodec::new(&TOKEN_SECRET).expect("strong secret"));
    let service = Arc::new(
        BookingLifecycleService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&notifier) as Arc<dyn BookingNotifier>,
            Arc::clone(&tokens),
            Arc::clone(&clock) as Arc<dyn Clock>,
        )
        .with_admin_email(Some(EmailAddress::new(ADMIN_EMAIL).expect("valid admin"))),
    );
    Harness {
        store,
        service,
        notifier,
        clock,
        tokens,
        room,
    }
}

pub fn request(room: RoomId, name: &str, from: (u32, u32), to: (u32, u32)) -> BookingRequest {
    BookingRequest {
        room_id: room,
        slot: TimeSlot::new(day_at(from.0, from.1), day_at(to.0, to.1)).expect("valid slot"),
        requester_name: RequesterName::new(name).expect("valid name"),
        requester_email: EmailAddress::new(format!(
            "{}@example.org",
            name.to_lowercase().replace(' ', ".")
        ))
        .expect("valid email"),
        purpose: None,
    }
}
