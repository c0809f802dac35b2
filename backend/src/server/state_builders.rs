//! Builders for the HTTP state: repositories, notifier and services.

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use hall_booking::config::AppSettings;
use hall_booking::domain::ports::{
    AdminAuthenticator, BookingCommand, BookingNotifier, BookingQuery, BookingRepository,
    RoomRepository, SettingsCommand, SettingsRepository,
};
use hall_booking::domain::{
    AdminAuthService, BookingLifecycleService, EmailAddress, NewRoom, SettingsService, TokenCodec,
};
use hall_booking::inbound::http::rate_limit::RateLimiter;
use hall_booking::inbound::http::state::{HttpState, HttpStatePorts};
use hall_booking::outbound::mail::{HttpMailNotifier, LoggingNotifier, MailTemplates};
use hall_booking::outbound::memory::InMemoryStore;
use hall_booking::outbound::persistence::{
    DieselBookingRepository, DieselRoomRepository, DieselSettingsRepository,
};

use super::ServerConfig;

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {err}"))
}

/// Collaborators shared by the booking and settings services.
struct ServiceDeps {
    notifier: Arc<dyn BookingNotifier>,
    tokens: Arc<TokenCodec>,
    clock: Arc<dyn Clock>,
    admin_email: Option<EmailAddress>,
    link_max_age: Duration,
}

type LifecyclePorts = (
    Arc<dyn BookingCommand>,
    Arc<dyn BookingQuery>,
    Arc<dyn SettingsCommand>,
);

fn lifecycle_ports<B, R, S>(
    bookings: Arc<B>,
    rooms: Arc<R>,
    settings: Arc<S>,
    deps: ServiceDeps,
) -> LifecyclePorts
where
    B: BookingRepository + 'static,
    R: RoomRepository + 'static,
    S: SettingsRepository + 'static,
{
    let settings_service = Arc::new(SettingsService::new(
        Arc::clone(&settings),
        deps.admin_email.clone(),
    ));
    let service = Arc::new(
        BookingLifecycleService::new(
            bookings,
            rooms,
            settings,
            deps.notifier,
            deps.tokens,
            deps.clock,
        )
        .with_admin_email(deps.admin_email)
        .with_link_max_age(deps.link_max_age),
    );
    (
        Arc::clone(&service) as Arc<dyn BookingCommand>,
        service as Arc<dyn BookingQuery>,
        settings_service as Arc<dyn SettingsCommand>,
    )
}

/// Insert the hall as the first room when the room table is empty.
async fn seed_room<R>(rooms: &R, hall_name: &str) -> std::io::Result<()>
where
    R: RoomRepository + ?Sized,
{
    let room = NewRoom::new(hall_name, None).map_err(|err| startup_error("hall name", err))?;
    match rooms.seed_if_empty(&room).await {
        Ok(Some(seeded)) => {
            info!(room_id = seeded.id().get(), name = seeded.name(), "seeded default room");
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(err) => Err(startup_error("room seeding failed", err)),
    }
}

fn build_notifier(settings: &AppSettings) -> std::io::Result<Arc<dyn BookingNotifier>> {
    let templates = MailTemplates::new(settings.public_base_url(), settings.hall_name());
    let mail_api = settings
        .mail_api()
        .map_err(|err| startup_error("mail configuration", err))?;
    match mail_api {
        Some(api) => {
            info!(endpoint = %api.endpoint, "delivering mail through the mail API");
            let notifier = HttpMailNotifier::new(api, templates)
                .map_err(|err| startup_error("mail client", err))?;
            Ok(Arc::new(notifier))
        }
        None => {
            warn!("no mail API configured; notifications are only logged");
            Ok(Arc::new(LoggingNotifier::new(templates)))
        }
    }
}

/// Build the shared HTTP state, choosing Diesel repositories when a pool is
/// configured and the in-memory store otherwise.
pub(super) async fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let settings = &config.settings;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let secret = config.session.token_secret();
    let tokens = Arc::new(TokenCodec::new(&secret).map_err(|err| startup_error("token secret", err))?);
    let deps = ServiceDeps {
        notifier: build_notifier(settings)?,
        tokens: Arc::clone(&tokens),
        clock: Arc::clone(&clock),
        admin_email: settings
            .admin_email()
            .map_err(|err| startup_error("admin email", err))?,
        link_max_age: settings
            .link_max_age()
            .map_err(|err| startup_error("link lifetime", err))?,
    };

    let (bookings, bookings_query, settings_port) = match &config.db_pool {
        Some(pool) => {
            let rooms = Arc::new(DieselRoomRepository::new(pool.clone()));
            seed_room(rooms.as_ref(), settings.hall_name()).await?;
            lifecycle_ports(
                Arc::new(DieselBookingRepository::new(pool.clone())),
                rooms,
                Arc::new(DieselSettingsRepository::new(pool.clone())),
                deps,
            )
        }
        None => {
            warn!("no database configured; bookings are kept in memory");
            let store = Arc::new(InMemoryStore::new());
            seed_room(store.as_ref(), settings.hall_name()).await?;
            lifecycle_ports(Arc::clone(&store), Arc::clone(&store), store, deps)
        }
    };

    if !settings.admin_login_enabled() {
        warn!("BOOKING_ADMIN_PIN is empty; admin login is disabled");
    }
    let session_ttl = settings
        .admin_session_ttl()
        .map_err(|err| startup_error("admin session lifetime", err))?;
    let admin: Arc<dyn AdminAuthenticator> = Arc::new(
        AdminAuthService::new(settings.admin_pin(), tokens, Arc::clone(&clock))
            .with_session_ttl(session_ttl),
    );

    Ok(web::Data::new(HttpState::new(
        HttpStatePorts {
            bookings,
            bookings_query,
            settings: settings_port,
            admin,
        },
        RateLimiter::for_pin_attempts(clock).trusting_forwarded_for(settings.trust_forwarded_for),
    )))
}
