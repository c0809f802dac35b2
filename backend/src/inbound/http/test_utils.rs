//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::HttpResponse;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use mockable::DefaultClock;

use crate::domain::Error;
use crate::domain::ports::{
    MockAdminAuthenticator, MockBookingCommand, MockBookingQuery, MockSettingsCommand,
};

use super::rate_limit::RateLimiter;
use super::session::SessionContext;
use super::state::{HttpState, HttpStatePorts};

/// Token stored by [`store_admin_token`] and accepted by [`accepting_admin`].
pub const TEST_ADMIN_TOKEN: &str = "test-admin-token";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Assembles [`HttpState`] from mocks. Ports left unset panic when called.
#[derive(Default)]
pub struct HttpStateBuilder {
    bookings: Option<MockBookingCommand>,
    bookings_query: Option<MockBookingQuery>,
    settings: Option<MockSettingsCommand>,
    admin: Option<MockAdminAuthenticator>,
    pin_limiter: Option<RateLimiter>,
}

impl HttpStateBuilder {
    pub fn with_bookings(mut self, mock: MockBookingCommand) -> Self {
        self.bookings = Some(mock);
        self
    }

    pub fn with_bookings_query(mut self, mock: MockBookingQuery) -> Self {
        self.bookings_query = Some(mock);
        self
    }

    pub fn with_settings(mut self, mock: MockSettingsCommand) -> Self {
        self.settings = Some(mock);
        self
    }

    pub fn with_admin(mut self, mock: MockAdminAuthenticator) -> Self {
        self.admin = Some(mock);
        self
    }

    pub fn with_pin_limiter(mut self, limiter: RateLimiter) -> Self {
        self.pin_limiter = Some(limiter);
        self
    }

    pub fn build(self) -> HttpState {
        let ports = HttpStatePorts {
            bookings: Arc::new(self.bookings.unwrap_or_default()),
            bookings_query: Arc::new(self.bookings_query.unwrap_or_default()),
            settings: Arc::new(self.settings.unwrap_or_default()),
            admin: Arc::new(self.admin.unwrap_or_default()),
        };
        let limiter = self
            .pin_limiter
            .unwrap_or_else(|| RateLimiter::for_pin_attempts(Arc::new(DefaultClock)));
        HttpState::new(ports, limiter)
    }
}

/// Handler that stores [`TEST_ADMIN_TOKEN`] in the session cookie.
pub async fn store_admin_token(session: SessionContext) -> Result<HttpResponse, Error> {
    session.persist_admin_token(TEST_ADMIN_TOKEN)?;
    Ok(HttpResponse::Ok().finish())
}

/// Authenticator mock that accepts only [`TEST_ADMIN_TOKEN`].
pub fn accepting_admin() -> MockAdminAuthenticator {
    let mut admin = MockAdminAuthenticator::new();
    admin
        .expect_verify_session()
        .returning(|token| token == TEST_ADMIN_TOKEN);
    admin
}

/// The `session` cookie set by a response.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}
