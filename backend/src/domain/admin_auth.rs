//! PIN login and signed admin sessions.
//!
//! The entered PIN is compared against the configured one by MAC-ing both and
//! checking the tags in constant time. A successful login yields an
//! `admin-session` token carrying its issue time, so sessions need no server
//! side store.

use std::sync::Arc;
use std::time::Duration;

use hmac::{Hmac, Mac};
use mockable::Clock;
use sha2::Sha256;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::domain::Error;
use crate::domain::ports::AdminAuthenticator;
use crate::domain::token::{TokenCodec, TokenPurpose};

/// Default lifetime of an admin session.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(2 * 60 * 60);

const PIN_MAC_KEY: &[u8] = b"hall-booking/admin-pin";
const SESSION_SUBJECT: i64 = 0;

fn pin_tag(pin: &str) -> Option<Hmac<Sha256>> {
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(PIN_MAC_KEY).ok()?;
    mac.update(pin.as_bytes());
    Some(mac)
}

/// Admin authenticator backed by a configured PIN.
#[derive(Clone)]
pub struct AdminAuthService {
    pin: Arc<Zeroizing<String>>,
    tokens: Arc<TokenCodec>,
    clock: Arc<dyn Clock>,
    session_ttl: Duration,
}

impl AdminAuthService {
    /// An empty `pin` disables admin login entirely.
    pub fn new(pin: Zeroizing<String>, tokens: Arc<TokenCodec>, clock: Arc<dyn Clock>) -> Self {
        if pin.trim().is_empty() {
            warn!("admin PIN is not configured; admin login is disabled");
        }
        Self {
            pin: Arc::new(pin),
            tokens,
            clock,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    fn pin_matches(&self, entered: &str) -> bool {
        let (Some(expected), Some(entered)) = (pin_tag(self.pin.trim()), pin_tag(entered.trim()))
        else {
            return false;
        };
        entered.verify_slice(&expected.finalize().into_bytes()).is_ok()
    }
}

impl AdminAuthenticator for AdminAuthService {
    fn verify_pin(&self, pin: &str) -> Result<String, Error> {
        if self.pin.trim().is_empty() || !self.pin_matches(pin) {
            warn!("admin login refused");
            return Err(Error::unauthorized("invalid PIN"));
        }
        info!("admin session issued");
        Ok(self
            .tokens
            .issue(TokenPurpose::AdminSession, SESSION_SUBJECT, self.clock.utc()))
    }

    fn verify_session(&self, token: &str) -> bool {
        self.tokens
            .verify(
                token,
                TokenPurpose::AdminSession,
                self.session_ttl,
                self.clock.utc(),
            )
            .is_ok_and(|subject| subject == SESSION_SUBJECT)
    }
}
