//! Per-client fixed-window limiter for the PIN endpoint.
//!
//! Windows are keyed by client address: the TCP peer, or the proxy-reported
//! address when the limiter is told to trust forwarding headers. The first
//! request after a window has elapsed opens a new one; requests beyond the
//! quota inside a window are refused with the time left until it expires.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::HttpRequest;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tokio::sync::Mutex;
use tracing::warn;

/// Attempts allowed per window.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

struct Window {
    count: u32,
    opened_at: DateTime<Utc>,
}

/// Refusal returned once a client has used up its quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rate limit exceeded; retry in {}s", .retry_after.as_secs())]
pub struct RateLimited {
    /// Time until the client's window reopens, in whole seconds, at least one.
    pub retry_after: Duration,
}

/// Shared in-process limiter.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<String, Window>>>,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
    window: chrono::Duration,
    trust_forwarded: bool,
}

impl RateLimiter {
    /// Limiter allowing `max_attempts` per `window` and client.
    pub fn new(clock: Arc<dyn Clock>, max_attempts: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            clock,
            max_attempts,
            window: chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX),
            trust_forwarded: false,
        }
    }

    /// Key on `Forwarded` / `X-Forwarded-For` instead of the TCP peer. Only
    /// safe behind a proxy that overwrites those headers.
    #[must_use]
    pub fn trusting_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded = trust;
        self
    }

    /// Address the request is counted against.
    pub fn client_key(&self, req: &HttpRequest) -> String {
        if self.trust_forwarded {
            if let Some(addr) = req.connection_info().realip_remote_addr() {
                return strip_port(addr);
            }
        }
        req.peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_owned())
    }

    /// Limiter with the default PIN quota of five attempts per 15 minutes.
    pub fn for_pin_attempts(clock: Arc<dyn Clock>) -> Self {
        Self::new(clock, DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW)
    }

    /// Count one attempt for `client`, refusing it when over quota.
    pub async fn check(&self, client: &str) -> Result<(), RateLimited> {
        let now = self.clock.utc();
        let mut windows = self.windows.lock().await;
        // Only clients seen within the current window stay in the map.
        windows.retain(|_, window| now - window.opened_at < self.window);

        let window = windows.entry(client.to_owned()).or_insert(Window {
            count: 0,
            opened_at: now,
        });
        window.count = window.count.saturating_add(1);
        if window.count <= self.max_attempts {
            return Ok(());
        }

        let remaining = window
            .opened_at
            .checked_add_signed(self.window)
            .map_or(self.window, |reopens| reopens - now)
            .num_seconds()
            .max(1);
        let retry_after = Duration::from_secs(remaining.unsigned_abs());
        warn!(
            client,
            attempts = window.count,
            retry_after_secs = retry_after.as_secs(),
            "rate limit exceeded"
        );
        Err(RateLimited { retry_after })
    }
}

fn strip_port(addr: &str) -> String {
    addr.parse::<SocketAddr>()
        .map_or_else(|_| addr.to_owned(), |socket| socket.ip().to_string())
}
