//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AdminAuthenticator, BookingCommand, BookingQuery, SettingsCommand};

use super::rate_limit::RateLimiter;

/// Parameter object bundling the port implementations used by handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub bookings: Arc<dyn BookingCommand>,
    pub bookings_query: Arc<dyn BookingQuery>,
    pub settings: Arc<dyn SettingsCommand>,
    pub admin: Arc<dyn AdminAuthenticator>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub bookings: Arc<dyn BookingCommand>,
    pub bookings_query: Arc<dyn BookingQuery>,
    pub settings: Arc<dyn SettingsCommand>,
    pub admin: Arc<dyn AdminAuthenticator>,
    pub pin_limiter: RateLimiter,
}

impl HttpState {
    /// Construct state from the ports bundle and the PIN limiter.
    pub fn new(ports: HttpStatePorts, pin_limiter: RateLimiter) -> Self {
        let HttpStatePorts {
            bookings,
            bookings_query,
            settings,
            admin,
        } = ports;
        Self {
            bookings,
            bookings_query,
            settings,
            admin,
            pin_limiter,
        }
    }
}
