//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use hall_booking::config::AppSettings;
use hall_booking::inbound::http::session_config::SessionSettings;
use hall_booking::outbound::persistence::DbPool;

/// Everything `create_server` needs: session cookie settings, validated
/// application settings and an optional database pool.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) settings: AppSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(session: SessionSettings, settings: AppSettings, bind_addr: SocketAddr) -> Self {
        Self {
            session,
            settings,
            bind_addr,
            db_pool: None,
        }
    }

    /// Attach a database connection pool. Without one the in-memory store
    /// backs every port.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}
