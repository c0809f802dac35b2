//! Driving port for PIN-based admin authentication.

use crate::domain::Error;

/// Issues and checks admin session tokens.
///
/// Synchronous: both operations are pure computations over configured
/// secrets.
#[cfg_attr(test, mockall::automock)]
pub trait AdminAuthenticator: Send + Sync {
    /// Check `pin` and return a fresh session token.
    fn verify_pin(&self, pin: &str) -> Result<String, Error>;

    /// Whether `token` is a valid, unexpired admin session.
    fn verify_session(&self, token: &str) -> bool;
}
