//! Session key fingerprint for startup logs.
//!
//! Both the cookie sessions and the email link tokens hang off the same key,
//! so operators compare this value after a rotation to know which generation
//! of links is still valid.

use actix_web::cookie::Key;
use sha2::{Digest, Sha256};

const FINGERPRINT_BYTES: usize = 8;

/// First eight bytes of the SHA-256 of the signing half, hex encoded.
///
/// ```rust
/// use actix_web::cookie::Key;
/// use hall_booking::inbound::http::session_config::fingerprint::key_fingerprint;
///
/// let fp = key_fingerprint(&Key::generate());
/// assert_eq!(fp.len(), 16);
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}
