//! Signed, time-limited tokens for email links and admin sessions.
//!
//! A token is `base64url(claims) "." base64url(HMAC-SHA256(claims))` where the
//! claims are the JSON object `{"p": purpose, "id": subject, "iat": seconds}`.
//! Verification recomputes the MAC over the encoded claims (constant-time
//! comparison), then checks purpose and age. Every failure collapses into the
//! single [`InvalidToken`] value so callers cannot learn which check failed.

use std::fmt;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Default lifetime of email link tokens.
pub const DEFAULT_LINK_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);
/// Minimum secret length accepted by [`TokenCodec::new`].
pub const MIN_SECRET_LEN: usize = 32;
/// Tolerated forward clock skew for `iat`.
const MAX_FUTURE_SKEW_SECS: i64 = 60;

/// Scope a token was issued for. Tokens never verify under another purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    /// Admin confirm/reject links sent with a new request.
    Decision,
    /// Requester cancel link sent with a confirmation.
    Cancellation,
    /// Admin session established by PIN login.
    AdminSession,
}

impl TokenPurpose {
    const fn tag(self) -> &'static str {
        match self {
            Self::Decision => "booking-decision",
            Self::Cancellation => "booking-cancel",
            Self::AdminSession => "admin-session",
        }
    }
}

/// Uniform verification failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("token is invalid or has expired")]
pub struct InvalidToken;

/// Rejected codec secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("token secret must be at least {min} bytes, got {actual}")]
pub struct WeakSecret {
    pub min: usize,
    pub actual: usize,
}

#[derive(Serialize, Deserialize)]
struct Claims<'a> {
    p: &'a str,
    id: i64,
    iat: i64,
}

/// Issues and verifies tokens under a process-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Key the codec. The caller remains responsible for zeroising `secret`.
    ///
    /// # Examples
    /// ```
    /// use chrono::{Duration, TimeZone, Utc};
    /// use hall_booking::domain::token::{DEFAULT_LINK_MAX_AGE, TokenCodec, TokenPurpose};
    ///
    /// let codec = TokenCodec::new(&[7_u8; 32]).expect("strong secret");
    /// let issued = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
    /// let token = codec.issue(TokenPurpose::Cancellation, 42, issued);
    /// let later = issued + Duration::hours(1);
    /// assert_eq!(
    ///     codec.verify(&token, TokenPurpose::Cancellation, DEFAULT_LINK_MAX_AGE, later),
    ///     Ok(42)
    /// );
    /// assert!(codec.verify(&token, TokenPurpose::Decision, DEFAULT_LINK_MAX_AGE, later).is_err());
    /// ```
    pub fn new(secret: &[u8]) -> Result<Self, WeakSecret> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(WeakSecret {
                min: MIN_SECRET_LEN,
                actual: secret.len(),
            });
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| WeakSecret {
            min: MIN_SECRET_LEN,
            actual: secret.len(),
        })?;
        Ok(Self { mac })
    }

    fn sign(&self, encoded_claims: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(encoded_claims.as_bytes());
        mac
    }

    /// Issue a token binding `subject` to `purpose` at `issued_at`.
    #[must_use]
    pub fn issue(&self, purpose: TokenPurpose, subject: i64, issued_at: DateTime<Utc>) -> String {
        let claims = Claims {
            p: purpose.tag(),
            id: subject,
            iat: issued_at.timestamp(),
        };
        let json = serde_json::to_vec(&claims).unwrap_or_default();
        let encoded = URL_SAFE_NO_PAD.encode(json);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(&encoded).finalize().into_bytes());
        format!("{encoded}.{signature}")
    }

    /// Verify `token` and return its subject.
    ///
    /// Fails when the signature does not match, the purpose differs, the
    /// token is older than `max_age` at `now`, or it claims to be issued in
    /// the future beyond a small clock skew.
    pub fn verify(
        &self,
        token: &str,
        purpose: TokenPurpose,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<i64, InvalidToken> {
        let (encoded, signature) = token.trim().split_once('.').ok_or(InvalidToken)?;
        let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| InvalidToken)?;
        self.sign(encoded)
            .verify_slice(&signature)
            .map_err(|_| InvalidToken)?;

        let json = URL_SAFE_NO_PAD.decode(encoded).map_err(|_| InvalidToken)?;
        let claims: Claims<'_> = serde_json::from_slice(&json).map_err(|_| InvalidToken)?;
        if claims.p != purpose.tag() {
            return Err(InvalidToken);
        }

        let age = now.timestamp().saturating_sub(claims.iat);
        let max_age = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        if age < -MAX_FUTURE_SKEW_SECS || age > max_age {
            return Err(InvalidToken);
        }
        Ok(claims.id)
    }
}
