//! Application settings loaded via OrthoConfig.
//!
//! Values layer CLI flags over `BOOKING_*` environment variables over an
//! optional config file. Accessors apply defaults and validate addresses so
//! bootstrap can fail early with a precise message.

use std::net::SocketAddr;
use std::time::Duration;

use mockable::Env;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Deserializer};
use zeroize::Zeroizing;

use crate::domain::{BookingValidationError, EmailAddress};
use crate::outbound::mail::MailApiConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_HALL_NAME: &str = "Community Hall";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_LINK_MAX_AGE_HOURS: u64 = 24;
const DEFAULT_ADMIN_SESSION_HOURS: u64 = 2;
const ADMIN_PIN_ENV: &str = "BOOKING_ADMIN_PIN";
const MAIL_API_TOKEN_ENV: &str = "BOOKING_MAIL_API_TOKEN";

/// Settings that failed validation.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid {field} '{value}': {source}")]
    Email {
        field: &'static str,
        value: String,
        #[source]
        source: BookingValidationError,
    },
    #[error("mail API configuration is incomplete; set {missing}")]
    IncompleteMailApi { missing: &'static str },
    #[error("{field} must be at least one hour")]
    ZeroHours { field: &'static str },
}

/// Environment values that look numeric arrive as numbers; PINs and tokens
/// are kept as text either way. Leading zeros are restored afterwards by
/// [`AppSettings::with_literal_secrets`].
fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Real(f64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Unsigned(n) => n.to_string(),
        Raw::Signed(n) => n.to_string(),
        Raw::Real(n) => n.to_string(),
    }))
}

/// Top-level configuration for the booking server.
#[derive(Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BOOKING")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; the in-memory store is used when unset.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub db_pool_size: Option<u32>,
    /// Admin PIN. Empty or unset disables admin login.
    #[serde(default, deserialize_with = "text_or_number")]
    pub admin_pin: Option<String>,
    /// Primary admin recipient for notifications.
    pub admin_email: Option<String>,
    /// Origin used to build email links.
    pub public_base_url: Option<String>,
    /// Name of the hall, used for the seeded room and mail subjects.
    pub hall_name: Option<String>,
    /// Mail API endpoint. Mail is only logged when unset.
    pub mail_api_url: Option<String>,
    /// Bearer token for the mail API.
    #[serde(default, deserialize_with = "text_or_number")]
    pub mail_api_token: Option<String>,
    /// Sender address for outgoing mail.
    pub mail_sender: Option<String>,
    /// Lifetime of email link tokens, in hours.
    pub link_max_age_hours: Option<u64>,
    /// Lifetime of admin sessions, in hours.
    pub admin_session_hours: Option<u64>,
    /// Key the PIN rate limiter on the proxy-reported client address.
    /// Enable only behind a reverse proxy that overwrites `Forwarded` /
    /// `X-Forwarded-For`.
    #[ortho_config(default = false)]
    pub trust_forwarded_for: bool,
}

impl std::fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppSettings")
            .field("bind_addr", &self.bind_addr)
            .field("database_configured", &self.database_url.is_some())
            .field("db_pool_size", &self.db_pool_size)
            .field("trust_forwarded_for", &self.trust_forwarded_for)
            .field("admin_login_enabled", &self.admin_login_enabled())
            .field("admin_email", &self.admin_email)
            .field("public_base_url", &self.public_base_url)
            .field("hall_name", &self.hall_name)
            .field("mail_api_url", &self.mail_api_url)
            .finish_non_exhaustive()
    }
}

fn optional_email(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<EmailAddress>, SettingsError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => EmailAddress::new(value)
            .map(Some)
            .map_err(|source| SettingsError::Email {
                field,
                value: value.to_owned(),
                source,
            }),
    }
}

fn hours(field: &'static str, value: Option<u64>, default: u64) -> Result<Duration, SettingsError> {
    match value.unwrap_or(default) {
        0 => Err(SettingsError::ZeroHours { field }),
        n => Ok(Duration::from_secs(n.saturating_mul(60 * 60))),
    }
}

/// Swap a value the config layer read as a number back to the literal text
/// of the environment variable it came from. Values supplied by a higher
/// layer (a CLI flag) differ numerically and are left alone.
fn restore_literal(loaded: &mut Option<String>, raw: Option<String>) {
    let (Some(current), Some(literal)) = (loaded.as_deref(), raw) else {
        return;
    };
    if current == literal {
        return;
    }
    let same_number = matches!(
        (current.parse::<f64>(), literal.trim().parse::<f64>()),
        (Ok(a), Ok(b)) if a == b
    );
    if same_number {
        *loaded = Some(literal);
    }
}

impl AppSettings {
    /// Restore `BOOKING_ADMIN_PIN` and `BOOKING_MAIL_API_TOKEN` to their
    /// literal environment text, so `0815` stays `0815`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hall_booking::config::AppSettings;
    /// use mockable::MockEnv;
    ///
    /// let mut env = MockEnv::new();
    /// env.expect_string().returning(|name| match name {
    ///     "BOOKING_ADMIN_PIN" => Some("0815".to_owned()),
    ///     _ => None,
    /// });
    /// let settings = AppSettings {
    ///     admin_pin: Some("815".to_owned()),
    ///     ..AppSettings::default()
    /// }
    /// .with_literal_secrets(&env);
    /// assert_eq!(settings.admin_pin().as_str(), "0815");
    /// ```
    #[must_use]
    pub fn with_literal_secrets<E: Env>(mut self, env: &E) -> Self {
        restore_literal(&mut self.admin_pin, env.string(ADMIN_PIN_ENV));
        restore_literal(&mut self.mail_api_token, env.string(MAIL_API_TOKEN_ENV));
        self
    }

    /// Parsed listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// The configured PIN; empty when login is disabled.
    pub fn admin_pin(&self) -> Zeroizing<String> {
        Zeroizing::new(self.admin_pin.clone().unwrap_or_default())
    }

    pub fn admin_login_enabled(&self) -> bool {
        self.admin_pin.as_deref().is_some_and(|pin| !pin.is_empty())
    }

    pub fn admin_email(&self) -> Result<Option<EmailAddress>, SettingsError> {
        optional_email("admin email", self.admin_email.as_deref())
    }

    /// Link origin without a trailing slash.
    pub fn public_base_url(&self) -> String {
        self.public_base_url
            .as_deref()
            .unwrap_or(DEFAULT_PUBLIC_BASE_URL)
            .trim_end_matches('/')
            .to_owned()
    }

    pub fn hall_name(&self) -> &str {
        self.hall_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_HALL_NAME)
    }

    pub fn link_max_age(&self) -> Result<Duration, SettingsError> {
        hours(
            "link max age",
            self.link_max_age_hours,
            DEFAULT_LINK_MAX_AGE_HOURS,
        )
    }

    pub fn admin_session_ttl(&self) -> Result<Duration, SettingsError> {
        hours(
            "admin session lifetime",
            self.admin_session_hours,
            DEFAULT_ADMIN_SESSION_HOURS,
        )
    }

    /// Mail API settings, or `None` when no endpoint is configured.
    ///
    /// An endpoint without a token or sender is rejected rather than
    /// silently falling back to logging.
    pub fn mail_api(&self) -> Result<Option<MailApiConfig>, SettingsError> {
        let Some(endpoint) = self
            .mail_api_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
        else {
            return Ok(None);
        };
        let token = self
            .mail_api_token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .ok_or(SettingsError::IncompleteMailApi {
                missing: "BOOKING_MAIL_API_TOKEN",
            })?;
        let sender = optional_email("mail sender", self.mail_sender.as_deref())?.ok_or(
            SettingsError::IncompleteMailApi {
                missing: "BOOKING_MAIL_SENDER",
            },
        )?;
        Ok(Some(MailApiConfig {
            endpoint: endpoint.to_owned(),
            token: Zeroizing::new(token),
            sender,
        }))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings loading and validation.

    use std::ffi::OsString;

    use env_lock::lock_env;
    use mockable::DefaultEnv;
    use rstest::rstest;

    use super::*;

    const VARS: [&str; 13] = [
        "BOOKING_BIND_ADDR",
        "BOOKING_DATABASE_URL",
        "BOOKING_ADMIN_PIN",
        "BOOKING_ADMIN_EMAIL",
        "BOOKING_PUBLIC_BASE_URL",
        "BOOKING_HALL_NAME",
        "BOOKING_MAIL_API_URL",
        "BOOKING_MAIL_API_TOKEN",
        "BOOKING_MAIL_SENDER",
        "BOOKING_LINK_MAX_AGE_HOURS",
        "BOOKING_ADMIN_SESSION_HOURS",
        "BOOKING_DB_POOL_SIZE",
        "BOOKING_TRUST_FORWARDED_FOR",
    ];

    fn load_with(overrides: &[(&str, &str)]) -> AppSettings {
        let _guard = lock_env(VARS.map(|name| {
            let value = overrides
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_owned());
            (name, value)
        }));
        AppSettings::load_from_iter([OsString::from("hall-booking")])
            .expect("config should load")
            .with_literal_secrets(&DefaultEnv::new())
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let settings = load_with(&[]);
        assert_eq!(
            settings.bind_addr().expect("default addr").to_string(),
            "0.0.0.0:8080"
        );
        assert!(settings.database_url().is_none());
        assert!(!settings.admin_login_enabled());
        assert_eq!(settings.hall_name(), DEFAULT_HALL_NAME);
        assert_eq!(
            settings.link_max_age().expect("default age"),
            Duration::from_secs(24 * 3600)
        );
        assert!(settings.mail_api().expect("no mail config").is_none());
        assert!(!settings.trust_forwarded_for);
    }

    #[rstest]
    #[case("2468", "2468")]
    #[case("0815", "0815")]
    #[case("0000", "0000")]
    #[case("pin-with-text", "pin-with-text")]
    fn pins_load_whatever_they_look_like(#[case] raw: &str, #[case] expected: &str) {
        let settings = load_with(&[("BOOKING_ADMIN_PIN", raw)]);
        assert!(settings.admin_login_enabled());
        assert_eq!(settings.admin_pin().as_str(), expected);
    }

    #[rstest]
    fn numeric_mail_tokens_stay_text() {
        let settings = load_with(&[
            ("BOOKING_MAIL_API_URL", "https://mail.example.org/send"),
            ("BOOKING_MAIL_API_TOKEN", "12345"),
            ("BOOKING_MAIL_SENDER", "saal@example.org"),
        ]);
        let mail = settings.mail_api().expect("valid").expect("configured");
        assert_eq!(mail.token.as_str(), "12345");
    }

    #[rstest]
    fn zero_padded_mail_tokens_keep_their_zeros() {
        let settings = load_with(&[
            ("BOOKING_MAIL_API_URL", "https://mail.example.org/send"),
            ("BOOKING_MAIL_API_TOKEN", "00123"),
            ("BOOKING_MAIL_SENDER", "saal@example.org"),
        ]);
        let mail = settings.mail_api().expect("valid").expect("configured");
        assert_eq!(mail.token.as_str(), "00123");
    }

    #[rstest]
    #[case(Some("815"), Some("0815"), Some("0815"))]
    #[case(Some("0"), Some("0000"), Some("0000"))]
    #[case(Some("4711"), Some("0815"), Some("4711"))]
    #[case(Some("from-cli"), Some("0815"), Some("from-cli"))]
    #[case(Some("2468"), None, Some("2468"))]
    #[case(None, Some("0815"), None)]
    fn literal_restoration_only_undoes_numeric_parsing(
        #[case] loaded: Option<&str>,
        #[case] raw: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let mut value = loaded.map(str::to_owned);
        restore_literal(&mut value, raw.map(str::to_owned));
        assert_eq!(value.as_deref(), expected);
    }

    #[rstest]
    fn forwarded_addresses_can_be_trusted() {
        let settings = load_with(&[("BOOKING_TRUST_FORWARDED_FOR", "true")]);
        assert!(settings.trust_forwarded_for);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let settings = load_with(&[
            ("BOOKING_BIND_ADDR", "127.0.0.1:9000"),
            ("BOOKING_ADMIN_PIN", "2468"),
            ("BOOKING_ADMIN_EMAIL", "admin@example.org"),
            ("BOOKING_PUBLIC_BASE_URL", "https://hall.example.org/"),
            ("BOOKING_HALL_NAME", "Gemeindesaal"),
            ("BOOKING_LINK_MAX_AGE_HOURS", "48"),
        ]);
        assert_eq!(
            settings.bind_addr().expect("addr").to_string(),
            "127.0.0.1:9000"
        );
        assert!(settings.admin_login_enabled());
        assert_eq!(settings.admin_pin().as_str(), "2468");
        assert_eq!(
            settings
                .admin_email()
                .expect("valid email")
                .map(|e| e.as_str().to_owned()),
            Some("admin@example.org".to_owned())
        );
        assert_eq!(settings.public_base_url(), "https://hall.example.org");
        assert_eq!(settings.hall_name(), "Gemeindesaal");
        assert_eq!(
            settings.link_max_age().expect("age"),
            Duration::from_secs(48 * 3600)
        );
    }

    #[rstest]
    #[case(&[("BOOKING_MAIL_API_URL", "https://mail.example.org/send")], "BOOKING_MAIL_API_TOKEN")]
    #[case(
        &[("BOOKING_MAIL_API_URL", "https://mail.example.org/send"), ("BOOKING_MAIL_API_TOKEN", "t0k")],
        "BOOKING_MAIL_SENDER"
    )]
    fn partial_mail_configuration_is_rejected(
        #[case] overrides: &[(&str, &str)],
        #[case] missing_var: &str,
    ) {
        let settings = load_with(overrides);
        match settings.mail_api() {
            Err(SettingsError::IncompleteMailApi { missing }) => assert_eq!(missing, missing_var),
            other => panic!("expected incomplete mail config, got {other:?}"),
        }
    }

    #[rstest]
    fn complete_mail_configuration_is_built() {
        let settings = load_with(&[
            ("BOOKING_MAIL_API_URL", "https://mail.example.org/send"),
            ("BOOKING_MAIL_API_TOKEN", "t0k"),
            ("BOOKING_MAIL_SENDER", "saal@example.org"),
        ]);
        let mail = settings.mail_api().expect("valid").expect("configured");
        assert_eq!(mail.endpoint, "https://mail.example.org/send");
        assert_eq!(mail.sender.as_str(), "saal@example.org");
    }

    #[rstest]
    #[case(&[("BOOKING_ADMIN_EMAIL", "not-an-address")])]
    #[case(&[("BOOKING_BIND_ADDR", "localhost")])]
    #[case(&[("BOOKING_ADMIN_SESSION_HOURS", "0")])]
    fn invalid_values_surface_as_errors(#[case] overrides: &[(&str, &str)]) {
        let settings = load_with(overrides);
        let failed = settings.admin_email().is_err()
            || settings.bind_addr().is_err()
            || settings.admin_session_ttl().is_err();
        assert!(failed);
    }
}
