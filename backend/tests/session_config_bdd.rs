//! Behaviour tests for the admin session and link-secret configuration.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;

use actix_web::cookie::SameSite;
use hall_booking::inbound::http::session_config::{
    BuildMode, SessionConfigError, SessionSettings, derive_token_secret,
    session_settings_from_env,
};
use mockable::MockEnv;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use uuid::Uuid;

const KEY_FILE_ENV: &str = "BOOKING_SESSION_KEY_FILE";

/// Key material written to a scratch file and removed on drop.
struct ScratchKey(PathBuf);

impl ScratchKey {
    fn with_len(len: usize) -> Self {
        let path = std::env::temp_dir().join(format!("hall-booking-key-{}", Uuid::new_v4()));
        let bytes: Vec<u8> = (0..len).map(|i| b'a' + (i % 26) as u8).collect();
        std::fs::write(&path, bytes).expect("write scratch key");
        Self(path)
    }

    fn path(&self) -> String {
        self.0.to_str().expect("utf-8 temp path").to_owned()
    }
}

impl Drop for ScratchKey {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

struct SessionWorld {
    mode: Cell<BuildMode>,
    vars: RefCell<HashMap<String, String>>,
    key: RefCell<Option<ScratchKey>>,
    loaded: RefCell<Option<Result<SessionSettings, SessionConfigError>>>,
}

impl SessionWorld {
    fn env(&self) -> MockEnv {
        let vars = self.vars.borrow().clone();
        let mut env = MockEnv::new();
        env.expect_string()
            .times(0..)
            .returning(move |name| vars.get(name).cloned());
        env
    }

    fn load(&self) -> Result<SessionSettings, SessionConfigError> {
        session_settings_from_env(&self.env(), self.mode.get())
    }

    fn settings<T>(&self, f: impl FnOnce(&SessionSettings) -> T) -> T {
        let loaded = self.loaded.borrow();
        match loaded.as_ref().expect("configuration loaded") {
            Ok(settings) => f(settings),
            Err(err) => panic!("expected settings, got {err}"),
        }
    }

    fn failure<T>(&self, f: impl FnOnce(&SessionConfigError) -> T) -> T {
        let loaded = self.loaded.borrow();
        match loaded.as_ref().expect("configuration loaded") {
            Ok(_) => panic!("expected the configuration to be refused"),
            Err(err) => f(err),
        }
    }
}

#[fixture]
fn world() -> SessionWorld {
    SessionWorld {
        mode: Cell::new(BuildMode::Release),
        vars: RefCell::new(HashMap::new()),
        key: RefCell::new(None),
        loaded: RefCell::new(None),
    }
}

#[given("a release build")]
fn a_release_build(world: &SessionWorld) {
    world.mode.set(BuildMode::Release);
}

#[given("a debug build")]
fn a_debug_build(world: &SessionWorld) {
    world.mode.set(BuildMode::Debug);
}

#[given("the environment sets {name} to {value}")]
fn the_environment_sets(world: &SessionWorld, name: String, value: String) {
    world.vars.borrow_mut().insert(name, value);
}

#[given("a session key file with {len} bytes")]
fn a_session_key_file(world: &SessionWorld, len: usize) {
    let key = ScratchKey::with_len(len);
    world.vars.borrow_mut().insert(KEY_FILE_ENV.to_owned(), key.path());
    *world.key.borrow_mut() = Some(key);
}

#[given("the session key file is missing")]
fn the_session_key_file_is_missing(world: &SessionWorld) {
    let missing = std::env::temp_dir().join(format!("hall-booking-absent-{}", Uuid::new_v4()));
    world.vars.borrow_mut().insert(
        KEY_FILE_ENV.to_owned(),
        missing.to_string_lossy().into_owned(),
    );
}

#[when("the session configuration is loaded")]
fn the_session_configuration_is_loaded(world: &SessionWorld) {
    let loaded = world.load();
    *world.loaded.borrow_mut() = Some(loaded);
}

#[then("cookies are marked secure")]
fn cookies_are_marked_secure(world: &SessionWorld) {
    assert!(world.settings(|s| s.cookie_secure));
}

#[then("the SameSite policy is {policy}")]
fn the_same_site_policy_is(world: &SessionWorld, policy: String) {
    let expected = match policy.as_str() {
        "Strict" => SameSite::Strict,
        "Lax" => SameSite::Lax,
        "None" => SameSite::None,
        other => panic!("unknown SameSite policy {other}"),
    };
    assert_eq!(world.settings(|s| s.same_site), expected);
}

#[then("loading fails with a missing {name}")]
fn loading_fails_with_missing(world: &SessionWorld, name: String) {
    world.failure(|err| match err {
        SessionConfigError::MissingEnv { name: missing } => assert_eq!(*missing, name),
        other => panic!("expected a missing variable, got {other}"),
    });
}

#[then("loading fails with ephemeral keys refused")]
fn loading_fails_with_ephemeral_refused(world: &SessionWorld) {
    world.failure(|err| assert!(matches!(err, SessionConfigError::EphemeralNotAllowed)));
}

#[then("loading fails with SameSite None refused")]
fn loading_fails_with_same_site_none_refused(world: &SessionWorld) {
    world.failure(|err| assert!(matches!(err, SessionConfigError::InsecureSameSiteNone)));
}

#[then("loading fails with a short key")]
fn loading_fails_with_a_short_key(world: &SessionWorld) {
    world.failure(|err| {
        assert!(matches!(
            err,
            SessionConfigError::KeyTooShort { length: 16, min_len: 64, .. }
        ));
    });
}

#[then("loading fails with an unreadable key")]
fn loading_fails_with_an_unreadable_key(world: &SessionWorld) {
    world.failure(|err| assert!(matches!(err, SessionConfigError::KeyRead { .. })));
}

#[then("the link token secret is derived from the key")]
fn the_link_token_secret_is_derived(world: &SessionWorld) {
    world.settings(|settings| {
        let secret = settings.token_secret();
        assert_eq!(secret.len(), 32);
        assert_eq!(*secret, *derive_token_secret(&settings.key));
        assert_ne!(secret.as_slice(), settings.key.master());
    });
}

#[then("loading the same key file again yields the same link secret")]
fn reloading_yields_the_same_link_secret(world: &SessionWorld) {
    let first = world.settings(SessionSettings::token_secret);
    let again = world.load().expect("reload succeeds").token_secret();
    assert_eq!(*first, *again);
}

#[scenario(
    path = "tests/features/session_config.feature",
    name = "Release build with explicit secure settings"
)]
fn release_build_with_secure_settings(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_config.feature",
    name = "Release build without the secure toggle"
)]
fn release_build_without_secure_toggle(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_config.feature",
    name = "Release build refuses ephemeral keys"
)]
fn release_build_refuses_ephemeral_keys(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_config.feature",
    name = "SameSite None needs secure cookies"
)]
fn same_site_none_needs_secure_cookies(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_config.feature",
    name = "Short keys are refused in release"
)]
fn short_keys_are_refused(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_config.feature",
    name = "Release build needs a readable key file"
)]
fn release_build_needs_a_readable_key(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_config.feature",
    name = "Debug build falls back to defaults"
)]
fn debug_build_falls_back_to_defaults(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_config.feature",
    name = "Link secrets follow the session key"
)]
fn link_secrets_follow_the_session_key(world: SessionWorld) {
    drop(world);
}
