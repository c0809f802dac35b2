//! Unit tests for session configuration parsing.

use std::collections::HashMap;

use mockable::MockEnv;
use rstest::rstest;
use uuid::Uuid;

use super::*;

struct TempKeyFile {
    path: PathBuf,
}

impl TempKeyFile {
    fn new(len: usize) -> Self {
        let path = std::env::temp_dir().join(format!("booking-session-key-{}", Uuid::new_v4()));
        std::fs::write(&path, vec![b'k'; len]).expect("write temp key");
        Self { path }
    }

    fn path_str(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

impl Drop for TempKeyFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn mock_env(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

fn release_vars(key_path: String) -> HashMap<&'static str, String> {
    HashMap::from([
        (KEY_FILE_ENV, key_path),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Lax".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ])
}

fn missing_key_path() -> String {
    std::env::temp_dir()
        .join(format!("absent-{}", Uuid::new_v4()))
        .to_string_lossy()
        .into_owned()
}

#[rstest]
fn release_accepts_complete_configuration() {
    let key = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let env = mock_env(release_vars(key.path_str()));
    let settings = session_settings_from_env(&env, BuildMode::Release).expect("valid settings");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
#[case(COOKIE_SECURE_ENV)]
#[case(SAMESITE_ENV)]
#[case(ALLOW_EPHEMERAL_ENV)]
fn release_requires_every_toggle(#[case] missing: &'static str) {
    let key = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let mut vars = release_vars(key.path_str());
    vars.remove(missing);
    let env = mock_env(vars);
    let Err(err) = session_settings_from_env(&env, BuildMode::Release) else {
        panic!("missing {missing} should fail");
    };
    assert!(matches!(err, SessionConfigError::MissingEnv { name } if name == missing));
}

#[rstest]
#[case(COOKIE_SECURE_ENV, "maybe")]
#[case(SAMESITE_ENV, "sometimes")]
fn release_rejects_garbage(#[case] name: &'static str, #[case] value: &str) {
    let key = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let mut vars = release_vars(key.path_str());
    vars.insert(name, value.to_owned());
    let env = mock_env(vars);
    let Err(err) = session_settings_from_env(&env, BuildMode::Release) else {
        panic!("garbage in {name} should fail");
    };
    assert!(matches!(err, SessionConfigError::InvalidEnv { name: n, .. } if n == name));
}

#[rstest]
fn release_rejects_same_site_none_without_secure() {
    let key = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let mut vars = release_vars(key.path_str());
    vars.insert(COOKIE_SECURE_ENV, "0".to_owned());
    vars.insert(SAMESITE_ENV, "None".to_owned());
    let env = mock_env(vars);
    assert!(matches!(
        session_settings_from_env(&env, BuildMode::Release),
        Err(SessionConfigError::InsecureSameSiteNone)
    ));
}

#[rstest]
fn release_rejects_short_keys() {
    let key = TempKeyFile::new(SESSION_KEY_MIN_LEN - 1);
    let env = mock_env(release_vars(key.path_str()));
    assert!(matches!(
        session_settings_from_env(&env, BuildMode::Release),
        Err(SessionConfigError::KeyTooShort { length, .. }) if length == SESSION_KEY_MIN_LEN - 1
    ));
}

#[rstest]
fn release_refuses_ephemeral_keys() {
    let mut vars = release_vars(missing_key_path());
    vars.insert(ALLOW_EPHEMERAL_ENV, "1".to_owned());
    let env = mock_env(vars);
    assert!(matches!(
        session_settings_from_env(&env, BuildMode::Release),
        Err(SessionConfigError::EphemeralNotAllowed)
    ));
}

#[rstest]
fn release_fails_on_unreadable_key() {
    let env = mock_env(release_vars(missing_key_path()));
    assert!(matches!(
        session_settings_from_env(&env, BuildMode::Release),
        Err(SessionConfigError::KeyRead { .. })
    ));
}

#[rstest]
fn debug_falls_back_to_defaults() {
    let env = mock_env(HashMap::from([(KEY_FILE_ENV, missing_key_path())]));
    let settings = session_settings_from_env(&env, BuildMode::Debug).expect("debug defaults");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
fn token_secret_follows_the_key_file() {
    let first = Key::derive_from(&[b'a'; 64]);
    let same = Key::derive_from(&[b'a'; 64]);
    let rotated = Key::derive_from(&[b'b'; 64]);
    assert_eq!(*derive_token_secret(&first), *derive_token_secret(&same));
    assert_ne!(*derive_token_secret(&first), *derive_token_secret(&rotated));
    assert_eq!(derive_token_secret(&first).len(), 32);
}
