//! Port for the key/value settings table.

use async_trait::async_trait;

use crate::domain::Setting;

use super::define_store_error;

define_store_error! {
    /// Errors raised by settings repository adapters.
    pub enum SettingsRepositoryError => "settings repository"
}

/// Port for reading and upserting settings. Rows are never deleted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Read a setting by key.
    async fn get(&self, key: &str) -> Result<Option<Setting>, SettingsRepositoryError>;

    /// Create the row on first write, otherwise update value and description.
    async fn upsert(&self, setting: &Setting) -> Result<(), SettingsRepositoryError>;
}
