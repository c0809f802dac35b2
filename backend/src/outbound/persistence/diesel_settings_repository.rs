//! PostgreSQL-backed `SettingsRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::Setting;
use crate::domain::ports::{SettingsRepository, SettingsRepositoryError};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{SettingRow, SettingUpsert};
use super::pool::{DbPool, PoolError};
use super::schema::settings;

/// Diesel-backed implementation of the `SettingsRepository` port.
#[derive(Clone)]
pub struct DieselSettingsRepository {
    pool: DbPool,
}

impl DieselSettingsRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> SettingsRepositoryError {
    map_pool_error(error, SettingsRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> SettingsRepositoryError {
    map_diesel_error(
        error,
        SettingsRepositoryError::query,
        SettingsRepositoryError::connection,
    )
}

#[async_trait]
impl SettingsRepository for DieselSettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<Setting>, SettingsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<SettingRow> = settings::table
            .filter(settings::key.eq(key))
            .select(SettingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        Ok(row.map(Setting::from))
    }

    async fn upsert(&self, setting: &Setting) -> Result<(), SettingsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = SettingUpsert {
            key: &setting.key,
            value: &setting.value,
            description: setting.description.as_deref(),
            updated_at: Utc::now(),
        };
        diesel::insert_into(settings::table)
            .values(&row)
            .on_conflict(settings::key)
            .do_update()
            .set((
                settings::value.eq(excluded(settings::value)),
                settings::description.eq(excluded(settings::description)),
                settings::updated_at.eq(excluded(settings::updated_at)),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }
}
