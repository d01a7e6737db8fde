//! Repository for the `app_settings` key/value table.

use portal_core::types::DbId;
use sqlx::PgPool;

use crate::models::setting::AppSetting;

const COLUMNS: &str = "id, setting_key, value, updated_by, created_at, updated_at";

pub struct SettingsRepo;

impl SettingsRepo {
    pub async fn get(pool: &PgPool, key: &str) -> Result<Option<AppSetting>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM app_settings WHERE setting_key = $1");
        sqlx::query_as::<_, AppSetting>(&query)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// Insert or replace the value stored under `key`.
    pub async fn upsert(
        pool: &PgPool,
        key: &str,
        value: &serde_json::Value,
        updated_by: DbId,
    ) -> Result<AppSetting, sqlx::Error> {
        let query = format!(
            "INSERT INTO app_settings (setting_key, value, updated_by)
             VALUES ($1, $2, $3)
             ON CONFLICT (setting_key) DO UPDATE SET
                value = EXCLUDED.value,
                updated_by = EXCLUDED.updated_by
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AppSetting>(&query)
            .bind(key)
            .bind(value)
            .bind(updated_by)
            .fetch_one(pool)
            .await
    }
}
