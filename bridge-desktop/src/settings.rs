//! Settings Storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{SettingValue, SettingsStore},
    user::UserId,
};
use sqlx::{sqlite::SqlitePool, Row};
use std::path::PathBuf;
use tracing::{debug, error};

const TEXT_TYPE: &str = "text";
const FLAG_TYPE: &str = "flag";

/// SQLite-backed per-user settings store
///
/// Rows are keyed by `(user_id, key)`. A batch passed to [`SettingsStore::save`]
/// is applied inside one transaction, so readers never observe half of it.
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    /// Create a new settings store with the given database path
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        let pool = crate::open_pool(&db_path).await?;
        Self::create_schema(&pool).await?;

        debug!(path = ?db_path, "Initialized settings store");

        Ok(Self { pool })
    }

    /// Create an in-memory settings store (for testing)
    pub async fn in_memory() -> Result<Self> {
        let pool = crate::open_memory_pool().await?;
        Self::create_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn create_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_settings (
                user_id INTEGER NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                value_type TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (user_id, key)
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to create table: {}", e)))?;

        Ok(())
    }

    fn encode(value: &SettingValue) -> (String, &'static str) {
        match value {
            SettingValue::Text(text) => (text.clone(), TEXT_TYPE),
            SettingValue::Flag(flag) => (flag.to_string(), FLAG_TYPE),
        }
    }

    fn decode(value: String, value_type: &str) -> Result<SettingValue> {
        match value_type {
            TEXT_TYPE => Ok(SettingValue::Text(value)),
            FLAG_TYPE => value.parse::<bool>().map(SettingValue::Flag).map_err(|e| {
                BridgeError::DatabaseError(format!("Invalid flag value '{}': {}", value, e))
            }),
            other => Err(BridgeError::DatabaseError(format!(
                "Unknown value type: {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn get(&self, user: UserId, key: &str) -> Result<Option<SettingValue>> {
        let row = sqlx::query("SELECT value, value_type FROM user_settings WHERE user_id = ? AND key = ?")
            .bind(user.as_i64())
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!(user = %user, key = key, error = %e, "Failed to get setting");
                BridgeError::DatabaseError(format!("Failed to get setting: {}", e))
            })?;

        match row {
            Some(row) => {
                let value: String = row.get("value");
                let value_type: String = row.get("value_type");
                Ok(Some(Self::decode(value, &value_type)?))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, user: UserId, updates: Vec<(String, Option<SettingValue>)>) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        let mut tx = self.pool.begin().await.map_err(|e| {
            BridgeError::DatabaseError(format!("Failed to begin transaction: {}", e))
        })?;

        for (key, value) in &updates {
            let result = match value {
                Some(value) => {
                    let (encoded, value_type) = Self::encode(value);
                    sqlx::query(
                        r#"
                        INSERT INTO user_settings (user_id, key, value, value_type, updated_at)
                        VALUES (?, ?, ?, ?, ?)
                        ON CONFLICT(user_id, key) DO UPDATE SET
                            value = excluded.value,
                            value_type = excluded.value_type,
                            updated_at = excluded.updated_at
                        "#,
                    )
                    .bind(user.as_i64())
                    .bind(key)
                    .bind(encoded)
                    .bind(value_type)
                    .bind(now)
                    .execute(&mut *tx)
                    .await
                }
                None => {
                    sqlx::query("DELETE FROM user_settings WHERE user_id = ? AND key = ?")
                        .bind(user.as_i64())
                        .bind(key)
                        .execute(&mut *tx)
                        .await
                }
            };

            result.map_err(|e| {
                error!(user = %user, key = %key, error = %e, "Failed to save setting");
                BridgeError::DatabaseError(format!("Failed to save setting: {}", e))
            })?;
        }

        tx.commit().await.map_err(|e| {
            BridgeError::DatabaseError(format!("Failed to commit transaction: {}", e))
        })?;

        debug!(user = %user, count = updates.len(), "Saved settings");
        Ok(())
    }
}
