//! Contact Storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    contacts::{Contact, ContactStore},
    error::{BridgeError, Result},
    user::UserId,
};
use sqlx::{sqlite::SqlitePool, Row, Sqlite, Transaction};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, error};

/// SQLite-backed contact store
///
/// Multi-valued fields are stored as one JSON column. [`ContactStore::replace_all`]
/// is overridden to run the delete and every insert in a single transaction, so a
/// failed sync leaves the previous contact set intact.
pub struct SqliteContactStore {
    pool: SqlitePool,
}

impl SqliteContactStore {
    /// Create a new contact store with the given database path
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        let pool = crate::open_pool(&db_path).await?;
        Self::create_schema(&pool).await?;

        debug!(path = ?db_path, "Initialized contact store");

        Ok(Self { pool })
    }

    /// Create an in-memory contact store (for testing)
    pub async fn in_memory() -> Result<Self> {
        let pool = crate::open_memory_pool().await?;
        Self::create_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn create_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS contacts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                firstname TEXT NOT NULL,
                surname TEXT NOT NULL,
                middlename TEXT NOT NULL,
                prefix TEXT,
                suffix TEXT,
                fields_json TEXT NOT NULL,
                photo BLOB
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to create table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_contacts_user ON contacts(user_id)")
            .execute(pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to create index: {}", e)))?;

        Ok(())
    }

    async fn insert_in(
        tx: &mut Transaction<'_, Sqlite>,
        user: UserId,
        contact: &Contact,
        update: bool,
    ) -> Result<()> {
        let fields_json = serde_json::to_string(&contact.fields).map_err(|e| {
            BridgeError::OperationFailed(format!("Failed to encode contact fields: {}", e))
        })?;

        if update {
            let updated = sqlx::query(
                r#"
                UPDATE contacts SET
                    firstname = ?, surname = ?, middlename = ?,
                    prefix = ?, suffix = ?, fields_json = ?, photo = ?
                WHERE user_id = ? AND name = ?
                "#,
            )
            .bind(&contact.firstname)
            .bind(&contact.surname)
            .bind(&contact.middlename)
            .bind(&contact.prefix)
            .bind(&contact.suffix)
            .bind(&fields_json)
            .bind(&contact.photo)
            .bind(user.as_i64())
            .bind(&contact.name)
            .execute(&mut **tx)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to update contact: {}", e)))?;

            if updated.rows_affected() > 0 {
                return Ok(());
            }
        }

        sqlx::query(
            r#"
            INSERT INTO contacts
                (user_id, name, firstname, surname, middlename, prefix, suffix, fields_json, photo)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.as_i64())
        .bind(&contact.name)
        .bind(&contact.firstname)
        .bind(&contact.surname)
        .bind(&contact.middlename)
        .bind(&contact.prefix)
        .bind(&contact.suffix)
        .bind(&fields_json)
        .bind(&contact.photo)
        .execute(&mut **tx)
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to insert contact: {}", e)))?;

        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool.begin().await.map_err(|e| {
            BridgeError::DatabaseError(format!("Failed to begin transaction: {}", e))
        })
    }

    async fn commit(tx: Transaction<'static, Sqlite>) -> Result<()> {
        tx.commit().await.map_err(|e| {
            BridgeError::DatabaseError(format!("Failed to commit transaction: {}", e))
        })
    }
}

#[async_trait]
impl ContactStore for SqliteContactStore {
    async fn delete_all(&self, user: UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM contacts WHERE user_id = ?")
            .bind(user.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(user = %user, error = %e, "Failed to delete contacts");
                BridgeError::DatabaseError(format!("Failed to delete contacts: {}", e))
            })?;

        debug!(user = %user, deleted = result.rows_affected(), "Deleted contacts");
        Ok(result.rows_affected())
    }

    async fn insert(&self, user: UserId, contact: &Contact, update: bool) -> Result<()> {
        let mut tx = self.begin().await?;
        Self::insert_in(&mut tx, user, contact, update).await?;
        Self::commit(tx).await
    }

    async fn list(&self, user: UserId) -> Result<Vec<Contact>> {
        let rows = sqlx::query(
            r#"
            SELECT name, firstname, surname, middlename, prefix, suffix, fields_json, photo
            FROM contacts WHERE user_id = ? ORDER BY id
            "#,
        )
        .bind(user.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to list contacts: {}", e)))?;

        rows.into_iter()
            .map(|row| {
                let fields_json: String = row.get("fields_json");
                let fields: BTreeMap<String, Vec<String>> = serde_json::from_str(&fields_json)
                    .map_err(|e| {
                        BridgeError::DatabaseError(format!("Corrupt contact fields: {}", e))
                    })?;

                Ok(Contact {
                    name: row.get("name"),
                    firstname: row.get("firstname"),
                    surname: row.get("surname"),
                    middlename: row.get("middlename"),
                    prefix: row.get("prefix"),
                    suffix: row.get("suffix"),
                    fields,
                    photo: row.get("photo"),
                })
            })
            .collect()
    }

    async fn replace_all(&self, user: UserId, contacts: &[Contact]) -> Result<usize> {
        let mut tx = self.begin().await?;

        let deleted = sqlx::query("DELETE FROM contacts WHERE user_id = ?")
            .bind(user.as_i64())
            .execute(&mut *tx)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to delete contacts: {}", e)))?
            .rows_affected();

        for contact in contacts {
            Self::insert_in(&mut tx, user, contact, false).await?;
        }

        Self::commit(tx).await?;

        debug!(
            user = %user,
            deleted = deleted,
            inserted = contacts.len(),
            "Replaced contacts"
        );
        Ok(contacts.len())
    }
}
