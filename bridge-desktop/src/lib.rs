//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop and server hosts.
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` (one attempt per request, no retry)
//! - `SettingsStore` using a SQLite-backed per-user key-value table
//! - `ContactStore` using a SQLite contacts table with transactional replace
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteContactStore, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let http_client = ReqwestHttpClient::new();
//!     let settings = SqliteSettingsStore::new("data/settings.db".into()).await.unwrap();
//!     let contacts = SqliteContactStore::new("data/contacts.db".into()).await.unwrap();
//!
//!     // Hand these to CoreConfig::builder()
//! }
//! ```

mod contacts;
mod http;
mod settings;

pub use contacts::SqliteContactStore;
pub use http::ReqwestHttpClient;
pub use settings::SqliteSettingsStore;

use bridge_traits::error::{BridgeError, Result};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;

/// Open (creating if needed) a SQLite database file
pub(crate) async fn open_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }
    }

    // SQLite URLs want forward slashes
    let path_str = db_path.to_string_lossy().replace('\\', "/");
    let db_url = format!("sqlite://{}?mode=rwc", path_str);

    SqlitePool::connect(&db_url)
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect to DB: {}", e)))
}

/// Single-connection in-memory pool; every connection would otherwise get its own database
pub(crate) async fn open_memory_pool() -> Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect to DB: {}", e)))
}
