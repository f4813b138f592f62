//! Per-user Preference Storage
//!
//! The host keeps a key/value preference bag per user. The core reads and
//! writes its auth state through this trait and never touches the host's
//! storage directly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::user::UserId;

/// A stored preference value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingValue {
    Text(String),
    Flag(bool),
}

impl SettingValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SettingValue::Text(value) => Some(value),
            SettingValue::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            SettingValue::Flag(value) => Some(*value),
            SettingValue::Text(_) => None,
        }
    }
}

/// Key-value settings storage trait, scoped by user
///
/// `save` applies a batch of updates in one go, mirroring the host's
/// "save preferences" call: `Some(value)` writes a key, `None` removes it.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::{SettingValue, SettingsStore};
///
/// async fn enable_autosync(store: &dyn SettingsStore, user: UserId) -> Result<()> {
///     store
///         .save(user, vec![("google_autosync".to_string(), Some(SettingValue::Flag(true)))])
///         .await
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Retrieve a raw value
    async fn get(&self, user: UserId, key: &str) -> Result<Option<SettingValue>>;

    /// Apply a batch of updates
    async fn save(&self, user: UserId, updates: Vec<(String, Option<SettingValue>)>) -> Result<()>;

    /// Retrieve a string value; non-string values read as absent
    async fn get_string(&self, user: UserId, key: &str) -> Result<Option<String>> {
        Ok(self
            .get(user, key)
            .await?
            .and_then(|value| value.as_text().map(str::to_string)))
    }

    /// Retrieve a boolean value; non-boolean values read as absent
    async fn get_bool(&self, user: UserId, key: &str) -> Result<Option<bool>> {
        Ok(self.get(user, key).await?.and_then(|value| value.as_flag()))
    }

    /// Store a single string value
    async fn set_string(&self, user: UserId, key: &str, value: &str) -> Result<()> {
        self.save(
            user,
            vec![(key.to_string(), Some(SettingValue::Text(value.to_string())))],
        )
        .await
    }

    /// Store a single boolean value
    async fn set_bool(&self, user: UserId, key: &str, value: bool) -> Result<()> {
        self.save(user, vec![(key.to_string(), Some(SettingValue::Flag(value)))])
            .await
    }
}
