//! Per-user Token and Flag Storage
//!
//! Auth state lives in the host's per-user preferences under fixed keys:
//!
//! | Key | Value |
//! |-----|-------|
//! | `google_current_token` | token JSON |
//! | `google_auth_code` | one-time authorization code |
//! | `google_autosync` | sync automatically on login |
//! | `google_use_addressbook` | addressbook enabled |
//!
//! Token values are never logged.

use crate::error::{AuthError, Result};
use crate::types::OAuthToken;
use bridge_traits::{SettingValue, SettingsStore, UserId};
use std::sync::Arc;
use tracing::{debug, warn};

pub const TOKEN_KEY: &str = "google_current_token";
pub const AUTH_CODE_KEY: &str = "google_auth_code";
pub const AUTOSYNC_KEY: &str = "google_autosync";
pub const USE_ADDRESSBOOK_KEY: &str = "google_use_addressbook";

/// Auth state on top of a [`SettingsStore`]
#[derive(Clone)]
pub struct TokenStore {
    settings: Arc<dyn SettingsStore>,
}

fn storage_error(e: bridge_traits::BridgeError) -> AuthError {
    AuthError::Storage(e.to_string())
}

impl TokenStore {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    /// Load the stored token; placeholders and unreadable values read as `None`
    pub async fn load_token(&self, user: UserId) -> Result<Option<OAuthToken>> {
        let raw = self
            .settings
            .get_string(user, TOKEN_KEY)
            .await
            .map_err(storage_error)?;

        let token = raw.as_deref().and_then(OAuthToken::from_stored);
        if token.is_none() && raw.as_deref().is_some_and(|r| !r.trim().is_empty() && r.trim() != "[]") {
            warn!(user = %user, "Stored token is unreadable, treating as absent");
        }

        Ok(token)
    }

    /// Overwrite the stored token
    pub async fn save_token(&self, user: UserId, token: &OAuthToken) -> Result<()> {
        let json = token.to_json()?;
        self.settings
            .set_string(user, TOKEN_KEY, &json)
            .await
            .map_err(storage_error)?;

        debug!(user = %user, "Stored token");
        Ok(())
    }

    /// Store a token minted from the auth code and drop the code in the same batch
    pub async fn save_exchanged_token(&self, user: UserId, token: &OAuthToken) -> Result<()> {
        let json = token.to_json()?;
        self.settings
            .save(
                user,
                vec![
                    (TOKEN_KEY.to_string(), Some(SettingValue::Text(json))),
                    (AUTH_CODE_KEY.to_string(), None),
                ],
            )
            .await
            .map_err(storage_error)?;

        debug!(user = %user, "Stored token and consumed auth code");
        Ok(())
    }

    /// Load the one-time auth code; an empty code reads as `None`
    pub async fn load_auth_code(&self, user: UserId) -> Result<Option<String>> {
        let code = self
            .settings
            .get_string(user, AUTH_CODE_KEY)
            .await
            .map_err(storage_error)?;

        Ok(code
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty()))
    }

    /// Store the auth code the user pasted; any stored token is dropped so the
    /// next authentication exchanges the new code
    pub async fn save_auth_code(&self, user: UserId, code: &str) -> Result<()> {
        self.settings
            .save(
                user,
                vec![
                    (
                        AUTH_CODE_KEY.to_string(),
                        Some(SettingValue::Text(code.trim().to_string())),
                    ),
                    (TOKEN_KEY.to_string(), None),
                ],
            )
            .await
            .map_err(storage_error)
    }

    /// Forget the token and auth code and switch autosync off
    pub async fn clear(&self, user: UserId) -> Result<()> {
        self.settings
            .save(
                user,
                vec![
                    (TOKEN_KEY.to_string(), None),
                    (AUTH_CODE_KEY.to_string(), None),
                    (AUTOSYNC_KEY.to_string(), Some(SettingValue::Flag(false))),
                ],
            )
            .await
            .map_err(storage_error)?;

        debug!(user = %user, "Cleared auth state");
        Ok(())
    }

    pub async fn is_enabled(&self, user: UserId) -> Result<bool> {
        self.flag(user, USE_ADDRESSBOOK_KEY).await
    }

    pub async fn set_enabled(&self, user: UserId, enabled: bool) -> Result<()> {
        self.settings
            .set_bool(user, USE_ADDRESSBOOK_KEY, enabled)
            .await
            .map_err(storage_error)
    }

    pub async fn is_autosync(&self, user: UserId) -> Result<bool> {
        self.flag(user, AUTOSYNC_KEY).await
    }

    pub async fn set_autosync(&self, user: UserId, autosync: bool) -> Result<()> {
        self.settings
            .set_bool(user, AUTOSYNC_KEY, autosync)
            .await
            .map_err(storage_error)
    }

    async fn flag(&self, user: UserId, key: &str) -> Result<bool> {
        Ok(self
            .settings
            .get_bool(user, key)
            .await
            .map_err(storage_error)?
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemorySettings;

    fn user() -> UserId {
        UserId::new(3)
    }

    fn store() -> (Arc<MemorySettings>, TokenStore) {
        let settings = Arc::new(MemorySettings::default());
        (settings.clone(), TokenStore::new(settings))
    }

    #[tokio::test]
    async fn test_token_roundtrip() {
        let (_, store) = store();
        let token = OAuthToken::new("a", Some("r".to_string()), 3600, 100);

        store.save_token(user(), &token).await.unwrap();
        assert_eq!(store.load_token(user()).await.unwrap(), Some(token));
    }

    #[tokio::test]
    async fn test_legacy_placeholder_is_no_token() {
        let (settings, store) = store();
        settings
            .put(user(), TOKEN_KEY, SettingValue::Text("[]".to_string()))
            .await;

        assert_eq!(store.load_token(user()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_auth_code_is_absent() {
        let (settings, store) = store();
        settings
            .put(user(), AUTH_CODE_KEY, SettingValue::Text("  ".to_string()))
            .await;

        assert_eq!(store.load_auth_code(user()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_auth_code_drops_token() {
        let (_, store) = store();
        store
            .save_token(user(), &OAuthToken::new("a", None, 3600, 100))
            .await
            .unwrap();

        store.save_auth_code(user(), " 4/0Ad \n").await.unwrap();

        assert_eq!(store.load_token(user()).await.unwrap(), None);
        assert_eq!(
            store.load_auth_code(user()).await.unwrap(),
            Some("4/0Ad".to_string())
        );
    }

    #[tokio::test]
    async fn test_save_exchanged_token_consumes_code() {
        let (_, store) = store();
        store.save_auth_code(user(), "code").await.unwrap();

        let token = OAuthToken::new("a", Some("r".to_string()), 3600, 100);
        store.save_exchanged_token(user(), &token).await.unwrap();

        assert_eq!(store.load_auth_code(user()).await.unwrap(), None);
        assert_eq!(store.load_token(user()).await.unwrap(), Some(token));
    }

    #[tokio::test]
    async fn test_clear_resets_everything() {
        let (settings, store) = store();
        store.save_auth_code(user(), "code").await.unwrap();
        store
            .save_token(user(), &OAuthToken::new("a", None, 3600, 100))
            .await
            .unwrap();
        store.set_autosync(user(), true).await.unwrap();
        store.set_enabled(user(), true).await.unwrap();

        store.clear(user()).await.unwrap();

        let stored = settings.snapshot(user()).await;
        assert!(!stored.contains_key(TOKEN_KEY));
        assert!(!stored.contains_key(AUTH_CODE_KEY));
        assert_eq!(stored.get(AUTOSYNC_KEY), Some(&SettingValue::Flag(false)));
        assert!(store.is_enabled(user()).await.unwrap());
    }

    #[tokio::test]
    async fn test_flags_default_to_false() {
        let (_, store) = store();
        assert!(!store.is_enabled(user()).await.unwrap());
        assert!(!store.is_autosync(user()).await.unwrap());
    }
}
