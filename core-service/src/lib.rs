//! Core service façade and bootstrap helpers.
//!
//! This crate wires a [`CoreConfig`] into the auth manager and the sync
//! orchestrator and exposes the operations a host application calls.
//! Desktop hosts typically enable the `desktop-shims` feature (default), which
//! adds [`bootstrap_desktop`] on top of the `bridge-desktop` adapters.

pub mod error;

pub use error::{CoreError, Result};

pub use bridge_traits::UserId;
pub use core_auth::AuthResult;
pub use core_runtime::config::{CoreConfig, FeedSettings, OAuthClientSettings};
pub use core_sync::SyncResult;

use core_auth::AuthManager;
use core_runtime::LOG_TARGET;
use core_sync::SyncOrchestrator;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[cfg(feature = "desktop-shims")]
use std::path::Path;

/// Primary façade exposed to host applications.
///
/// Cheap to clone; clones share the same auth manager and orchestrator.
#[derive(Clone)]
pub struct ContactsService {
    auth: Arc<AuthManager>,
    sync: Arc<SyncOrchestrator>,
}

impl ContactsService {
    /// Create a new service from a validated configuration.
    pub fn new(config: CoreConfig) -> Self {
        let auth = Arc::new(AuthManager::from_config(&config));
        let sync = Arc::new(SyncOrchestrator::with_auth(&config, auth.clone()));
        Self { auth, sync }
    }

    /// Consent URL to send the user to.
    pub fn authorization_url(&self) -> Result<String> {
        Ok(self.auth.authorization_url()?)
    }

    /// Store the code the user obtained from the consent page.
    ///
    /// Any stored token is dropped so that the next authentication exchanges
    /// the new code.
    #[instrument(skip(self, code), fields(user = %user))]
    pub async fn save_auth_code(&self, user: UserId, code: &str) -> Result<()> {
        self.auth.token_store().save_auth_code(user, code).await?;
        info!(target: LOG_TARGET, user = %user, "Stored new auth code");
        Ok(())
    }

    pub async fn authenticate(&self, user: UserId) -> AuthResult {
        self.auth.authenticate(user).await
    }

    pub async fn sync(&self, user: UserId) -> SyncResult {
        self.sync.sync(user).await
    }

    /// Sync only when the user has the addressbook enabled and autosync on.
    ///
    /// Returns `None` when the sync was skipped.
    pub async fn sync_if_autosync(&self, user: UserId) -> Result<Option<SyncResult>> {
        let store = self.auth.token_store();
        if !store.is_enabled(user).await? || !store.is_autosync(user).await? {
            debug!(target: LOG_TARGET, user = %user, "Autosync off, skipping sync");
            return Ok(None);
        }

        Ok(Some(self.sync.sync(user).await))
    }

    pub async fn is_enabled(&self, user: UserId) -> Result<bool> {
        Ok(self.auth.token_store().is_enabled(user).await?)
    }

    pub async fn set_enabled(&self, user: UserId, enabled: bool) -> Result<()> {
        Ok(self.auth.token_store().set_enabled(user, enabled).await?)
    }

    pub async fn is_autosync(&self, user: UserId) -> Result<bool> {
        Ok(self.auth.token_store().is_autosync(user).await?)
    }

    pub async fn set_autosync(&self, user: UserId, autosync: bool) -> Result<()> {
        Ok(self.auth.token_store().set_autosync(user, autosync).await?)
    }

    /// Forget the user's token and auth code and turn autosync off.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn sign_out(&self, user: UserId) -> Result<()> {
        self.auth.token_store().clear(user).await?;
        info!(target: LOG_TARGET, user = %user, "Signed out");
        Ok(())
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Opens (creating if needed) `settings.db` and `contacts.db` under `data_dir`
/// and uses the reqwest HTTP client.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// use core_service::{bootstrap_desktop, OAuthClientSettings, UserId};
///
/// let oauth = OAuthClientSettings::new("client-id", "client-secret");
/// let service = bootstrap_desktop("data".as_ref(), oauth).await?;
/// println!("Authorize at {}", service.authorization_url()?);
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(
    data_dir: &Path,
    oauth: OAuthClientSettings,
) -> Result<ContactsService> {
    use bridge_desktop::{SqliteContactStore, SqliteSettingsStore};

    let settings = SqliteSettingsStore::new(data_dir.join("settings.db"))
        .await
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
    let contacts = SqliteContactStore::new(data_dir.join("contacts.db"))
        .await
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;

    let config = CoreConfig::builder()
        .oauth(oauth)
        .settings_store(Arc::new(settings))
        .contact_store(Arc::new(contacts))
        .build()?;

    Ok(ContactsService::new(config))
}
