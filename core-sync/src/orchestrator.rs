//! # Sync Orchestrator
//!
//! Runs one full contact sync for one user.
//!
//! ## Workflow
//!
//! 1. Obtain an access token from [`AuthManager`]
//! 2. Resolve the default group from the group feed
//! 3. List every contact of that group
//! 4. Map entries to contacts (see [`crate::mapper`])
//! 5. Replace the user's stored contacts with the mapped set
//!
//! Each step short-circuits the rest on failure. A feed without entries ends
//! the sync at step 4 with a zero count and storage untouched.
//!
//! ## Usage
//!
//! ```no_run
//! use core_sync::SyncOrchestrator;
//! use bridge_traits::UserId;
//!
//! # async fn example(config: core_runtime::config::CoreConfig) {
//! let orchestrator = SyncOrchestrator::from_config(&config);
//!
//! let result = orchestrator.sync(UserId::new(1)).await;
//! println!("{}", result.message);
//! # }
//! ```

use async_trait::async_trait;
use bridge_traits::{ContactStore, Localizer, MessageKey, UserId};
use core_auth::AuthManager;
use core_runtime::config::CoreConfig;
use core_runtime::LOG_TARGET;
use provider_google_contacts::FeedClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::error::{Result, SyncError};
use crate::mapper::{ContactMapper, MappedContacts, PhotoSource};

/// Outcome of a sync as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub success: bool,
    pub message: String,
}

impl SyncResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Photo downloads through the feed client with the sync's access token
struct FeedPhotos {
    feed: Arc<FeedClient>,
    access_token: String,
}

#[async_trait]
impl PhotoSource for FeedPhotos {
    async fn fetch_photo(&self, href: &str) -> Option<Vec<u8>> {
        self.feed.fetch_photo(href, &self.access_token).await
    }
}

pub struct SyncOrchestrator {
    auth: Arc<AuthManager>,
    feed: Arc<FeedClient>,
    contacts: Arc<dyn ContactStore>,
    localizer: Arc<dyn Localizer>,
}

impl SyncOrchestrator {
    pub fn new(
        auth: Arc<AuthManager>,
        feed: FeedClient,
        contacts: Arc<dyn ContactStore>,
        localizer: Arc<dyn Localizer>,
    ) -> Self {
        Self {
            auth,
            feed: Arc::new(feed),
            contacts,
            localizer,
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::with_auth(config, Arc::new(AuthManager::from_config(config)))
    }

    /// Wire an orchestrator that shares an existing auth manager
    pub fn with_auth(config: &CoreConfig, auth: Arc<AuthManager>) -> Self {
        Self::new(
            auth,
            FeedClient::new(config.http_client.clone(), config.feed.clone()),
            config.contact_store.clone(),
            config.localizer.clone(),
        )
    }

    pub fn auth(&self) -> &Arc<AuthManager> {
        &self.auth
    }

    /// Run a sync and fold the outcome into a user-facing result.
    ///
    /// Success reads `<count><contactsfound>`; failures carry the localized
    /// message of the step that failed.
    pub async fn sync(&self, user: UserId) -> SyncResult {
        match self.run(user).await {
            Ok(count) => SyncResult::success(format!(
                "{}{}",
                count,
                self.localizer.message(MessageKey::ContactsFound)
            )),
            Err(err) => {
                error!(target: LOG_TARGET, user = %user, error = %err, "Contact sync failed");
                SyncResult::failure(self.localizer.message(err.message_key()))
            }
        }
    }

    /// Run a sync, returning the number of contacts now stored for `user`.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn run(&self, user: UserId) -> Result<usize> {
        let token = self.auth.authorize(user).await?;

        let group_id = self
            .feed
            .default_group_id(&token.access_token)
            .await?
            .ok_or(SyncError::MissingDefaultGroup)?;

        let feed = self.feed.list_contacts(&token.access_token, &group_id).await?;

        let mapper = ContactMapper::new(Arc::new(FeedPhotos {
            feed: self.feed.clone(),
            access_token: token.access_token.clone(),
        }));

        let contacts = match mapper.map_feed(feed).await {
            MappedContacts::Empty => {
                info!(target: LOG_TARGET, user = %user, "Contact feed is empty, storage left as is");
                return Ok(0);
            }
            MappedContacts::Contacts(contacts) => contacts,
        };

        debug!(user = %user, count = contacts.len(), "Replacing stored contacts");
        let stored = self.contacts.replace_all(user, &contacts).await?;

        info!(target: LOG_TARGET, user = %user, count = stored, "Contact sync finished");
        Ok(stored)
    }
}
