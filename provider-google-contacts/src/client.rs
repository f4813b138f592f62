//! Contacts feed client
//!
//! Issues the three kinds of request the sync needs (default group lookup,
//! contact listing, photo download) against the GData feed and classifies
//! each response by status code.

use bridge_traits::http::{HttpClient, HttpRequest};
use bytes::Bytes;
use core_runtime::config::FeedSettings;
use core_runtime::LOG_TARGET;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::{FeedError, Result};
use crate::parser::parse_feed;
use crate::types::ContactFeed;

/// Body of a successful (status 200) feed response
#[derive(Debug, Clone)]
pub struct FeedResponse {
    pub body: Bytes,
}

impl FeedResponse {
    /// Body decoded as UTF-8
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| FeedError::Parse(format!("feed body is not UTF-8: {}", e)))
    }
}

/// Google Contacts feed client
///
/// Every request carries the caller's access token as a bearer token and is
/// attempted exactly once.
///
/// # Example
///
/// ```ignore
/// let client = FeedClient::new(http_client, FeedSettings::default());
/// if let Some(group) = client.default_group_id(&token).await? {
///     let feed = client.list_contacts(&token, &group).await?;
/// }
/// ```
pub struct FeedClient {
    http_client: Arc<dyn HttpClient>,
    settings: FeedSettings,
}

impl FeedClient {
    pub fn new(http_client: Arc<dyn HttpClient>, settings: FeedSettings) -> Self {
        Self {
            http_client,
            settings,
        }
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    fn feed_url(&self, path: &str) -> Result<Url> {
        let raw = format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path);
        Url::parse(&raw).map_err(|e| FeedError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    /// `{base}/groups/default/full?v=3.0`
    pub fn groups_url(&self) -> Result<String> {
        let mut url = self.feed_url("groups/default/full")?;
        url.query_pairs_mut()
            .append_pair("v", &self.settings.protocol_version);
        Ok(url.into())
    }

    /// `{base}/contacts/default/full?max-results=9999&v=3.0&group=<group id>`
    pub fn contacts_url(&self, group_id: &str) -> Result<String> {
        let mut url = self.feed_url("contacts/default/full")?;
        url.query_pairs_mut()
            .append_pair("max-results", &self.settings.max_results.to_string())
            .append_pair("v", &self.settings.protocol_version)
            .append_pair("group", group_id);
        Ok(url.into())
    }

    /// Perform one authenticated GET and classify the outcome
    ///
    /// `200` yields the body, `401` [`FeedError::AuthFailed`], `403`
    /// [`FeedError::Forbidden`]; any other status and any transport failure
    /// yield [`FeedError::Unreachable`].
    #[instrument(skip(self, access_token), fields(url = %url))]
    pub async fn request(&self, url: &str, access_token: &str) -> Result<FeedResponse> {
        let request = HttpRequest::get(url)
            .bearer_token(access_token)
            .timeout(self.settings.timeout);

        let response = self.http_client.execute(request).await.map_err(|e| {
            warn!(target: LOG_TARGET, "Feed request failed: {}", e);
            FeedError::Unreachable(e.to_string())
        })?;

        match response.status {
            200 => {
                debug!(target: LOG_TARGET, "Feed request succeeded: {} bytes", response.body.len());
                Ok(FeedResponse {
                    body: response.body,
                })
            }
            401 => {
                warn!(target: LOG_TARGET, "Feed rejected access token");
                Err(FeedError::AuthFailed)
            }
            403 => {
                warn!(target: LOG_TARGET, "Feed access forbidden");
                Err(FeedError::Forbidden)
            }
            status => {
                warn!(target: LOG_TARGET, "Feed request failed: status={}", status);
                Err(FeedError::Unreachable(format!("status {}", status)))
            }
        }
    }

    /// Id of the first group in the user's group feed
    ///
    /// `Ok(None)` when the feed answered but lists no group.
    #[instrument(skip(self, access_token))]
    pub async fn default_group_id(&self, access_token: &str) -> Result<Option<String>> {
        let url = self.groups_url()?;
        let response = self.request(&url, access_token).await?;
        let entries = parse_feed(&response.text()?)?;

        let group_id = entries
            .into_iter()
            .next()
            .and_then(|entry| entry.id)
            .filter(|id| !id.is_empty());

        match &group_id {
            Some(id) => debug!(target: LOG_TARGET, "Default group: {}", id),
            None => warn!(target: LOG_TARGET, "Group feed lists no group"),
        }
        Ok(group_id)
    }

    /// Every contact entry of `group_id`
    #[instrument(skip(self, access_token))]
    pub async fn list_contacts(&self, access_token: &str, group_id: &str) -> Result<ContactFeed> {
        let url = self.contacts_url(group_id)?;
        let response = self.request(&url, access_token).await?;
        let feed = ContactFeed::from_entries(parse_feed(&response.text()?)?);

        info!(target: LOG_TARGET, "Contact feed lists {} entries", feed.len());
        Ok(feed)
    }

    /// Download a contact photo
    ///
    /// Any outcome other than status 200 yields `None`; a missing photo never
    /// fails the contact it belongs to.
    #[instrument(skip(self, access_token))]
    pub async fn fetch_photo(&self, href: &str, access_token: &str) -> Option<Vec<u8>> {
        match self.request(href, access_token).await {
            Ok(response) => Some(response.body.to_vec()),
            Err(e) => {
                debug!(target: LOG_TARGET, "Skipping photo: {}", e);
                None
            }
        }
    }
}
