//! # Core Configuration Module
//!
//! Provides configuration management for the contacts sync core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the OAuth client settings, the feed endpoint settings and
//! every bridge the core talks through. It enforces fail-fast validation so a
//! missing bridge or an incomplete OAuth client is reported at startup rather
//! than on the first sync.
//!
//! ## Required Dependencies
//!
//! - `SettingsStore` - per-user preferences (token, auth code, flags)
//! - `ContactStore` - per-user contact persistence
//!
//! ## Optional Dependencies (with defaults)
//!
//! - `HttpClient` - desktop default: reqwest (`desktop-shims` feature)
//! - `Localizer` - default: built-in English catalog
//! - `Clock` - default: system clock
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, OAuthClientSettings};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .oauth(OAuthClientSettings::from_env()?)
//!     .settings_store(Arc::new(my_settings))
//!     .contact_store(Arc::new(my_contacts))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::i18n::EnglishCatalog;
use bridge_traits::{Clock, ContactStore, HttpClient, Localizer, SettingsStore, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Scope granting read-only access to the user's contacts
pub const CONTACTS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/contacts.readonly";

/// Redirect URI for the copy/paste (out-of-band) authorization flow
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

pub const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.google.com/o/oauth2/token";
pub const DEFAULT_FEED_BASE_URL: &str = "https://www.google.com/m8/feeds";

/// OAuth2 client registration and endpoints.
///
/// `use_redirect` selects between a real redirect back to the host
/// (`redirect_url` must then be set) and the out-of-band flow where the user
/// pastes the code into the host.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthClientSettings {
    pub application_name: String,
    pub client_id: String,
    pub client_secret: String,
    pub use_redirect: bool,
    pub redirect_url: Option<String>,
    pub scopes: Vec<String>,
    pub auth_url: String,
    pub token_url: String,
}

impl std::fmt::Debug for OAuthClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClientSettings")
            .field("application_name", &self.application_name)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("use_redirect", &self.use_redirect)
            .field("redirect_url", &self.redirect_url)
            .field("scopes", &self.scopes)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}

impl OAuthClientSettings {
    /// Client settings with Google's endpoints and the read-only contacts scope
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            application_name: "contacts-sync".to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            use_redirect: false,
            redirect_url: None,
            scopes: vec![CONTACTS_READONLY_SCOPE.to_string()],
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }

    /// Read client settings from the environment.
    ///
    /// `GOOGLE_CLIENT_ID` and `GOOGLE_CLIENT_SECRET` are required;
    /// `GOOGLE_APPLICATION_NAME` and `GOOGLE_REDIRECT_URL` are optional, and a
    /// redirect URL switches the client to the redirect flow.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{} is not set", key)))
        };

        let mut settings = Self::new(required("GOOGLE_CLIENT_ID")?, required("GOOGLE_CLIENT_SECRET")?);

        if let Some(name) = lookup("GOOGLE_APPLICATION_NAME").filter(|v| !v.is_empty()) {
            settings.application_name = name;
        }
        if let Some(url) = lookup("GOOGLE_REDIRECT_URL").filter(|v| !v.is_empty()) {
            settings = settings.with_redirect_url(url);
        }

        Ok(settings)
    }

    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    /// Use the redirect flow with the given URL
    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.use_redirect = true;
        self.redirect_url = Some(url.into());
        self
    }

    /// Override the authorization and token endpoints
    pub fn with_endpoints(mut self, auth_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into();
        self.token_url = token_url.into();
        self
    }

    /// The redirect URI to register with the provider
    pub fn redirect_uri(&self) -> Result<&str> {
        if !self.use_redirect {
            return Ok(OOB_REDIRECT_URI);
        }

        self.redirect_url.as_deref().ok_or_else(|| {
            Error::Config(
                "Redirect flow selected but no redirect URL configured. \
                 Set GOOGLE_REDIRECT_URL or use the out-of-band flow."
                    .to_string(),
            )
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::Config("OAuth client id cannot be empty".to_string()));
        }
        if self.client_secret.trim().is_empty() {
            return Err(Error::Config(
                "OAuth client secret cannot be empty".to_string(),
            ));
        }
        if self.scopes.is_empty() {
            return Err(Error::Config(
                "At least one OAuth scope is required".to_string(),
            ));
        }

        parse_http_url("OAuth authorization URL", &self.auth_url)?;
        parse_http_url("OAuth token URL", &self.token_url)?;

        let redirect = self.redirect_uri()?;
        if self.use_redirect {
            parse_http_url("OAuth redirect URL", redirect)?;
        }

        Ok(())
    }
}

/// Feed endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    /// Base URL the `groups/` and `contacts/` feeds hang off
    pub base_url: String,
    /// Value of the `v` query parameter on every feed request
    pub protocol_version: String,
    /// `max-results` for the contact listing; large enough to be unbounded in practice
    pub max_results: u32,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FEED_BASE_URL.to_string(),
            protocol_version: "3.0".to_string(),
            max_results: 9999,
            timeout: Duration::from_secs(30),
        }
    }
}

impl FeedSettings {
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        parse_http_url("Feed base URL", &self.base_url)?;

        if self.protocol_version.trim().is_empty() {
            return Err(Error::Config(
                "Feed protocol version cannot be empty".to_string(),
            ));
        }
        if self.max_results == 0 {
            return Err(Error::Config(
                "Feed max results must be greater than 0".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config(
                "Feed timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_http_url(what: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value)
        .map_err(|e| Error::Config(format!("{} '{}' is invalid: {}", what, value, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Config(format!(
            "{} must use http or https, got '{}'",
            what, other
        ))),
    }
}

/// Core configuration for the contacts sync core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    pub oauth: OAuthClientSettings,
    pub feed: FeedSettings,
    pub http_client: Arc<dyn HttpClient>,
    pub settings_store: Arc<dyn SettingsStore>,
    pub contact_store: Arc<dyn ContactStore>,
    pub localizer: Arc<dyn Localizer>,
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("oauth", &self.oauth)
            .field("feed", &self.feed)
            .field("http_client", &"HttpClient { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .field("contact_store", &"ContactStore { ... }")
            .field("localizer", &"Localizer { ... }")
            .field("clock", &"Clock { ... }")
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the OAuth client and feed settings.
    pub fn validate(&self) -> Result<()> {
        self.oauth.validate()?;
        self.feed.validate()
    }
}

fn capability_missing(capability: &str, message: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: message.to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(feed: &FeedSettings) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::with_timeout(feed.timeout));
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_feed: &FeedSettings) -> Result<Arc<dyn HttpClient>> {
    Err(capability_missing(
        "HttpClient",
        "HttpClient implementation is required to reach the token and feed endpoints. \
         Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
         Other hosts: inject the platform HTTP stack.",
    ))
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    oauth: Option<OAuthClientSettings>,
    feed: Option<FeedSettings>,
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    contact_store: Option<Arc<dyn ContactStore>>,
    localizer: Option<Arc<dyn Localizer>>,
    clock: Option<Arc<dyn Clock>>,
}

impl CoreConfigBuilder {
    /// Sets the OAuth client settings (required).
    pub fn oauth(mut self, settings: OAuthClientSettings) -> Self {
        self.oauth = Some(settings);
        self
    }

    /// Sets the feed endpoint settings. Default: Google's contacts feed, v3.0.
    pub fn feed(mut self, settings: FeedSettings) -> Self {
        self.feed = Some(settings);
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the per-user settings store (required).
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Sets the contact store (required).
    pub fn contact_store(mut self, store: Arc<dyn ContactStore>) -> Self {
        self.contact_store = Some(store);
        self
    }

    /// Sets the message catalog. Default: [`EnglishCatalog`].
    pub fn localizer(mut self, localizer: Arc<dyn Localizer>) -> Self {
        self.localizer = Some(localizer);
        self
    }

    /// Sets the time source used for token expiry. Default: [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - `Error::Config` when the OAuth settings are absent or invalid, or the
    ///   feed settings are invalid
    /// - `Error::CapabilityMissing` when a required bridge is absent
    pub fn build(self) -> Result<CoreConfig> {
        let oauth = self.oauth.ok_or_else(|| {
            Error::Config(
                "OAuth client settings are required. Use .oauth() or OAuthClientSettings::from_env()."
                    .to_string(),
            )
        })?;
        let feed = self.feed.unwrap_or_default();

        let settings_store = self.settings_store.ok_or_else(|| {
            capability_missing(
                "SettingsStore",
                "SettingsStore implementation is required to keep the OAuth token, \
                 auth code and sync flags per user.",
            )
        })?;

        let contact_store = self.contact_store.ok_or_else(|| {
            capability_missing(
                "ContactStore",
                "ContactStore implementation is required to persist synced contacts.",
            )
        })?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(&feed)?,
        };

        let config = CoreConfig {
            oauth,
            feed,
            http_client,
            settings_store,
            contact_store,
            localizer: self
                .localizer
                .unwrap_or_else(|| Arc::new(EnglishCatalog) as Arc<dyn Localizer>),
            clock: self
                .clock
                .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>),
        };

        config.validate()?;

        Ok(config)
    }
}
