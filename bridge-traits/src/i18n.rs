//! Localized Message Lookup
//!
//! The core reports outcomes as message keys; the host turns them into
//! user-facing text. Returned strings are opaque to the core.

use std::fmt;

/// Message domain the core's keys live under
pub const MESSAGE_DOMAIN: &str = "google_addressbook";

/// Keys of every user-facing message the core can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// Authentication finished successfully
    Done,
    /// The user has not completed the authorization handshake yet
    NoAuthCode,
    /// Stored token is expired and carries no refresh token
    NoRefreshToken,
    /// The provider rejected the stored grant; auth state was reset
    InvalidGrant,
    /// Token endpoint failure other than an invalid grant
    AuthFailed,
    /// Feed request answered 401
    GoogleAuthFailed,
    /// Feed request answered 403
    GoogleForbidden,
    /// Feed request failed in any other way
    GoogleUnreachable,
    /// Group feed did not contain a default group
    NoDefaultGroup,
    /// Contact storage failed
    StorageFailed,
    /// Suffix appended to the synced contact count
    ContactsFound,
}

impl MessageKey {
    /// Catalog key string
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKey::Done => "done",
            MessageKey::NoAuthCode => "noauthcode",
            MessageKey::NoRefreshToken => "norefreshtoken",
            MessageKey::InvalidGrant => "invalidgrant",
            MessageKey::AuthFailed => "authfailed",
            MessageKey::GoogleAuthFailed => "googleauthfailed",
            MessageKey::GoogleForbidden => "googleforbidden",
            MessageKey::GoogleUnreachable => "googleunreachable",
            MessageKey::NoDefaultGroup => "nodefaultgroup",
            MessageKey::StorageFailed => "storagefailed",
            MessageKey::ContactsFound => "contactsfound",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host message catalog
///
/// # Example
///
/// ```ignore
/// use bridge_traits::i18n::{Localizer, MessageKey};
///
/// fn greet(localizer: &dyn Localizer) -> String {
///     localizer.message(MessageKey::Done)
/// }
/// ```
pub trait Localizer: Send + Sync {
    /// Look up `key` in `domain`
    fn gettext(&self, key: &str, domain: &str) -> String;

    /// Look up a core message in [`MESSAGE_DOMAIN`]
    fn message(&self, key: MessageKey) -> String {
        self.gettext(key.as_str(), MESSAGE_DOMAIN)
    }
}
