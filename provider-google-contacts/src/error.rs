//! Error types for the contacts feed provider

use bridge_traits::MessageKey;
use thiserror::Error;

/// Contacts feed errors
#[derive(Error, Debug)]
pub enum FeedError {
    /// The feed answered 401
    #[error("Feed rejected the access token (status 401)")]
    AuthFailed,

    /// The feed answered 403
    #[error("Feed access forbidden (status 403)")]
    Forbidden,

    /// Any other status, or no response at all
    #[error("Feed unreachable: {0}")]
    Unreachable(String),

    /// The body of a 200 response was not a readable feed
    #[error("Failed to parse feed: {0}")]
    Parse(String),

    /// A feed URL could not be built from the configured base URL
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),
}

impl FeedError {
    /// User-facing message for this failure
    pub fn message_key(&self) -> MessageKey {
        match self {
            FeedError::AuthFailed => MessageKey::GoogleAuthFailed,
            FeedError::Forbidden => MessageKey::GoogleForbidden,
            FeedError::Unreachable(_) | FeedError::Parse(_) | FeedError::InvalidUrl(_) => {
                MessageKey::GoogleUnreachable
            }
        }
    }
}

/// Result type for feed operations
pub type Result<T> = std::result::Result<T, FeedError>;
