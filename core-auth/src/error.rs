use bridge_traits::MessageKey;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No authorization code available")]
    NoAuthCode,

    #[error("Token expired and no refresh token is stored")]
    NoRefreshToken,

    #[error("Grant rejected by provider: {0}")]
    InvalidGrant(String),

    #[error("Token endpoint returned {status}: {message}")]
    TokenEndpoint { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Whether the stored grant can never succeed again
    pub fn is_invalid_grant(&self) -> bool {
        matches!(self, AuthError::InvalidGrant(_))
    }

    /// User-facing message for this failure
    pub fn message_key(&self) -> MessageKey {
        match self {
            AuthError::NoAuthCode => MessageKey::NoAuthCode,
            AuthError::NoRefreshToken => MessageKey::NoRefreshToken,
            AuthError::InvalidGrant(_) => MessageKey::InvalidGrant,
            AuthError::Storage(_) => MessageKey::StorageFailed,
            AuthError::TokenEndpoint { .. }
            | AuthError::Network(_)
            | AuthError::Serialization(_)
            | AuthError::Config(_) => MessageKey::AuthFailed,
        }
    }
}

impl From<core_runtime::Error> for AuthError {
    fn from(error: core_runtime::Error) -> Self {
        AuthError::Config(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
