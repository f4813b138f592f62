use bridge_traits::{BridgeError, MessageKey};
use core_auth::AuthError;
use provider_google_contacts::FeedError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("Group feed lists no default group")]
    MissingDefaultGroup,

    #[error("Contact storage failed: {0}")]
    Storage(#[from] BridgeError),
}

impl SyncError {
    /// User-facing message for this failure
    pub fn message_key(&self) -> MessageKey {
        match self {
            SyncError::Auth(err) => err.message_key(),
            SyncError::Feed(err) => err.message_key(),
            SyncError::MissingDefaultGroup => MessageKey::NoDefaultGroup,
            SyncError::Storage(_) => MessageKey::StorageFailed,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_keys() {
        assert_eq!(
            SyncError::from(AuthError::NoAuthCode).message_key(),
            MessageKey::NoAuthCode
        );
        assert_eq!(
            SyncError::from(FeedError::Forbidden).message_key(),
            MessageKey::GoogleForbidden
        );
        assert_eq!(
            SyncError::MissingDefaultGroup.message_key(),
            MessageKey::NoDefaultGroup
        );
        assert_eq!(
            SyncError::from(BridgeError::DatabaseError("locked".into())).message_key(),
            MessageKey::StorageFailed
        );
    }
}
