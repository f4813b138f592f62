//! # Authentication Manager
//!
//! Drives a user's stored credentials to a usable access token.
//!
//! ## Overview
//!
//! [`AuthManager::authorize`] runs the token state machine once:
//! classify the stored token, take the single step that state calls for, and
//! persist the outcome. [`AuthManager::authenticate`] wraps it into the
//! `{success, message}` result shown to the user.
//!
//! - Every outcome is logged under the `google_contacts` target.
//! - On success the token is always written back, even when it was reused
//!   unchanged. A failed write is logged and does not fail the call.
//! - On an invalid grant the token, auth code and autosync flag are cleared.
//!
//! ## Usage
//!
//! ```no_run
//! use core_auth::AuthManager;
//! use bridge_traits::UserId;
//!
//! # async fn example(config: core_runtime::config::CoreConfig) {
//! let manager = AuthManager::from_config(&config);
//!
//! let result = manager.authenticate(UserId::new(1)).await;
//! if !result.success {
//!     eprintln!("{}", result.message);
//! }
//! # }
//! ```

use crate::error::Result;
use crate::oauth::OAuthClient;
use crate::token_store::TokenStore;
use crate::types::{next_step, AuthResult, AuthStep, OAuthToken, TokenState};
use bridge_traits::{Clock, Localizer, MessageKey, UserId};
use core_runtime::config::CoreConfig;
use core_runtime::LOG_TARGET;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Which step produced the token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Exchanged,
    Refreshed,
    Reused,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Exchanged => "exchange",
            Outcome::Refreshed => "refresh",
            Outcome::Reused => "reuse",
        }
    }
}

/// Token lifecycle manager for one OAuth client.
pub struct AuthManager {
    token_store: TokenStore,
    oauth: OAuthClient,
    clock: Arc<dyn Clock>,
    localizer: Arc<dyn Localizer>,
}

impl AuthManager {
    pub fn new(
        token_store: TokenStore,
        oauth: OAuthClient,
        clock: Arc<dyn Clock>,
        localizer: Arc<dyn Localizer>,
    ) -> Self {
        Self {
            token_store,
            oauth,
            clock,
            localizer,
        }
    }

    /// Wire a manager from the shared configuration
    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(
            TokenStore::new(config.settings_store.clone()),
            OAuthClient::new(
                config.oauth.clone(),
                config.http_client.clone(),
                config.clock.clone(),
            ),
            config.clock.clone(),
            config.localizer.clone(),
        )
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.token_store
    }

    /// Consent URL the user has to visit to obtain an auth code
    pub fn authorization_url(&self) -> Result<String> {
        self.oauth.authorization_url()
    }

    /// Produce a usable access token for `user`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NoAuthCode`](crate::AuthError::NoAuthCode) when nothing is stored yet
    /// - [`AuthError::NoRefreshToken`](crate::AuthError::NoRefreshToken) when the stored token
    ///   expired without a refresh token; stored state is left as is
    /// - [`AuthError::InvalidGrant`](crate::AuthError::InvalidGrant) after the stored auth
    ///   state has been cleared
    /// - any token endpoint, network or storage failure
    #[instrument(skip(self), fields(user = %user))]
    pub async fn authorize(&self, user: UserId) -> Result<OAuthToken> {
        match self.advance(user).await {
            Ok((outcome, token)) => {
                info!(
                    target: LOG_TARGET,
                    user = %user,
                    step = outcome.as_str(),
                    "Authentication succeeded"
                );
                self.persist(user, outcome, &token).await;
                Ok(token)
            }
            Err(err) => {
                error!(target: LOG_TARGET, user = %user, error = %err, "Authentication failed");

                if err.is_invalid_grant() {
                    match self.token_store.clear(user).await {
                        Ok(()) => info!(target: LOG_TARGET, user = %user, "Cleared auth state after invalid grant"),
                        Err(clear_err) => warn!(
                            target: LOG_TARGET,
                            user = %user,
                            error = %clear_err,
                            "Failed to clear auth state after invalid grant"
                        ),
                    }
                }

                Err(err)
            }
        }
    }

    /// [`authorize`](Self::authorize) folded into a user-facing result.
    pub async fn authenticate(&self, user: UserId) -> AuthResult {
        match self.authorize(user).await {
            Ok(_) => AuthResult::success(self.localizer.message(MessageKey::Done)),
            Err(err) => AuthResult::failure(self.localizer.message(err.message_key())),
        }
    }

    async fn advance(&self, user: UserId) -> Result<(Outcome, OAuthToken)> {
        let stored = self.token_store.load_token(user).await?;
        let state = TokenState::classify(stored, self.clock.unix_timestamp());

        let auth_code = match state {
            TokenState::NoToken => self.token_store.load_auth_code(user).await?,
            _ => None,
        };

        match next_step(state, auth_code)? {
            AuthStep::ExchangeCode(code) => {
                debug!(user = %user, "No stored token, exchanging auth code");
                Ok((Outcome::Exchanged, self.oauth.exchange_code(&code).await?))
            }
            AuthStep::Refresh(refresh_token) => {
                debug!(user = %user, "Stored token expired, refreshing");
                Ok((Outcome::Refreshed, self.oauth.refresh(&refresh_token).await?))
            }
            AuthStep::Reuse(token) => Ok((Outcome::Reused, token)),
        }
    }

    async fn persist(&self, user: UserId, outcome: Outcome, token: &OAuthToken) {
        let saved = if outcome == Outcome::Exchanged {
            self.token_store.save_exchanged_token(user, token).await
        } else {
            self.token_store.save_token(user, token).await
        };

        if let Err(err) = saved {
            warn!(target: LOG_TARGET, user = %user, error = %err, "Failed to persist token");
        }
    }
}
